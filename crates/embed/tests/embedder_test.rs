use embed::{Embedder, HashEmbedder, LocalEmbedder};

#[tokio::test]
async fn test_hash_embedder_deterministic() {
    let embedder = HashEmbedder::new(64);
    let a = embedder.embed("Java developer with Excel").await.unwrap();
    let b = embedder.embed("Java developer with Excel").await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);
    assert_eq!(embedder.dimension(), 64);
}

#[tokio::test]
async fn test_hash_embedder_is_normalized() {
    let embedder = HashEmbedder::new(32);
    let v = embedder.embed("sales manager assessment").await.unwrap();
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn test_hash_embedder_overlap_beats_disjoint() {
    let embedder = HashEmbedder::new(128);
    let query = embedder.embed("core java programming").await.unwrap();
    let java = embedder.embed("Core Java entry level programming").await.unwrap();
    let sales = embedder.embed("sales negotiation skills").await.unwrap();

    let dist = |a: &[f32], b: &[f32]| -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    };
    assert!(dist(&query, &java) < dist(&query, &sales));
}

#[tokio::test]
async fn test_hash_embedder_batch_matches_single() {
    let embedder = HashEmbedder::new(64);
    let batch = embedder.embed_batch(&["alpha", "beta"]).await.unwrap();
    let single = embedder.embed("alpha").await.unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0], single);
}

#[tokio::test]
async fn test_local_embedder() {
    // This test downloads the model on first run (~23MB)
    let embedder = LocalEmbedder::new();
    if embedder.is_err() {
        eprintln!("Skipping LocalEmbedder test (model download may have failed)");
        return;
    }
    let embedder = embedder.unwrap();
    let vec = embedder.embed("Core Java assessment, 40 minutes").await.unwrap();
    assert_eq!(vec.len(), 384);
    assert_eq!(embedder.dimension(), 384);
    assert!(vec.iter().any(|&x| x != 0.0), "Embedding should not be all zeros");
}
