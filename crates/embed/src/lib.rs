//! Query embedding for talentsift.
//
// Catalog vectors are produced at ingestion time; at query time the engine
// embeds the (expanded) query text with the same model so distances are
// comparable. The trait is the seam that lets tests substitute a
// deterministic embedder.

use anyhow::Result;
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

/// Trait for generating embeddings from text.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    /// Embed multiple texts in a batch for efficiency.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;
    /// Return the embedding dimension.
    fn dimension(&self) -> usize;
}

/// Local embedder using fastembed (runs entirely offline).
///
/// The model must match the one the ingestion job used to build the catalog
/// vectors; a different model surfaces as a dimension mismatch when the
/// engine starts.
pub struct LocalEmbedder {
    model: std::sync::Mutex<TextEmbedding>,
    dim: usize,
}

impl LocalEmbedder {
    /// Create a new LocalEmbedder with the default model (all-MiniLM-L6-v2, 384 dimensions).
    pub fn new() -> Result<Self> {
        Self::with_model(EmbeddingModel::AllMiniLML6V2, 384)
    }

    /// Create a LocalEmbedder with a specific model.
    pub fn with_model(model_name: EmbeddingModel, dim: usize) -> Result<Self> {
        let options = InitOptions::new(model_name).with_show_download_progress(true);
        let model = TextEmbedding::try_new(options)?;
        Ok(Self {
            model: std::sync::Mutex::new(model),
            dim,
        })
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.model.lock().unwrap().embed(vec![text], None)?;
        Ok(embeddings.into_iter().next().unwrap_or_default())
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let embeddings = self.model.lock().unwrap().embed(texts.to_vec(), None)?;
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

/// Deterministic token-hashing embedder.
///
/// Each lowercase word token is FNV-1a hashed into one of `dim` buckets and
/// the resulting bag-of-buckets vector is L2-normalized. No model download;
/// identical text always embeds to the identical vector. Used by tests and
/// offline runs.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        for token in text
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|t| !t.is_empty())
        {
            let bucket = (fnv1a(&token.to_lowercase()) % self.dim as u64) as usize;
            vector[bucket] += 1.0;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

fn fnv1a(token: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in token.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_sync(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
