//! Catalog storage for talentsift.
//!
//! Holds the assessment catalog as an ordered metadata array plus one dense
//! vector per record, index-aligned. Both are produced by the ingestion job
//! and loaded read-only at process start; the core never mutates them.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod lexical;
mod vectors;

pub use lexical::{tokenize, Bm25Index};
pub use vectors::VectorSet;

/// One assessment descriptor. The record id is its position in the store.
///
/// Fields the scraper could not populate default to empty/zero rather than
/// being absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemRecord {
    pub name: String,
    pub url: String,
    pub description: String,
    /// Duration in minutes.
    pub duration: u32,
    /// Category tags, e.g. "Knowledge & Skills".
    pub test_type: Vec<String>,
    pub job_levels: Vec<String>,
    pub languages: Vec<String>,
    /// "Yes" / "No" as scraped.
    pub remote_support: String,
    pub adaptive_support: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog files missing ({0}); run the ingestion job to rebuild them")]
    IndexUnavailable(String),
    #[error("catalog is misaligned: {metadata} metadata records vs {vectors} vectors")]
    Misaligned { metadata: usize, vectors: usize },
    #[error("query embedding has dimension {actual}, catalog stores {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("invalid vector file: {0}")]
    InvalidVectorFile(String),
    #[error("invalid metadata file: {0}")]
    InvalidMetadata(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Text a record is indexed and embedded under: name, description and
/// category tags, space-joined. Must stay in sync with the ingestion job.
pub fn index_text(record: &ItemRecord) -> String {
    format!(
        "{} {} {}",
        record.name,
        record.description,
        record.test_type.join(" ")
    )
}

/// The aligned (metadata, vectors) pair.
///
/// Invariant: `records()[i]` and the vector at row `i` describe the same
/// item; cardinalities match exactly. Construction fails otherwise.
#[derive(Debug)]
pub struct CatalogStore {
    records: Vec<ItemRecord>,
    vectors: VectorSet,
}

impl CatalogStore {
    /// Load the catalog from its two files. Missing files are fatal; the
    /// ingestion job is responsible for creating them.
    pub fn load(metadata_path: &Path, vectors_path: &Path) -> Result<Self, CatalogError> {
        let mut missing = Vec::new();
        if !metadata_path.exists() {
            missing.push(metadata_path.display().to_string());
        }
        if !vectors_path.exists() {
            missing.push(vectors_path.display().to_string());
        }
        if !missing.is_empty() {
            return Err(CatalogError::IndexUnavailable(missing.join(", ")));
        }

        let metadata = std::fs::read_to_string(metadata_path)?;
        let records: Vec<ItemRecord> = serde_json::from_str(&metadata)?;
        let vectors = VectorSet::load(vectors_path)?;
        Self::from_parts(records, vectors)
    }

    /// Assemble a catalog from in-memory parts, enforcing alignment.
    pub fn from_parts(
        records: Vec<ItemRecord>,
        vectors: VectorSet,
    ) -> Result<Self, CatalogError> {
        if records.len() != vectors.len() {
            return Err(CatalogError::Misaligned {
                metadata: records.len(),
                vectors: vectors.len(),
            });
        }
        Ok(Self { records, vectors })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stored vector dimensionality. Query embeddings must match it.
    pub fn dimension(&self) -> usize {
        self.vectors.dimension()
    }

    pub fn record(&self, id: usize) -> Option<&ItemRecord> {
        self.records.get(id)
    }

    pub fn records(&self) -> &[ItemRecord] {
        &self.records
    }

    /// Build the lexical index over every record's [`index_text`].
    pub fn build_lexical_index(&self) -> Bm25Index {
        Bm25Index::build(self.records.iter().map(index_text))
    }

    /// Exact nearest-neighbor search: squared Euclidean distance of `query`
    /// to every stored vector, `k` closest ids in ascending distance order,
    /// ties broken by ascending id.
    pub fn vector_search(&self, query: &[f32], k: usize) -> Result<Vec<usize>, CatalogError> {
        if query.len() != self.vectors.dimension() {
            return Err(CatalogError::DimensionMismatch {
                expected: self.vectors.dimension(),
                actual: query.len(),
            });
        }
        let mut scored: Vec<(usize, f32)> = (0..self.vectors.len())
            .map(|i| (i, self.vectors.squared_l2(i, query)))
            .collect();
        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        Ok(scored.into_iter().map(|(i, _)| i).collect())
    }
}
