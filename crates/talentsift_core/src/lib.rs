//! Recommendation pipeline orchestration for talentsift.
//
// Sequences query expansion, the two retrievers, rank fusion and the
// full-data rerank. The engine is an immutable context object: catalog,
// lexical index, embedder and service handles are built once and only ever
// read afterwards, so concurrent recommend calls share it freely.

use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;

use embed::Embedder;
use llm::{
    CandidateDetail, CandidateReranker, CompletionService, Expansion, FallbackCause,
    GeminiClient, QueryExpander, Selection,
};

pub mod config;
pub mod eval;

pub use catalog::{Bm25Index, CatalogError, CatalogStore, ItemRecord, VectorSet};
pub use config::TalentsiftConfig;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The caller supplied no usable query text.
    #[error("request rejected: query text is empty")]
    InvalidRequest,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("embedding failure: {0}")]
    Embedding(#[from] anyhow::Error),
    #[error("completion client setup failed: {0}")]
    Completion(#[from] llm::CompletionError),
}

/// The assembled pipeline. Construct once, share by reference.
pub struct RecommendationEngine {
    catalog: CatalogStore,
    lexical: Bm25Index,
    embedder: Arc<dyn Embedder>,
    expander: QueryExpander,
    reranker: CandidateReranker,
    retrieval: config::RetrievalConfig,
    completion_configured: bool,
}

impl std::fmt::Debug for RecommendationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationEngine")
            .field("embedder_dimension", &self.embedder.dimension())
            .field("retrieval", &self.retrieval)
            .field("completion_configured", &self.completion_configured)
            .finish_non_exhaustive()
    }
}

impl RecommendationEngine {
    /// Load the catalog from disk and wire up the default embedder and the
    /// completion service (when `GOOGLE_API_KEY` is set).
    pub fn open(config: &TalentsiftConfig) -> Result<Self, EngineError> {
        let store = CatalogStore::load(
            &config.catalog.metadata_path(),
            &config.catalog.vectors_path(),
        )?;
        let embedder: Arc<dyn Embedder> = Arc::new(embed::LocalEmbedder::new()?);

        let service: Option<Arc<dyn CompletionService>> = match config::LlmConfig::api_key() {
            Some(api_key) => {
                let client = GeminiClient::new(
                    api_key,
                    config.llm.model.clone(),
                    config.llm.endpoint.clone(),
                    config.llm.temperature,
                    std::time::Duration::from_secs(config.llm.timeout_secs),
                )?;
                Some(Arc::new(client))
            }
            None => {
                warn!(
                    "{} not set; query expansion and reranking disabled",
                    config::LlmConfig::API_KEY_ENV
                );
                None
            }
        };

        Self::from_parts(store, embedder, service, config.retrieval.clone())
    }

    /// Assemble an engine from explicit parts. Tests inject a deterministic
    /// embedder and a scripted completion service here.
    pub fn from_parts(
        catalog: CatalogStore,
        embedder: Arc<dyn Embedder>,
        service: Option<Arc<dyn CompletionService>>,
        retrieval: config::RetrievalConfig,
    ) -> Result<Self, EngineError> {
        if !catalog.is_empty() && embedder.dimension() != catalog.dimension() {
            return Err(CatalogError::DimensionMismatch {
                expected: catalog.dimension(),
                actual: embedder.dimension(),
            }
            .into());
        }

        let lexical = catalog.build_lexical_index();
        info!(
            "engine ready: {} catalog items, dimension {}, completion {}",
            catalog.len(),
            catalog.dimension(),
            if service.is_some() { "configured" } else { "absent" }
        );

        Ok(Self {
            lexical,
            embedder,
            expander: QueryExpander::new(service.clone()),
            reranker: CandidateReranker::new(service.clone()),
            retrieval,
            completion_configured: service.is_some(),
            catalog,
        })
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn completion_configured(&self) -> bool {
        self.completion_configured
    }

    /// Full pipeline: expansion -> hybrid retrieval -> fusion -> rerank.
    ///
    /// Returns at most `top_n` catalog records. Expansion and rerank
    /// failures degrade to deterministic fallbacks; only an empty query, a
    /// dimension mismatch or an embedder failure surface as errors.
    pub async fn recommend(
        &self,
        query: &str,
        top_n: usize,
    ) -> Result<Vec<ItemRecord>, EngineError> {
        if query.trim().is_empty() {
            return Err(EngineError::InvalidRequest);
        }

        let expansion = self.expander.expand(query).await;
        match &expansion {
            Expansion::Expanded(text) => debug!("expanded query: {}", text),
            Expansion::Fallback(FallbackCause::Unconfigured) => {
                debug!("expansion skipped: service not configured")
            }
            Expansion::Fallback(cause) => warn!("query expansion fell back: {}", cause),
        }
        let expanded = expansion.text_or(query);

        let k = self.retrieval.k;
        let (lexical_hits, vector_hits) = tokio::join!(
            async { self.lexical.search(expanded, k) },
            async {
                let embedding = self.embedder.embed(expanded).await?;
                self.catalog
                    .vector_search(&embedding, k)
                    .map_err(EngineError::from)
            }
        );
        let vector_hits = vector_hits?;

        let candidate_ids: Vec<usize> = rank::fuse_detailed(
            &lexical_hits,
            &vector_hits,
            k,
            self.retrieval.rrf_c,
        )
        .into_iter()
        .map(|c| c.id)
        .collect();
        debug!("fused {} candidates", candidate_ids.len());

        let details: Vec<CandidateDetail> = candidate_ids
            .iter()
            .filter_map(|id| self.catalog.record(*id))
            .map(candidate_detail)
            .collect();

        let selection = self.reranker.select(query, &details, top_n).await;
        match &selection {
            Selection::Selected(ids) => debug!("reranker selected {:?}", ids),
            Selection::Fallback(FallbackCause::Unconfigured) => {
                debug!("rerank skipped: service not configured")
            }
            Selection::Fallback(cause) => warn!("rerank fell back to fused order: {}", cause),
        }

        let results = selection
            .positions_or_first(candidate_ids.len(), top_n)
            .into_iter()
            .filter_map(|position| candidate_ids.get(position))
            .filter_map(|id| self.catalog.record(*id).cloned())
            .collect();
        Ok(results)
    }
}

fn candidate_detail(record: &ItemRecord) -> CandidateDetail {
    CandidateDetail {
        name: record.name.clone(),
        test_type: record.test_type.clone(),
        duration: record.duration,
        remote_support: record.remote_support.clone(),
        description: record.description.clone(),
    }
}
