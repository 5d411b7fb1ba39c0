use crate::config::StoreConfig;
use crate::domain::entities::document::Document;
use crate::domain::error::DomainError;
use crate::domain::ports::document_backend::{DocumentBackend, VectorQuery};
use crate::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use crate::domain::values::document_field::Projection;
use std::sync::Arc;
use tracing::debug;

/// One ranked hit list per query, best first.
pub type QueryResults = Vec<Vec<(Document, f64)>>;

pub const DEFAULT_N_RESULTS: usize = 10;

pub struct RetrieveUseCase {
    backend: Arc<dyn DocumentBackend>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: StoreConfig,
}

impl RetrieveUseCase {
    pub fn new(
        backend: Arc<dyn DocumentBackend>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: StoreConfig,
    ) -> Self {
        Self { backend, embedder, config }
    }

    /// Nearest stored documents for each query.
    ///
    /// Scores are in `[0, 1]`, higher is closer. With `distance_threshold`
    /// set, hits scoring below `1 - distance_threshold` are dropped. An empty
    /// query list, or a collection holding no documents, yields an empty outer
    /// list. Freshly written documents may be missing until the backend's
    /// index catches up.
    pub async fn execute(
        &self,
        collection: &str,
        queries: &[String],
        n_results: usize,
        distance_threshold: Option<f64>,
    ) -> Result<QueryResults, DomainError> {
        if queries.is_empty() {
            return Ok(vec![]);
        }
        if n_results == 0 {
            return Err(DomainError::InvalidInput("n_results must be greater than zero".into()));
        }
        if let Some(d) = distance_threshold {
            if !(0.0..=1.0).contains(&d) {
                return Err(DomainError::InvalidInput(format!(
                    "distance_threshold must be between 0.0 and 1.0, got {d}"
                )));
            }
        }
        if self.backend.count(collection)? == 0 {
            debug!(collection, "collection is empty, nothing to retrieve");
            return Ok(vec![]);
        }

        let vectors = self.embedder.embed_many(queries, InputType::Query).await?;
        if vectors.len() != queries.len() {
            return Err(DomainError::Embedding(format!(
                "expected {} query embeddings, provider returned {}",
                queries.len(),
                vectors.len()
            )));
        }

        let projection = Projection::all();
        let mut results = Vec::with_capacity(queries.len());
        for vector in &vectors {
            let hits = self.backend.vector_search(
                collection,
                &VectorQuery {
                    index: &self.config.index_name,
                    vector,
                    limit: n_results,
                    num_candidates: n_results.saturating_mul(self.config.oversampling_factor),
                    min_score: distance_threshold.map(|d| 1.0 - d),
                    projection: &projection,
                },
            )?;
            results.push(hits);
        }
        debug!(collection, queries = queries.len(), n_results, "retrieved documents");
        Ok(results)
    }
}
