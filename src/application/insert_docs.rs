use crate::application::update_docs::{build_records, UpdateDocsUseCase};
use crate::application::wait::{wait_for, PollSchedule};
use crate::config::StoreConfig;
use crate::domain::entities::document::Document;
use crate::domain::error::DomainError;
use crate::domain::ports::document_backend::{DocumentBackend, VectorQuery};
use crate::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use crate::domain::values::document_field::Projection;
use crate::domain::values::document_id::DocumentId;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct InsertDocsUseCase {
    backend: Arc<dyn DocumentBackend>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: StoreConfig,
    update: UpdateDocsUseCase,
}

impl InsertDocsUseCase {
    pub fn new(
        backend: Arc<dyn DocumentBackend>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: StoreConfig,
    ) -> Self {
        let update = UpdateDocsUseCase::new(backend.clone(), embedder.clone());
        Self {
            backend,
            embedder,
            config,
            update,
        }
    }

    /// Inserts new records. A stored id is a [`DomainError::WriteConflict`]
    /// unless `upsert` is set, in which case the stored record is replaced.
    pub async fn execute(&self, collection: &str, docs: &[Document], upsert: bool) -> Result<(), DomainError> {
        if docs.is_empty() {
            info!(collection, "no documents to insert");
            return Ok(());
        }
        if upsert {
            self.update.execute(collection, docs, true).await?;
        } else {
            self.insert_batched(collection, docs).await?;
        }

        if let (Some(timeout), Some(last)) = (self.config.wait_until_document_ready, docs.last()) {
            self.wait_for_document(collection, last, PollSchedule::new(timeout, self.config.poll_interval))
                .await?;
        }
        Ok(())
    }

    async fn insert_batched(&self, collection: &str, docs: &[Document]) -> Result<(), DomainError> {
        let mut input_ids: HashSet<DocumentId> = HashSet::with_capacity(docs.len());
        let mut result_ids: HashSet<DocumentId> = HashSet::with_capacity(docs.len());

        let mut start = 0;
        let mut size = 0;
        for (i, doc) in docs.iter().enumerate() {
            size += doc.byte_size();
            let full = i + 1 - start >= self.config.insert_batch_size || size >= self.config.max_batch_bytes;
            if full || i + 1 == docs.len() {
                let batch = &docs[start..=i];
                result_ids.extend(self.insert_batch(collection, batch).await?);
                input_ids.extend(batch.iter().map(|d| d.id.clone()));
                start = i + 1;
                size = 0;
            }
        }

        if result_ids != input_ids {
            let missing: Vec<String> = input_ids.difference(&result_ids).map(|id| id.to_string()).collect();
            warn!(collection, missing = ?missing, "possible data corruption: ids not reported as inserted");
        }
        info!(collection, count = docs.len(), "inserted documents");
        Ok(())
    }

    async fn insert_batch(&self, collection: &str, batch: &[Document]) -> Result<Vec<DocumentId>, DomainError> {
        debug!(collection, count = batch.len(), "inserting batch");
        let records = build_records(self.embedder.as_ref(), batch).await?;
        self.backend.insert_many(collection, &records)
    }

    /// Polls vector search with the document's own content until it comes back
    /// among the best-scoring hits. Stored documents with identical content tie
    /// with it, so any hit sharing the top score counts, and a page made up
    /// entirely of ties is taken as ready.
    async fn wait_for_document(&self, collection: &str, doc: &Document, schedule: PollSchedule) -> Result<(), DomainError> {
        let content = doc.content.as_deref().unwrap_or_default();
        let vector = self.embedder.embed(content, InputType::Query).await?;
        let projection = Projection::from_include(Some([].as_slice()));
        let query = VectorQuery {
            index: &self.config.index_name,
            vector: &vector,
            limit: self.config.oversampling_factor,
            num_candidates: self.config.oversampling_factor.saturating_mul(self.config.oversampling_factor),
            min_score: None,
            projection: &projection,
        };
        let backend = &self.backend;
        let query = &query;
        wait_for(schedule, &format!("document {} never became searchable", doc.id), || async move {
            let hits = backend.vector_search(collection, query)?;
            let Some((_, top)) = hits.first() else {
                return Ok(false);
            };
            let tied = hits.iter().take_while(|(_, score)| score == top).count();
            Ok(tied == query.limit || hits[..tied].iter().any(|(hit, _)| hit.id == doc.id))
        })
        .await
    }
}
