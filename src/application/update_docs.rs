use crate::domain::entities::document::Document;
use crate::domain::entities::stored_record::StoredRecord;
use crate::domain::error::DomainError;
use crate::domain::ports::document_backend::DocumentBackend;
use crate::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Counts reported by a replace-style update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    pub matched: usize,
    pub modified: usize,
    pub upserted: usize,
}

/// Embeds every document's content in one provider call and pairs each
/// vector with a copy of its document.
pub(crate) async fn build_records(
    embedder: &dyn EmbeddingProvider,
    docs: &[Document],
) -> Result<Vec<StoredRecord>, DomainError> {
    let texts = docs
        .iter()
        .map(|doc| {
            doc.content
                .clone()
                .ok_or_else(|| DomainError::InvalidInput(format!("document {} has no content", doc.id)))
        })
        .collect::<Result<Vec<String>, _>>()?;

    let vectors = embedder.embed_many(&texts, InputType::Document).await?;
    if vectors.len() != docs.len() {
        return Err(DomainError::Embedding(format!(
            "expected {} embeddings, provider returned {}",
            docs.len(),
            vectors.len()
        )));
    }
    let dimension = embedder.dimension();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(DomainError::Embedding(format!(
            "expected vectors of dimension {dimension}, got {}",
            bad.len()
        )));
    }

    Ok(docs
        .iter()
        .zip(vectors)
        .map(|(doc, embedding)| StoredRecord::from_document(doc, embedding))
        .collect())
}

#[derive(Clone)]
pub struct UpdateDocsUseCase {
    backend: Arc<dyn DocumentBackend>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl UpdateDocsUseCase {
    pub fn new(backend: Arc<dyn DocumentBackend>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { backend, embedder }
    }

    /// Replaces each stored record with the same id and recomputes its
    /// embedding. Without `upsert`, documents whose id is not stored are
    /// skipped rather than created.
    pub async fn execute(
        &self,
        collection: &str,
        docs: &[Document],
        upsert: bool,
    ) -> Result<UpdateSummary, DomainError> {
        if docs.is_empty() {
            info!(collection, "no documents to update");
            return Ok(UpdateSummary::default());
        }
        info!(collection, count = docs.len(), upsert, "embedding and updating documents");

        let records = build_records(self.embedder.as_ref(), docs).await?;
        let mut summary = UpdateSummary::default();
        for record in &records {
            let outcome = self.backend.replace_one(collection, record, upsert)?;
            summary.matched += outcome.matched as usize;
            summary.modified += outcome.modified as usize;
            summary.upserted += outcome.upserted as usize;
        }

        info!(
            collection,
            matched = summary.matched,
            modified = summary.modified,
            upserted = summary.upserted,
            "update finished"
        );
        Ok(summary)
    }
}
