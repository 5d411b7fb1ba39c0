use crate::domain::error::DomainError;
use crate::domain::ports::document_backend::DocumentBackend;
use crate::domain::values::document_id::DocumentId;
use std::sync::Arc;
use tracing::info;

pub struct DeleteDocsUseCase {
    backend: Arc<dyn DocumentBackend>,
}

impl DeleteDocsUseCase {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend }
    }

    /// Removes records by exact, typed id. Ids that are not stored are ignored.
    pub fn execute(&self, collection: &str, ids: &[DocumentId]) -> Result<usize, DomainError> {
        let deleted = self.backend.delete_many(collection, ids)?;
        info!(collection, requested = ids.len(), deleted, "deleted documents");
        Ok(deleted)
    }
}
