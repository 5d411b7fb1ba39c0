use crate::domain::entities::document::Document;
use crate::domain::error::DomainError;
use crate::domain::ports::document_backend::{DocumentBackend, RecordFilter};
use crate::domain::values::document_field::{DocumentField, Projection};
use crate::domain::values::document_id::DocumentId;
use std::sync::Arc;

pub struct GetDocsUseCase {
    backend: Arc<dyn DocumentBackend>,
}

impl GetDocsUseCase {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend }
    }

    /// Omitted or empty `ids` read nothing. Result order is the backend's,
    /// not the order of `ids`.
    pub fn execute(
        &self,
        collection: &str,
        ids: Option<&[DocumentId]>,
        include: Option<&[DocumentField]>,
    ) -> Result<Vec<Document>, DomainError> {
        let ids = match ids {
            None | Some([]) => return Ok(vec![]),
            Some(ids) => ids,
        };
        self.backend
            .find(collection, RecordFilter::Ids(ids), &Projection::from_include(include))
    }
}
