//! Port to the document store that persists records and answers vector
//! searches. Search indexes may become queryable some time after they are
//! created, so callers that need them must poll [`DocumentBackend::list_search_indexes`].

use crate::domain::entities::collection::Collection;
use crate::domain::entities::document::Document;
use crate::domain::entities::stored_record::StoredRecord;
use crate::domain::error::DomainError;
use crate::domain::values::document_field::Projection;
use crate::domain::values::document_id::DocumentId;
use crate::domain::values::similarity::Similarity;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchIndexSpec {
    pub name: String,
    pub dimension: usize,
    pub similarity: Similarity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchIndexStatus {
    pub name: String,
    pub dimension: usize,
    pub similarity: Similarity,
    pub queryable: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum RecordFilter<'a> {
    All,
    Ids(&'a [DocumentId]),
}

/// Result of a single replace-by-id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub matched: bool,
    pub modified: bool,
    pub upserted: bool,
}

#[derive(Debug, Clone)]
pub struct VectorQuery<'a> {
    pub index: &'a str,
    pub vector: &'a [f32],
    pub limit: usize,
    /// Candidate pool for approximate search. Exact backends may ignore it.
    pub num_candidates: usize,
    /// Hits scoring below this are dropped.
    pub min_score: Option<f64>,
    pub projection: &'a Projection,
}

/// Writes to a collection that does not exist create it implicitly, without
/// a search index.
pub trait DocumentBackend: Send + Sync {
    /// Fails with [`DomainError::WriteConflict`] if the collection already exists.
    fn create_collection(&self, name: &str) -> Result<Collection, DomainError>;
    fn get_collection(&self, name: &str) -> Result<Option<Collection>, DomainError>;
    /// Returns whether anything was dropped.
    fn drop_collection(&self, name: &str) -> Result<bool, DomainError>;
    fn list_collections(&self) -> Result<Vec<String>, DomainError>;

    fn create_search_index(&self, collection: &str, spec: &SearchIndexSpec) -> Result<(), DomainError>;
    fn drop_search_index(&self, collection: &str, name: &str) -> Result<(), DomainError>;
    fn list_search_indexes(&self, collection: &str) -> Result<Vec<SearchIndexStatus>, DomainError>;

    /// Inserts all records or none. A duplicate id is a [`DomainError::WriteConflict`].
    fn insert_many(&self, collection: &str, records: &[StoredRecord]) -> Result<Vec<DocumentId>, DomainError>;
    /// Replaces the record with the same id. Without `upsert` a missing id is left absent.
    fn replace_one(&self, collection: &str, record: &StoredRecord, upsert: bool) -> Result<ReplaceOutcome, DomainError>;
    fn delete_many(&self, collection: &str, ids: &[DocumentId]) -> Result<usize, DomainError>;

    fn find(&self, collection: &str, filter: RecordFilter<'_>, projection: &Projection) -> Result<Vec<Document>, DomainError>;
    /// Raw records including embeddings.
    fn find_records(&self, collection: &str, filter: RecordFilter<'_>) -> Result<Vec<StoredRecord>, DomainError>;
    fn count(&self, collection: &str) -> Result<usize, DomainError>;

    /// Top `limit` hits by descending score.
    fn vector_search(&self, collection: &str, query: &VectorQuery<'_>) -> Result<Vec<(Document, f64)>, DomainError>;
}
