//! Shared test helpers.
#![allow(dead_code)]

use docvec::config::StoreConfig;
use docvec::domain::entities::collection::Collection;
use docvec::domain::entities::document::Document;
use docvec::domain::entities::stored_record::StoredRecord;
use docvec::domain::error::DomainError;
use docvec::domain::ports::document_backend::*;
use docvec::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use docvec::domain::values::document_field::Projection;
use docvec::domain::values::document_id::DocumentId;
use docvec::infrastructure::sqlite::backend::SqliteBackend;
use docvec::DocVec;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const COLLECTION: &str = "docvec_test_vectorstore";
pub const DIMENSION: usize = 384;

const PET_WORDS: &[&str] = &["dog", "dogs", "cat", "cats", "pet", "pets", "fluff", "puppy", "kitten"];
const FOOD_WORDS: &[&str] = &["sandwich", "sandwiches", "lunch", "bread", "food"];

/// Deterministic embedder with two concept axes, pets and food. Words on an
/// axis share that component; every other word lands in a small hashed bucket,
/// so related texts score close even without a shared word.
pub struct ConceptEmbedder;

impl ConceptEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
        {
            if PET_WORDS.contains(&word.as_str()) {
                v[0] += 1.0;
            } else if FOOD_WORDS.contains(&word.as_str()) {
                v[1] += 1.0;
            } else {
                let hash = word.bytes().fold(7_usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
                v[2 + hash % (DIMENSION - 2)] += 0.1;
            }
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for ConceptEmbedder {
    async fn embed_many(&self, texts: &[String], _input_type: InputType) -> Result<Vec<Vec<f32>>, DomainError> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}

pub fn setup() -> DocVec {
    DocVec::with_providers(":memory:", Arc::new(ConceptEmbedder)).unwrap()
}

pub async fn setup_with_collection() -> DocVec {
    setup().with_initial_collection(COLLECTION, true).await.unwrap()
}

/// Mix of integer and string ids.
pub fn example_documents() -> Vec<Document> {
    vec![
        Document::new(1, "Dogs are tough.").with_metadata(json!({"a": 1})),
        Document::new(2, "Cats have fluff.").with_metadata(json!({"b": 1})),
        Document::new("1", "What is a sandwich?").with_metadata(json!({"c": 1})),
        Document::new("2", "A sandwich makes a great lunch.").with_metadata(json!({"d": 1, "e": 2})),
    ]
}

pub fn ids(values: serde_json::Value) -> Vec<DocumentId> {
    serde_json::from_value(values).unwrap()
}

pub fn stored(db: &DocVec, collection: &str) -> Vec<StoredRecord> {
    db.backend().find_records(collection, RecordFilter::All).unwrap()
}

/// SQLite backend whose search index lags behind writes: the index reports
/// not queryable for the first `index_lag` status checks, and vector search
/// returns nothing for the first `search_lag` searches.
pub struct LaggingBackend {
    inner: SqliteBackend,
    index_lag: usize,
    search_lag: usize,
    status_checks: AtomicUsize,
    searches: AtomicUsize,
}

impl LaggingBackend {
    pub fn new(index_lag: usize, search_lag: usize) -> Self {
        Self {
            inner: SqliteBackend::open(":memory:").unwrap(),
            index_lag,
            search_lag,
            status_checks: AtomicUsize::new(0),
            searches: AtomicUsize::new(0),
        }
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn status_checks(&self) -> usize {
        self.status_checks.load(Ordering::SeqCst)
    }
}

impl DocumentBackend for LaggingBackend {
    fn create_collection(&self, name: &str) -> Result<Collection, DomainError> {
        self.inner.create_collection(name)
    }

    fn get_collection(&self, name: &str) -> Result<Option<Collection>, DomainError> {
        self.inner.get_collection(name)
    }

    fn drop_collection(&self, name: &str) -> Result<bool, DomainError> {
        self.inner.drop_collection(name)
    }

    fn list_collections(&self) -> Result<Vec<String>, DomainError> {
        self.inner.list_collections()
    }

    fn create_search_index(&self, collection: &str, spec: &SearchIndexSpec) -> Result<(), DomainError> {
        self.inner.create_search_index(collection, spec)
    }

    fn drop_search_index(&self, collection: &str, name: &str) -> Result<(), DomainError> {
        self.inner.drop_search_index(collection, name)
    }

    fn list_search_indexes(&self, collection: &str) -> Result<Vec<SearchIndexStatus>, DomainError> {
        let ready = self.status_checks.fetch_add(1, Ordering::SeqCst) >= self.index_lag;
        let mut indexes = self.inner.list_search_indexes(collection)?;
        for index in &mut indexes {
            index.queryable = ready;
        }
        Ok(indexes)
    }

    fn insert_many(&self, collection: &str, records: &[StoredRecord]) -> Result<Vec<DocumentId>, DomainError> {
        self.inner.insert_many(collection, records)
    }

    fn replace_one(&self, collection: &str, record: &StoredRecord, upsert: bool) -> Result<ReplaceOutcome, DomainError> {
        self.inner.replace_one(collection, record, upsert)
    }

    fn delete_many(&self, collection: &str, ids: &[DocumentId]) -> Result<usize, DomainError> {
        self.inner.delete_many(collection, ids)
    }

    fn find(&self, collection: &str, filter: RecordFilter<'_>, projection: &Projection) -> Result<Vec<Document>, DomainError> {
        self.inner.find(collection, filter, projection)
    }

    fn find_records(&self, collection: &str, filter: RecordFilter<'_>) -> Result<Vec<StoredRecord>, DomainError> {
        self.inner.find_records(collection, filter)
    }

    fn count(&self, collection: &str) -> Result<usize, DomainError> {
        self.inner.count(collection)
    }

    fn vector_search(&self, collection: &str, query: &VectorQuery<'_>) -> Result<Vec<(Document, f64)>, DomainError> {
        if self.searches.fetch_add(1, Ordering::SeqCst) < self.search_lag {
            return Ok(vec![]);
        }
        self.inner.vector_search(collection, query)
    }
}

pub fn lagging_store(backend: Arc<LaggingBackend>, config: StoreConfig) -> DocVec {
    DocVec::with_backend(backend, Arc::new(ConceptEmbedder), config)
}
