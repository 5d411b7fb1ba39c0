pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::collections::CollectionsUseCase;
use crate::application::delete_docs::DeleteDocsUseCase;
use crate::application::get_docs::GetDocsUseCase;
use crate::application::insert_docs::InsertDocsUseCase;
use crate::application::retrieve::{QueryResults, RetrieveUseCase};
use crate::application::update_docs::{UpdateDocsUseCase, UpdateSummary};
use crate::config::StoreConfig;
use crate::domain::entities::collection::Collection;
use crate::domain::entities::document::Document;
use crate::domain::error::DomainError;
use crate::domain::ports::document_backend::DocumentBackend;
use crate::domain::ports::embedding_port::EmbeddingProvider;
use crate::domain::values::document_field::DocumentField;
use crate::domain::values::document_id::DocumentId;
use crate::infrastructure::embeddings::hashing::HashingProvider;
use crate::infrastructure::embeddings::openai::OpenAiProvider;
use crate::infrastructure::embeddings::voyage::VoyageProvider;
use crate::infrastructure::sqlite::backend::SqliteBackend;
use std::sync::{Arc, Mutex, MutexGuard};

pub use crate::application::retrieve::DEFAULT_N_RESULTS;

/// Embedding-backed document collections with similarity search.
///
/// Operations that take `collection_name: Option<&str>` fall back to the
/// active collection, which `create_collection` and a named
/// `get_collection` set. The active collection belongs to this instance and
/// is guarded by a mutex; concurrent callers changing it still race on which
/// name wins.
pub struct DocVec {
    backend: Arc<dyn DocumentBackend>,
    embedder: Arc<dyn EmbeddingProvider>,
    active: Mutex<Option<String>>,
    collections_uc: CollectionsUseCase,
    insert_uc: InsertDocsUseCase,
    update_uc: UpdateDocsUseCase,
    delete_uc: DeleteDocsUseCase,
    get_uc: GetDocsUseCase,
    retrieve_uc: RetrieveUseCase,
}

impl DocVec {
    /// Opens `db_path` with the embedding provider and store settings taken
    /// from `DOCVEC_*` environment variables.
    pub fn new(db_path: &str) -> Result<Self, DomainError> {
        let provider = std::env::var("DOCVEC_EMBEDDING_PROVIDER").unwrap_or_else(|_| "hashing".into());
        let api_key = std::env::var("DOCVEC_EMBEDDING_API_KEY").unwrap_or_default();
        let model = std::env::var("DOCVEC_EMBEDDING_MODEL").ok();
        let base_url = std::env::var("DOCVEC_EMBEDDING_BASE_URL").ok();

        let embedder: Arc<dyn EmbeddingProvider> = match provider.as_str() {
            "voyage" => Arc::new(VoyageProvider::new(api_key, model, base_url)),
            "openai" => Arc::new(OpenAiProvider::new(api_key, model, base_url)),
            "hashing" => Arc::new(HashingProvider::default()),
            other => {
                return Err(DomainError::InvalidInput(format!(
                    "Unknown embedding provider: {other}"
                )))
            }
        };

        Self::with_config(db_path, embedder, StoreConfig::from_env()?)
    }

    pub fn with_providers(db_path: &str, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self, DomainError> {
        Self::with_config(db_path, embedder, StoreConfig::default())
    }

    pub fn with_config(
        db_path: &str,
        embedder: Arc<dyn EmbeddingProvider>,
        config: StoreConfig,
    ) -> Result<Self, DomainError> {
        let backend: Arc<dyn DocumentBackend> = Arc::new(SqliteBackend::open(db_path)?);
        Ok(Self::with_backend(backend, embedder, config))
    }

    pub fn with_backend(
        backend: Arc<dyn DocumentBackend>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: StoreConfig,
    ) -> Self {
        Self {
            collections_uc: CollectionsUseCase::new(backend.clone(), config.clone(), embedder.dimension()),
            insert_uc: InsertDocsUseCase::new(backend.clone(), embedder.clone(), config.clone()),
            update_uc: UpdateDocsUseCase::new(backend.clone(), embedder.clone()),
            delete_uc: DeleteDocsUseCase::new(backend.clone()),
            get_uc: GetDocsUseCase::new(backend.clone()),
            retrieve_uc: RetrieveUseCase::new(backend.clone(), embedder.clone(), config),
            backend,
            embedder,
            active: Mutex::new(None),
        }
    }

    /// Creates (or with `overwrite`, recreates) `name` and makes it active.
    pub async fn with_initial_collection(self, name: &str, overwrite: bool) -> Result<Self, DomainError> {
        self.create_collection(name, overwrite).await?;
        Ok(self)
    }

    /// Raw access to the backend, for inspecting stored records.
    pub fn backend(&self) -> &Arc<dyn DocumentBackend> {
        &self.backend
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub fn active_collection(&self) -> Result<Option<String>, DomainError> {
        Ok(self.active()?.clone())
    }

    fn active(&self) -> Result<MutexGuard<'_, Option<String>>, DomainError> {
        self.active.lock().map_err(|e| DomainError::Database(e.to_string()))
    }

    fn set_active(&self, name: Option<String>) -> Result<(), DomainError> {
        *self.active()? = name;
        Ok(())
    }

    /// An explicit name wins; otherwise the active collection; otherwise an error.
    fn resolve(&self, collection_name: Option<&str>) -> Result<String, DomainError> {
        match collection_name {
            Some(name) => Ok(name.to_string()),
            None => self
                .active()?
                .clone()
                .ok_or_else(|| DomainError::InvalidInput("No collection is specified".into())),
        }
    }

    // Collections

    pub async fn create_collection(&self, name: &str, overwrite: bool) -> Result<Collection, DomainError> {
        let collection = self.collections_uc.create(name, overwrite).await?;
        self.set_active(Some(collection.name.clone()))?;
        Ok(collection)
    }

    /// Without a name, returns the active collection. With a name, returns
    /// that collection and makes it active.
    pub fn get_collection(&self, name: Option<&str>) -> Result<Collection, DomainError> {
        match name {
            Some(name) => {
                let collection = self.collections_uc.get(name)?;
                self.set_active(Some(collection.name.clone()))?;
                Ok(collection)
            }
            None => {
                let active = self.resolve(None)?;
                self.collections_uc.get(&active)
            }
        }
    }

    pub async fn delete_collection(&self, name: &str) -> Result<(), DomainError> {
        self.collections_uc.delete(name).await?;
        let mut active = self.active()?;
        if active.as_deref() == Some(name) {
            *active = None;
        }
        Ok(())
    }

    pub fn list_collections(&self) -> Result<Vec<String>, DomainError> {
        self.collections_uc.list()
    }

    // Documents

    pub async fn insert_docs(
        &self,
        docs: &[Document],
        collection_name: Option<&str>,
        upsert: bool,
    ) -> Result<(), DomainError> {
        let collection = self.resolve(collection_name)?;
        self.insert_uc.execute(&collection, docs, upsert).await
    }

    pub async fn update_docs(
        &self,
        docs: &[Document],
        collection_name: Option<&str>,
        upsert: bool,
    ) -> Result<UpdateSummary, DomainError> {
        let collection = self.resolve(collection_name)?;
        self.update_uc.execute(&collection, docs, upsert).await
    }

    pub fn delete_docs(&self, ids: &[DocumentId], collection_name: Option<&str>) -> Result<usize, DomainError> {
        let collection = self.resolve(collection_name)?;
        self.delete_uc.execute(&collection, ids)
    }

    pub fn get_docs_by_ids(
        &self,
        ids: Option<&[DocumentId]>,
        include: Option<&[DocumentField]>,
        collection_name: Option<&str>,
    ) -> Result<Vec<Document>, DomainError> {
        let collection = self.resolve(collection_name)?;
        self.get_uc.execute(&collection, ids, include)
    }

    pub async fn retrieve_docs(
        &self,
        queries: &[String],
        collection_name: Option<&str>,
        n_results: usize,
        distance_threshold: Option<f64>,
    ) -> Result<QueryResults, DomainError> {
        let collection = self.resolve(collection_name)?;
        self.retrieve_uc
            .execute(&collection, queries, n_results, distance_threshold)
            .await
    }
}
