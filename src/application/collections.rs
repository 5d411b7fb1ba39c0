use crate::application::wait::{wait_for, PollSchedule};
use crate::config::StoreConfig;
use crate::domain::entities::collection::Collection;
use crate::domain::error::DomainError;
use crate::domain::ports::document_backend::{DocumentBackend, SearchIndexSpec};
use std::sync::Arc;
use tracing::info;

pub struct CollectionsUseCase {
    backend: Arc<dyn DocumentBackend>,
    config: StoreConfig,
    dimension: usize,
}

impl CollectionsUseCase {
    pub fn new(backend: Arc<dyn DocumentBackend>, config: StoreConfig, dimension: usize) -> Self {
        Self { backend, config, dimension }
    }

    /// Returns the existing collection untouched unless `overwrite` is set, in
    /// which case it is dropped and provisioned again.
    pub async fn create(&self, name: &str, overwrite: bool) -> Result<Collection, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidInput("collection name must not be empty".into()));
        }
        if overwrite {
            self.delete(name).await?;
        }
        if let Some(existing) = self.backend.get_collection(name)? {
            self.ensure_index(name).await?;
            return Ok(existing);
        }

        let collection = self.backend.create_collection(name)?;
        self.ensure_index(name).await?;
        info!(collection = name, overwrite, "collection ready");
        Ok(collection)
    }

    pub fn get(&self, name: &str) -> Result<Collection, DomainError> {
        self.backend
            .get_collection(name)?
            .ok_or_else(|| DomainError::NotFound(format!("collection '{name}' does not exist")))
    }

    /// Drops the collection's search indexes, then the collection. Absent
    /// collections are not an error.
    pub async fn delete(&self, name: &str) -> Result<(), DomainError> {
        let backend = &self.backend;
        for index in backend.list_search_indexes(name)? {
            backend.drop_search_index(name, &index.name)?;
            if let Some(timeout) = self.config.wait_until_index_ready {
                let schedule = PollSchedule::new(timeout, self.config.poll_interval);
                let dropped = index.name.as_str();
                wait_for(schedule, &format!("index '{dropped}' was not dropped"), || async move {
                    Ok(!backend.list_search_indexes(name)?.iter().any(|i| i.name == dropped))
                })
                .await?;
            }
        }
        if self.backend.drop_collection(name)? {
            info!(collection = name, "collection dropped");
        }
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<String>, DomainError> {
        self.backend.list_collections()
    }

    async fn ensure_index(&self, collection: &str) -> Result<(), DomainError> {
        let backend = &self.backend;
        let index_name = self.config.index_name.as_str();
        let exists = backend
            .list_search_indexes(collection)?
            .iter()
            .any(|i| i.name == index_name);
        if !exists {
            backend.create_search_index(
                collection,
                &SearchIndexSpec {
                    name: index_name.to_string(),
                    dimension: self.dimension,
                    similarity: self.config.similarity,
                },
            )?;
        }

        if let Some(timeout) = self.config.wait_until_index_ready {
            let schedule = PollSchedule::new(timeout, self.config.poll_interval);
            wait_for(schedule, &format!("index '{index_name}' never became queryable"), || async move {
                Ok(backend
                    .list_search_indexes(collection)?
                    .iter()
                    .any(|i| i.name == index_name && i.queryable))
            })
            .await?;
        }
        Ok(())
    }
}
