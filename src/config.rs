//! Store configuration.

use crate::domain::error::DomainError;
use crate::domain::values::similarity::Similarity;
use std::time::Duration;

/// Tunables for a [`DocVec`](crate::DocVec) store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Name of the search index provisioned with every collection.
    pub index_name: String,
    /// Similarity the search index is built with.
    pub similarity: Similarity,
    /// Maximum documents per insert batch.
    pub insert_batch_size: usize,
    /// Maximum approximate payload bytes per insert batch.
    pub max_batch_bytes: usize,
    /// ANN candidates per requested result.
    pub oversampling_factor: usize,
    /// Block after index create/drop until the backend reports the change.
    pub wait_until_index_ready: Option<Duration>,
    /// Block after insert until the last document is searchable.
    pub wait_until_document_ready: Option<Duration>,
    /// Interval between readiness polls.
    pub poll_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            index_name: "vector_index".to_string(),
            similarity: Similarity::Cosine,
            insert_batch_size: 100_000,
            max_batch_bytes: 47_000_000,
            oversampling_factor: 10,
            wait_until_index_ready: None,
            wait_until_document_ready: None,
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl StoreConfig {
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Reads `DOCVEC_*` variables over the defaults.
    ///
    /// Recognized: `DOCVEC_INDEX_NAME`, `DOCVEC_SIMILARITY`,
    /// `DOCVEC_INSERT_BATCH_SIZE`, `DOCVEC_OVERSAMPLING_FACTOR`,
    /// `DOCVEC_WAIT_INDEX_SECS`, `DOCVEC_WAIT_DOCUMENT_SECS`.
    pub fn from_env() -> Result<Self, DomainError> {
        let mut builder = Self::builder();
        if let Ok(name) = std::env::var("DOCVEC_INDEX_NAME") {
            builder = builder.index_name(name);
        }
        if let Ok(sim) = std::env::var("DOCVEC_SIMILARITY") {
            builder = builder.similarity(sim.parse().map_err(DomainError::InvalidInput)?);
        }
        if let Some(n) = env_number("DOCVEC_INSERT_BATCH_SIZE")? {
            builder = builder.insert_batch_size(n as usize);
        }
        if let Some(n) = env_number("DOCVEC_OVERSAMPLING_FACTOR")? {
            builder = builder.oversampling_factor(n as usize);
        }
        if let Some(secs) = env_number("DOCVEC_WAIT_INDEX_SECS")? {
            builder = builder.wait_until_index_ready(Duration::from_secs(secs));
        }
        if let Some(secs) = env_number("DOCVEC_WAIT_DOCUMENT_SECS")? {
            builder = builder.wait_until_document_ready(Duration::from_secs(secs));
        }
        builder.build()
    }
}

fn env_number(key: &str) -> Result<Option<u64>, DomainError> {
    match std::env::var(key) {
        Ok(v) => v
            .parse()
            .map(Some)
            .map_err(|e| DomainError::InvalidInput(format!("{key}={v}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Builder for a validated [`StoreConfig`].
#[derive(Debug, Clone, Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        self.config.index_name = name.into();
        self
    }

    pub fn similarity(mut self, similarity: Similarity) -> Self {
        self.config.similarity = similarity;
        self
    }

    pub fn insert_batch_size(mut self, size: usize) -> Self {
        self.config.insert_batch_size = size;
        self
    }

    pub fn max_batch_bytes(mut self, bytes: usize) -> Self {
        self.config.max_batch_bytes = bytes;
        self
    }

    pub fn oversampling_factor(mut self, factor: usize) -> Self {
        self.config.oversampling_factor = factor;
        self
    }

    pub fn wait_until_index_ready(mut self, timeout: Duration) -> Self {
        self.config.wait_until_index_ready = Some(timeout);
        self
    }

    pub fn wait_until_document_ready(mut self, timeout: Duration) -> Self {
        self.config.wait_until_document_ready = Some(timeout);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// # Errors
    ///
    /// Returns [`DomainError::InvalidInput`] if the index name is empty or any
    /// batch limit, the oversampling factor or the poll interval is zero.
    pub fn build(self) -> Result<StoreConfig, DomainError> {
        let c = &self.config;
        if c.index_name.trim().is_empty() {
            return Err(DomainError::InvalidInput("index_name must not be empty".into()));
        }
        if c.insert_batch_size == 0 || c.max_batch_bytes == 0 {
            return Err(DomainError::InvalidInput("batch limits must be greater than zero".into()));
        }
        if c.oversampling_factor == 0 {
            return Err(DomainError::InvalidInput("oversampling_factor must be greater than zero".into()));
        }
        if c.poll_interval.is_zero() {
            return Err(DomainError::InvalidInput("poll_interval must be greater than zero".into()));
        }
        Ok(self.config)
    }
}
