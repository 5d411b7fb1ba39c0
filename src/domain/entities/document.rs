use crate::domain::values::document_id::DocumentId;
use serde::{Deserialize, Serialize};

pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A client-facing document.
///
/// `content` and `metadata` are optional because reads can project them away.
/// Writes require content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: Some(content.into()),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = match metadata {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        };
        self
    }

    /// Approximate payload size for batching writes.
    pub fn byte_size(&self) -> usize {
        let content = self.content.as_ref().map(|c| c.len()).unwrap_or(0);
        let metadata = self
            .metadata
            .as_ref()
            .and_then(|m| serde_json::to_string(m).ok())
            .map_or(0, |json| json.len());
        content + metadata + self.id.byte_size()
    }
}
