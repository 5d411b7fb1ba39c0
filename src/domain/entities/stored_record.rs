use crate::domain::entities::document::{Document, Metadata};
use crate::domain::values::document_field::Projection;
use crate::domain::values::document_id::DocumentId;
use serde::{Deserialize, Serialize};

/// What the backend persists for a document: the id under the backend's `_id`
/// field, the content, the metadata and the embedding computed from content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub content: String,
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

impl StoredRecord {
    /// Builds a record without touching the caller's document.
    pub fn from_document(doc: &Document, embedding: Vec<f32>) -> Self {
        Self {
            id: doc.id.clone(),
            content: doc.content.clone().unwrap_or_default(),
            metadata: doc.metadata.clone().unwrap_or_default(),
            embedding,
        }
    }

    /// Client view of the record. The embedding never leaves the backend.
    pub fn to_document(&self, projection: &Projection) -> Document {
        Document {
            id: self.id.clone(),
            content: projection.content().then(|| self.content.clone()),
            metadata: projection.metadata().then(|| self.metadata.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::values::document_field::DocumentField;
    use serde_json::json;

    #[test]
    fn test_record_shape_uses_backend_id_field() {
        let doc = Document::new(1, "Dogs are tough.").with_metadata(json!({"a": 1}));
        let record = StoredRecord::from_document(&doc, vec![0.5, 0.5]);
        let value = serde_json::to_value(&record).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        keys.sort();
        assert_eq!(keys, vec!["_id", "content", "embedding", "metadata"]);
        assert_eq!(value["_id"], json!(1));
    }

    #[test]
    fn test_to_document_projects_fields() {
        let doc = Document::new("2", "A sandwich makes a great lunch.");
        let record = StoredRecord::from_document(&doc, vec![1.0]);

        let full = record.to_document(&Projection::all());
        assert_eq!(full.content.as_deref(), Some("A sandwich makes a great lunch."));
        assert_eq!(full.metadata, Some(Metadata::new()));

        let partial = record.to_document(&Projection::from_include(Some([DocumentField::Content].as_slice())));
        assert!(partial.metadata.is_none());
        assert_eq!(partial.id, DocumentId::Str("2".into()));
    }
}
