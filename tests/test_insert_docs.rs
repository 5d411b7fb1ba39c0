mod common;

use common::*;
use docvec::config::StoreConfig;
use docvec::domain::entities::document::Document;
use docvec::domain::error::DomainError;
use docvec::domain::values::document_id::DocumentId;
use docvec::DocVec;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test]
async fn test_insert_docs() {
    let db = setup();
    let docs = example_documents();

    // No active collection and no name given
    let err = db.insert_docs(&docs, None, false).await.unwrap_err();
    assert!(err.to_string().contains("No collection is specified"));

    // Upsert into a collection that was never created
    db.insert_docs(&docs, Some(COLLECTION), true).await.unwrap();
    assert_eq!(db.backend().count(COLLECTION).unwrap(), 4);

    db.delete_collection(COLLECTION).await.unwrap();
    db.create_collection(COLLECTION, false).await.unwrap();

    db.insert_docs(&docs, Some(COLLECTION), false).await.unwrap();
    let found = stored(&db, COLLECTION);
    assert_eq!(found.len(), docs.len());

    // Stored shape carries the backend id field, never "id"
    for record in &found {
        let value = serde_json::to_value(record).unwrap();
        let keys: HashSet<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, HashSet::from(["_id", "content", "metadata", "embedding"]));
    }

    let stored_ids: HashSet<DocumentId> = found.iter().map(|r| r.id.clone()).collect();
    assert_eq!(stored_ids, ids(json!([1, "1", 2, "2"])).into_iter().collect());
    assert_eq!(found[0].embedding.len(), 384);
}

#[tokio::test]
async fn test_insert_does_not_touch_input() {
    let db = setup_with_collection().await;
    let docs = example_documents();
    db.insert_docs(&docs, None, false).await.unwrap();
    assert_eq!(docs, example_documents());
    let value = serde_json::to_value(&docs[0]).unwrap();
    let keys: HashSet<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, HashSet::from(["id", "content", "metadata"]));
}

#[tokio::test]
async fn test_insert_duplicate_id_is_write_conflict() {
    let db = setup_with_collection().await;
    db.insert_docs(&example_documents(), None, false).await.unwrap();

    let err = db
        .insert_docs(&[Document::new(1, "Another dog.")], None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::WriteConflict(_)));

    let docs = db.get_docs_by_ids(Some(ids(json!([1])).as_slice()), None, None).unwrap();
    assert_eq!(docs[0].content.as_deref(), Some("Dogs are tough."));
}

#[tokio::test]
async fn test_insert_with_upsert_replaces() {
    let db = setup_with_collection().await;
    db.insert_docs(&example_documents(), None, false).await.unwrap();
    db.insert_docs(&[Document::new(1, "Another dog.")], None, true).await.unwrap();

    assert_eq!(db.backend().count(COLLECTION).unwrap(), 4);
    let docs = db.get_docs_by_ids(Some(ids(json!([1])).as_slice()), None, None).unwrap();
    assert_eq!(docs[0].content.as_deref(), Some("Another dog."));
}

#[tokio::test]
async fn test_insert_requires_content() {
    let db = setup_with_collection().await;
    let doc = Document {
        id: DocumentId::Int(5),
        content: None,
        metadata: None,
    };
    let err = db.insert_docs(&[doc], None, false).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));
    assert_eq!(db.backend().count(COLLECTION).unwrap(), 0);
}

#[tokio::test]
async fn test_insert_empty_is_noop() {
    let db = setup_with_collection().await;
    db.insert_docs(&[], None, false).await.unwrap();
    assert_eq!(db.backend().count(COLLECTION).unwrap(), 0);
}

#[tokio::test]
async fn test_insert_in_small_batches() {
    let config = StoreConfig::builder().insert_batch_size(3).build().unwrap();
    let db = DocVec::with_config(":memory:", Arc::new(ConceptEmbedder), config).unwrap();
    db.create_collection(COLLECTION, false).await.unwrap();

    let docs: Vec<Document> = (0..10).map(|i| Document::new(i, format!("doc number {i}"))).collect();
    db.insert_docs(&docs, None, false).await.unwrap();
    assert_eq!(db.backend().count(COLLECTION).unwrap(), 10);
}

#[tokio::test]
async fn test_insert_embeds_content() {
    let db = setup_with_collection().await;
    db.insert_docs(&example_documents(), None, false).await.unwrap();
    for record in stored(&db, COLLECTION) {
        assert_eq!(record.embedding, ConceptEmbedder::vector(&record.content));
    }
}
