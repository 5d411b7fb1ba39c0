mod common;

use common::*;
use docvec::domain::entities::document::Document;
use docvec::domain::values::document_id::DocumentId;
use serde_json::json;
use std::collections::HashSet;

fn content_of(db: &docvec::DocVec, id: DocumentId) -> Option<String> {
    db.get_docs_by_ids(Some(std::slice::from_ref(&id)), None, Some(COLLECTION))
        .unwrap()
        .pop()
        .and_then(|d| d.content)
}

#[tokio::test]
async fn test_update_docs() {
    let db = setup_with_collection().await;
    let docs = example_documents();

    // Upsert inserts what is missing
    let summary = db.update_docs(&docs, Some(COLLECTION), true).await.unwrap();
    assert_eq!(summary.upserted, 4);
    assert_eq!(docs, example_documents());
    assert_eq!(db.backend().count(COLLECTION).unwrap(), docs.len());

    let found = stored(&db, COLLECTION);
    for record in &found {
        let value = serde_json::to_value(record).unwrap();
        let keys: HashSet<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, HashSet::from(["_id", "content", "metadata", "embedding"]));
    }
    let stored_ids: HashSet<DocumentId> = found.into_iter().map(|r| r.id).collect();
    assert_eq!(stored_ids, ids(json!([1, "1", 2, "2"])).into_iter().collect());

    // Update an existing document
    let updated = Document::new(1, "Cats are tough.").with_metadata(json!({"a": 10}));
    let summary = db.update_docs(&[updated], Some(COLLECTION), false).await.unwrap();
    assert_eq!((summary.matched, summary.modified, summary.upserted), (1, 1, 0));
    assert_eq!(content_of(&db, DocumentId::Int(1)).as_deref(), Some("Cats are tough."));

    // Upsert a new document
    db.update_docs(&[Document::new(3, "Cats are tough.")], Some(COLLECTION), true)
        .await
        .unwrap();
    assert_eq!(content_of(&db, DocumentId::Int(3)).as_deref(), Some("Cats are tough."));

    // Without upsert a missing id is skipped, not created
    let before = db.backend().count(COLLECTION).unwrap();
    let summary = db
        .update_docs(&[Document::new(4, "That is NOT a sandwich?")], Some(COLLECTION), false)
        .await
        .unwrap();
    assert_eq!(summary.matched, 0);
    assert_eq!(summary.upserted, 0);
    assert!(content_of(&db, DocumentId::Int(4)).is_none());
    assert_eq!(db.backend().count(COLLECTION).unwrap(), before);
}

#[tokio::test]
async fn test_update_recomputes_embedding() {
    let db = setup_with_collection().await;
    db.insert_docs(&example_documents(), None, false).await.unwrap();
    db.update_docs(&[Document::new("1", "Bread for lunch")], None, false).await.unwrap();

    let record = stored(&db, COLLECTION)
        .into_iter()
        .find(|r| r.id == DocumentId::Str("1".into()))
        .unwrap();
    assert_eq!(record.embedding, ConceptEmbedder::vector("Bread for lunch"));
    assert!(record.metadata.is_empty());
}

#[tokio::test]
async fn test_upsert_creates_one_record_with_embedding() {
    let db = setup_with_collection().await;
    db.insert_docs(&example_documents(), None, false).await.unwrap();

    db.update_docs(&[Document::new("new", "A kitten")], None, true).await.unwrap();
    assert_eq!(db.backend().count(COLLECTION).unwrap(), 5);
    let record = stored(&db, COLLECTION)
        .into_iter()
        .find(|r| r.id == DocumentId::Str("new".into()))
        .unwrap();
    assert_eq!(record.embedding.len(), DIMENSION);
}

#[tokio::test]
async fn test_unchanged_update_is_matched_not_modified() {
    let db = setup_with_collection().await;
    let docs = example_documents();
    db.insert_docs(&docs, None, false).await.unwrap();
    let summary = db.update_docs(&docs[..1], None, false).await.unwrap();
    assert_eq!((summary.matched, summary.modified), (1, 0));
}

#[tokio::test]
async fn test_update_without_collection_fails() {
    let db = setup();
    assert!(db.update_docs(&example_documents(), None, true).await.is_err());
}
