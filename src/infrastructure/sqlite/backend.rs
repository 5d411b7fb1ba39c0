use crate::domain::entities::collection::Collection;
use crate::domain::entities::document::{Document, Metadata};
use crate::domain::entities::stored_record::StoredRecord;
use crate::domain::error::DomainError;
use crate::domain::ports::document_backend::*;
use crate::domain::values::document_field::Projection;
use crate::domain::values::document_id::DocumentId;
use crate::infrastructure::sqlite::migrations::run_migrations;
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

impl ToSql for DocumentId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            DocumentId::Int(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            DocumentId::Str(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl FromSql for DocumentId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(i) => Ok(DocumentId::Int(i)),
            ValueRef::Text(t) => std::str::from_utf8(t)
                .map(|s| DocumentId::Str(s.to_string()))
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// SQLite caps bound variables per statement at 32766; id lists are split
/// into chunks below that, leaving room for the collection parameter.
const MAX_IDS_PER_STATEMENT: usize = 32_000;

/// SQLite-backed document store. Search is exact: every record in the
/// collection is scored, so a search index is queryable as soon as it exists.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    pub fn new(conn: Connection) -> Result<Self, DomainError> {
        run_migrations(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Opens `path` (or `:memory:`) in WAL mode and migrates it.
    pub fn open(path: &str) -> Result<Self, DomainError> {
        let conn = Connection::open(path).map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;
        Self::new(conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DomainError> {
        self.conn.lock().map_err(|e| DomainError::Database(e.to_string()))
    }

    fn serialize_vector(v: &[f32]) -> Vec<u8> {
        v.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_vector(bytes: &[u8]) -> Vec<f32> {
        bytes.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn parse_metadata(raw: &str) -> Result<Metadata, DomainError> {
        serde_json::from_str(raw).map_err(|e| DomainError::Parse(format!("Corrupt metadata: {e}")))
    }

    fn parse_time(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn write_error(context: &str, e: rusqlite::Error) -> DomainError {
        match &e {
            rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
                DomainError::WriteConflict(format!("{context}: {e}"))
            }
            _ => DomainError::Database(format!("{context}: {e}")),
        }
    }

    fn ensure_collection(conn: &Connection, name: &str) -> Result<(), DomainError> {
        conn.execute(
            "INSERT OR IGNORE INTO collections (name, created_at) VALUES (?1, ?2)",
            params![name, Utc::now().to_rfc3339()],
        ).map_err(|e| DomainError::Database(format!("Failed to create collection: {e}")))?;
        Ok(())
    }

    fn index_status(conn: &Connection, collection: &str, name: &str) -> Result<Option<SearchIndexStatus>, DomainError> {
        let row: Option<(String, i64, String)> = conn
            .query_row(
                "SELECT name, dimension, similarity FROM search_indexes WHERE collection = ?1 AND name = ?2",
                params![collection, name],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .optional()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        row.map(Self::row_to_status).transpose()
    }

    fn row_to_status((name, dimension, similarity): (String, i64, String)) -> Result<SearchIndexStatus, DomainError> {
        Ok(SearchIndexStatus {
            name,
            dimension: dimension as usize,
            similarity: similarity.parse().map_err(DomainError::Parse)?,
            queryable: true,
        })
    }

    /// Raw `(id, content, metadata, embedding)` rows. Insertion order for
    /// `All`; for long id lists, insertion order within each chunk.
    fn select_rows(
        conn: &Connection,
        collection: &str,
        filter: RecordFilter<'_>,
    ) -> Result<Vec<(DocumentId, String, String, Vec<u8>)>, DomainError> {
        match filter {
            RecordFilter::All => Self::select_chunk(conn, collection, None),
            RecordFilter::Ids(ids) => {
                let mut rows = Vec::new();
                for chunk in ids.chunks(MAX_IDS_PER_STATEMENT) {
                    rows.extend(Self::select_chunk(conn, collection, Some(chunk))?);
                }
                Ok(rows)
            }
        }
    }

    fn select_chunk(
        conn: &Connection,
        collection: &str,
        ids: Option<&[DocumentId]>,
    ) -> Result<Vec<(DocumentId, String, String, Vec<u8>)>, DomainError> {
        let mut sql = "SELECT doc_id, content, metadata, embedding FROM records WHERE collection = ?1".to_string();
        let mut args: Vec<&dyn ToSql> = vec![&collection];
        if let Some(ids) = ids {
            sql.push_str(&format!(" AND doc_id IN ({})", Self::placeholders(ids.len())));
            args.extend(ids.iter().map(|id| id as &dyn ToSql));
        }
        sql.push_str(" ORDER BY rowid");

        let mut stmt = conn.prepare(&sql).map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(args.as_slice(), |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
            .map_err(|e| DomainError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Database(format!("Failed to read records: {e}")))?;
        Ok(rows)
    }

    /// `?2, ?3, ...` for `n` ids following the collection parameter.
    fn placeholders(n: usize) -> String {
        (0..n).map(|i| format!("?{}", i + 2)).collect::<Vec<_>>().join(", ")
    }

    fn row_to_record((id, content, metadata, embedding): (DocumentId, String, String, Vec<u8>)) -> Result<StoredRecord, DomainError> {
        Ok(StoredRecord {
            id,
            content,
            metadata: Self::parse_metadata(&metadata)?,
            embedding: Self::deserialize_vector(&embedding),
        })
    }
}

impl DocumentBackend for SqliteBackend {
    fn create_collection(&self, name: &str) -> Result<Collection, DomainError> {
        let conn = self.lock()?;
        let collection = Collection::new(name);
        conn.execute(
            "INSERT INTO collections (name, created_at) VALUES (?1, ?2)",
            params![collection.name, collection.created_at.to_rfc3339()],
        ).map_err(|e| Self::write_error(&format!("Failed to create collection '{name}'"), e))?;
        debug!(collection = name, "created collection");
        Ok(collection)
    }

    fn get_collection(&self, name: &str) -> Result<Option<Collection>, DomainError> {
        let conn = self.lock()?;
        let created: Option<String> = conn
            .query_row(
                "SELECT created_at FROM collections WHERE name = ?1",
                params![name],
                |r| r.get(0),
            )
            .optional()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(created.map(|c| Collection {
            name: name.to_string(),
            created_at: Self::parse_time(&c),
        }))
    }

    fn drop_collection(&self, name: &str) -> Result<bool, DomainError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| DomainError::Database(e.to_string()))?;
        let records = tx
            .execute("DELETE FROM records WHERE collection = ?1", params![name])
            .map_err(|e| DomainError::Database(format!("Failed to drop records: {e}")))?;
        tx.execute("DELETE FROM search_indexes WHERE collection = ?1", params![name])
            .map_err(|e| DomainError::Database(format!("Failed to drop indexes: {e}")))?;
        let existed = tx
            .execute("DELETE FROM collections WHERE name = ?1", params![name])
            .map_err(|e| DomainError::Database(format!("Failed to drop collection: {e}")))?;
        tx.commit().map_err(|e| DomainError::Database(e.to_string()))?;
        debug!(collection = name, records, "dropped collection");
        Ok(existed > 0 || records > 0)
    }

    fn list_collections(&self) -> Result<Vec<String>, DomainError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT name FROM collections ORDER BY name")
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let names = stmt
            .query_map([], |r| r.get(0))
            .map_err(|e| DomainError::Database(e.to_string()))?
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(names)
    }

    fn create_search_index(&self, collection: &str, spec: &SearchIndexSpec) -> Result<(), DomainError> {
        let conn = self.lock()?;
        Self::ensure_collection(&conn, collection)?;
        conn.execute(
            "INSERT INTO search_indexes (collection, name, dimension, similarity, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                collection,
                spec.name,
                spec.dimension as i64,
                spec.similarity.to_string(),
                Utc::now().to_rfc3339(),
            ],
        ).map_err(|e| Self::write_error(&format!("Failed to create index '{}'", spec.name), e))?;
        debug!(collection, index = %spec.name, dimension = spec.dimension, "created search index");
        Ok(())
    }

    fn drop_search_index(&self, collection: &str, name: &str) -> Result<(), DomainError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM search_indexes WHERE collection = ?1 AND name = ?2",
            params![collection, name],
        ).map_err(|e| DomainError::Database(format!("Failed to drop index: {e}")))?;
        Ok(())
    }

    fn list_search_indexes(&self, collection: &str) -> Result<Vec<SearchIndexStatus>, DomainError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT name, dimension, similarity FROM search_indexes WHERE collection = ?1 ORDER BY name")
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![collection], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
            .map_err(|e| DomainError::Database(e.to_string()))?
            .collect::<Result<Vec<(String, i64, String)>, _>>()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        rows.into_iter().map(Self::row_to_status).collect()
    }

    fn insert_many(&self, collection: &str, records: &[StoredRecord]) -> Result<Vec<DocumentId>, DomainError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| DomainError::Database(e.to_string()))?;
        Self::ensure_collection(&tx, collection)?;
        let mut inserted = Vec::with_capacity(records.len());
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO records (collection, doc_id, content, metadata, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(|e| DomainError::Database(e.to_string()))?;
            for record in records {
                let metadata = serde_json::to_string(&record.metadata)?;
                stmt.execute(params![
                    collection,
                    record.id,
                    record.content,
                    metadata,
                    Self::serialize_vector(&record.embedding),
                ])
                .map_err(|e| Self::write_error(&format!("Failed to insert document {}", record.id), e))?;
                inserted.push(record.id.clone());
            }
        }
        tx.commit().map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(inserted)
    }

    fn replace_one(&self, collection: &str, record: &StoredRecord, upsert: bool) -> Result<ReplaceOutcome, DomainError> {
        let conn = self.lock()?;
        let existing = Self::select_rows(&conn, collection, RecordFilter::Ids(std::slice::from_ref(&record.id)))?
            .pop()
            .map(Self::row_to_record)
            .transpose()?;
        let metadata = serde_json::to_string(&record.metadata)?;
        let blob = Self::serialize_vector(&record.embedding);

        match existing {
            Some(old) => {
                let modified = old != *record;
                if modified {
                    conn.execute(
                        "UPDATE records SET content = ?3, metadata = ?4, embedding = ?5
                         WHERE collection = ?1 AND doc_id = ?2",
                        params![collection, record.id, record.content, metadata, blob],
                    ).map_err(|e| Self::write_error(&format!("Failed to replace document {}", record.id), e))?;
                }
                Ok(ReplaceOutcome { matched: true, modified, upserted: false })
            }
            None if upsert => {
                Self::ensure_collection(&conn, collection)?;
                conn.execute(
                    "INSERT INTO records (collection, doc_id, content, metadata, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![collection, record.id, record.content, metadata, blob],
                ).map_err(|e| Self::write_error(&format!("Failed to upsert document {}", record.id), e))?;
                Ok(ReplaceOutcome { matched: false, modified: false, upserted: true })
            }
            None => Ok(ReplaceOutcome::default()),
        }
    }

    fn delete_many(&self, collection: &str, ids: &[DocumentId]) -> Result<usize, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| DomainError::Database(e.to_string()))?;
        let mut deleted = 0;
        for chunk in ids.chunks(MAX_IDS_PER_STATEMENT) {
            let sql = format!(
                "DELETE FROM records WHERE collection = ?1 AND doc_id IN ({})",
                Self::placeholders(chunk.len())
            );
            let mut args: Vec<&dyn ToSql> = vec![&collection];
            args.extend(chunk.iter().map(|id| id as &dyn ToSql));
            deleted += tx
                .execute(&sql, args.as_slice())
                .map_err(|e| DomainError::Database(format!("Failed to delete documents: {e}")))?;
        }
        tx.commit().map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(deleted)
    }

    fn find(&self, collection: &str, filter: RecordFilter<'_>, projection: &Projection) -> Result<Vec<Document>, DomainError> {
        let records = self.find_records(collection, filter)?;
        Ok(records.iter().map(|r| r.to_document(projection)).collect())
    }

    fn find_records(&self, collection: &str, filter: RecordFilter<'_>) -> Result<Vec<StoredRecord>, DomainError> {
        let mut conn = self.lock()?;
        // One read snapshot across all id chunks
        let tx = conn.transaction().map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = Self::select_rows(&tx, collection, filter)?;
        tx.commit().map_err(|e| DomainError::Database(e.to_string()))?;
        rows.into_iter().map(Self::row_to_record).collect()
    }

    fn count(&self, collection: &str) -> Result<usize, DomainError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1",
            params![collection],
            |r| r.get(0),
        ).map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(count as usize)
    }

    fn vector_search(&self, collection: &str, query: &VectorQuery<'_>) -> Result<Vec<(Document, f64)>, DomainError> {
        let conn = self.lock()?;
        let index = match Self::index_status(&conn, collection, query.index)? {
            Some(index) => index,
            None => {
                debug!(collection, index = query.index, "no search index, returning no hits");
                return Ok(vec![]);
            }
        };
        if index.dimension != query.vector.len() {
            return Err(DomainError::InvalidInput(format!(
                "query vector has dimension {} but index '{}' expects {}",
                query.vector.len(),
                index.name,
                index.dimension
            )));
        }

        let mut hits: Vec<(Document, f64)> = Self::select_rows(&conn, collection, RecordFilter::All)?
            .into_iter()
            .map(Self::row_to_record)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|record| {
                let score = index.similarity.score(query.vector, &record.embedding);
                (record.to_document(query.projection), score)
            })
            .filter(|(_, score)| score.is_finite() && query.min_score.map_or(true, |min| *score >= min))
            .collect();

        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
        hits.truncate(query.limit);
        debug!(collection, hits = hits.len(), "vector search");
        Ok(hits)
    }
}
