use rusqlite::Connection;

/// `records.doc_id` is declared without a type so SQLite keeps each id's
/// storage class: integer `1` and text `'1'` are different keys.
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS search_indexes (
            collection TEXT NOT NULL,
            name TEXT NOT NULL,
            dimension INTEGER NOT NULL,
            similarity TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (collection, name)
        );

        CREATE TABLE IF NOT EXISTS records (
            collection TEXT NOT NULL,
            doc_id NOT NULL,
            content TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}',
            embedding BLOB NOT NULL,
            PRIMARY KEY (collection, doc_id)
        );
        "
    ).map_err(|e| format!("Migration failed: {e}"))
}
