//! SQLite-backed document store.
//!
//! One row per accepted upload with a fresh `rec_<ulid>` id, so repeated
//! sessions insert distinct records.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use skald_core::StoredDocument;
use ulid::Ulid;

use crate::config::validate_destination;
use crate::{InsertReceipt, StorageBackend};

/// Document-database deployment target.
///
/// The connection is shared by concurrent requests through an internal
/// mutex; rusqlite's `Connection` is `Send` but not `Sync` on its own.
pub struct DocumentStore {
    conn: Mutex<Connection>,
    table: String,
}

impl DocumentStore {
    /// Open or create the database with the schema applied. Idempotent.
    pub fn open_or_create(db_path: &Path, collection: &str) -> anyhow::Result<Self> {
        validate_destination(collection)?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {collection} (
                rowid INTEGER PRIMARY KEY,
                id TEXT UNIQUE NOT NULL,
                session_id TEXT NOT NULL,
                uploaded_at TEXT NOT NULL,
                client_ip TEXT NOT NULL,
                document TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{collection}_session
                ON {collection}(session_id);"
        ))?;
        Ok(Self {
            conn: Mutex::new(conn),
            table: collection.to_string(),
        })
    }

    /// Read back every stored document in insertion order.
    pub fn list(&self) -> anyhow::Result<Vec<(String, StoredDocument)>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("document store mutex poisoned"))?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, document FROM {} ORDER BY rowid",
            self.table
        ))?;
        let rows: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(id, doc)| Ok((id, serde_json::from_str(&doc)?)))
            .collect()
    }
}

impl StorageBackend for DocumentStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn insert(&self, doc: &StoredDocument) -> anyhow::Result<InsertReceipt> {
        let id = format!("rec_{}", Ulid::new().to_string().to_lowercase());
        let document = serde_json::to_string(doc)?;
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("document store mutex poisoned"))?;
        conn.execute(
            &format!(
                "INSERT INTO {} (id, session_id, uploaded_at, client_ip, document)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                self.table
            ),
            params![
                id,
                doc.payload.session_id,
                doc.uploaded_at,
                doc.client_ip,
                document
            ],
        )?;
        Ok(InsertReceipt::Record { id })
    }
}
