pub mod blob;
pub mod config;
pub mod sqlite;

pub use blob::BlobStore;
pub use config::{ConfigError, StoreConfig};
pub use sqlite::DocumentStore;

use skald_core::StoredDocument;

/// One storage capability shared by every deployment backend: persist a
/// document, hand back where it went.
///
/// Implementations must be safe for concurrent use by in-flight requests;
/// the ingestion endpoint shares one handle across a warm process.
pub trait StorageBackend: Send + Sync {
    /// Backend label for logs and the doctor output.
    fn name(&self) -> &'static str;

    /// Persist one document. Exactly one independent write per call, no
    /// cross-call ordering guarantee.
    fn insert(&self, doc: &StoredDocument) -> anyhow::Result<InsertReceipt>;
}

/// Where an insert landed.
///
/// The document backend mints a fresh record id per insert; the blob
/// backend derives the key from the session, so repeats overwrite.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertReceipt {
    Record { id: String },
    Object { key: String },
}

impl InsertReceipt {
    pub fn identifier(&self) -> &str {
        match self {
            InsertReceipt::Record { id } => id,
            InsertReceipt::Object { key } => key,
        }
    }
}
