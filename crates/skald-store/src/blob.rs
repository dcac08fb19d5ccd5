//! Keyed-object blob store.
//!
//! The destination key is derived from the session id, so repeated uploads
//! for one session overwrite the previous object. The document backend
//! instead inserts a fresh record per upload.

use std::io::Write;
use std::path::{Path, PathBuf};

use skald_core::StoredDocument;

use crate::config::validate_destination;
use crate::{InsertReceipt, StorageBackend};

/// Object-storage deployment target, one JSON object per session.
pub struct BlobStore {
    bucket_dir: PathBuf,
    bucket: String,
}

impl BlobStore {
    /// Open the store, creating `<root>/<bucket>/` if needed.
    pub fn open(root: &Path, bucket: &str) -> anyhow::Result<Self> {
        validate_destination(bucket)?;
        let bucket_dir = root.join(bucket);
        std::fs::create_dir_all(&bucket_dir)?;
        Ok(Self {
            bucket_dir,
            bucket: bucket.to_string(),
        })
    }

    /// Filesystem path backing an object key's session component.
    pub fn object_path(&self, session_id: &str) -> PathBuf {
        self.bucket_dir.join(format!("{}.json", safe_component(session_id)))
    }
}

impl StorageBackend for BlobStore {
    fn name(&self) -> &'static str {
        "blob"
    }

    fn insert(&self, doc: &StoredDocument) -> anyhow::Result<InsertReceipt> {
        let component = safe_component(&doc.payload.session_id);
        let key = format!("{}/{component}.json", self.bucket);
        let final_path = self.bucket_dir.join(format!("{component}.json"));
        let bytes = serde_json::to_vec(doc)?;

        // Atomic overwrite: unique tmp file in the same dir, then rename.
        // The tmp name must not collide across concurrent inserts for the
        // same session.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.bucket_dir)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(&final_path)?;

        Ok(InsertReceipt::Object { key })
    }
}

/// Session ids are opaque client input; anything outside `[A-Za-z0-9_-]`
/// is replaced so the id cannot escape the bucket directory.
fn safe_component(session_id: &str) -> String {
    session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
