use std::path::PathBuf;

use crate::{blob::BlobStore, sqlite::DocumentStore, StorageBackend};

/// Destination configuration errors: misconfiguration, not transient
/// faults. Surfaced once at first use and never retried.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SKALD_STORE_BACKEND must be set to \"sqlite\" or \"blob\"")]
    MissingBackend,
    #[error("unknown storage backend {0:?} (expected \"sqlite\" or \"blob\")")]
    UnknownBackend(String),
    #[error("{0} must be set for the {1} backend")]
    MissingSetting(&'static str, &'static str),
    #[error("invalid destination name {0:?}: only letters, digits and '_' allowed")]
    InvalidDestination(String),
}

/// Which backend this deployment writes to, and where.
///
/// The two backends are alternative deployment targets sharing one
/// ingestion contract — never a dual-write.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Sqlite { db_path: PathBuf, collection: String },
    Blob { root: PathBuf, bucket: String },
}

const DEFAULT_DESTINATION: &str = "transcripts";

impl StoreConfig {
    /// Read the configuration surface from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the env in production, a map in
    /// tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend = lookup("SKALD_STORE_BACKEND").ok_or(ConfigError::MissingBackend)?;
        match backend.as_str() {
            "sqlite" => {
                let db_path = lookup("SKALD_SQLITE_PATH").ok_or(ConfigError::MissingSetting(
                    "SKALD_SQLITE_PATH",
                    "sqlite",
                ))?;
                let collection = lookup("SKALD_COLLECTION")
                    .unwrap_or_else(|| DEFAULT_DESTINATION.to_string());
                validate_destination(&collection)?;
                Ok(StoreConfig::Sqlite {
                    db_path: PathBuf::from(db_path),
                    collection,
                })
            }
            "blob" => {
                let root = lookup("SKALD_BLOB_ROOT")
                    .ok_or(ConfigError::MissingSetting("SKALD_BLOB_ROOT", "blob"))?;
                let bucket =
                    lookup("SKALD_BUCKET").unwrap_or_else(|| DEFAULT_DESTINATION.to_string());
                validate_destination(&bucket)?;
                Ok(StoreConfig::Blob {
                    root: PathBuf::from(root),
                    bucket,
                })
            }
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }

    /// Establish the configured backend. Called once per process by the
    /// connection cache; the handle lives until process teardown.
    pub fn open(&self) -> anyhow::Result<Box<dyn StorageBackend>> {
        match self {
            StoreConfig::Sqlite {
                db_path,
                collection,
            } => Ok(Box::new(DocumentStore::open_or_create(db_path, collection)?)),
            StoreConfig::Blob { root, bucket } => Ok(Box::new(BlobStore::open(root, bucket)?)),
        }
    }
}

/// Collection/bucket names become a SQL identifier or a directory name, so
/// they are restricted to `[A-Za-z0-9_]` and must not start with a digit.
pub(crate) fn validate_destination(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidDestination(name.to_string()))
    }
}
