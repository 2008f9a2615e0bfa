//! Typed error enum for the storage layer.

use thiserror::Error;

/// Failures reading or writing persisted session state.
///
/// Token stores never surface these to their callers: a failed write is logged and the
/// in-memory state stays authoritative, a failed read hydrates as logged out.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error on {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported format version {found} for {key} (expected {expected})")]
    UnsupportedVersion { key: String, found: u32, expected: u32 },

    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}
