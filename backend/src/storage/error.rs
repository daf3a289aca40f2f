//! Error types for persistence operations.

use std::path::PathBuf;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Error type for key-value storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored blob could not be encoded or decoded.
    #[error("Serialization error for key '{key}': {message}")]
    Serialization { key: String, message: String },
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn serialization(key: impl Into<String>, message: impl ToString) -> Self {
        Self::Serialization {
            key: key.into(),
            message: message.to_string(),
        }
    }
}
