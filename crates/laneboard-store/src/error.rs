//! Error types for the SQLite backend.

use laneboard_core::ClientId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Client not found.
    #[error("client not found: {0}")]
    NotFound(ClientId),

    /// Config file missing.
    #[error("config file not found at '{0}'")]
    ConfigNotFound(PathBuf),

    /// SQLite error.
    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Core library error.
    #[error(transparent)]
    Core(#[from] laneboard_core::CoreError),

    /// A stored row could not be mapped onto the domain model.
    #[error("corrupt row for client {id}: {reason}")]
    CorruptRow { id: ClientId, reason: String },
}

impl StoreError {
    /// Whether the error was caused by caller input rather than storage.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Core(err) => err.is_caller_error(),
            _ => false,
        }
    }
}
