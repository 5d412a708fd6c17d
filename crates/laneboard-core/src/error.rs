//! Error types for laneboard-core.

use thiserror::Error;

/// Result type alias for laneboard-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while validating or applying a reassignment.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No client with the given id exists.
    #[error("client not found: {0}")]
    NotFound(i64),

    /// Status outside the closed lane set.
    #[error("invalid status '{0}': expected one of backlog, in-progress, complete")]
    InvalidLane(String),

    /// Priority that is not a positive integer.
    #[error("invalid priority '{0}': expected a positive integer")]
    InvalidPriority(String),

    /// The lane's highest rank cannot be shifted or appended above.
    #[error("lane '{0}' has no rank left above its last client")]
    RankOverflow(crate::lane::Lane),

    /// Failure reported by the backing lane store.
    #[error("storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Whether the error was caused by caller input rather than the store.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}
