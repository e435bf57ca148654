//! Error types for the queue estimator
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the crate. Callers that need to branch on a specific failure
//! recover it with `err.downcast_ref::<QueueError>()`.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific estimator scenarios
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("No active queue")]
    NotActive,

    #[error("Persistence failed: {message}")]
    PersistenceFailed { message: String },

    #[error("Invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl QueueError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        QueueError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn persistence(message: impl Into<String>) -> Self {
        QueueError::PersistenceFailed {
            message: message.into(),
        }
    }
}
