//! Chronicle demo: error types.

use chronicle_core::error::DomainError;
use thiserror::Error;

/// Startup and runtime errors for the demo.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A domain operation failed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Output could not be rendered.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A reloaded aggregate did not match the one that was saved.
    #[error("replay mismatch: {0}")]
    ReplayMismatch(String),
}
