//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No events exist for the requested aggregate.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// Optimistic concurrency conflict. The caller must reload the aggregate
    /// and decide again; the rejected events must not be retried as-is.
    #[error(
        "concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// An intent violated a precondition on the current in-memory state.
    #[error("validation error: {0}")]
    Validation(String),

    /// The stored history cannot be folded by the current model.
    #[error("corrupt history for aggregate {aggregate_id} at version {sequence_number}: {reason}")]
    CorruptHistory {
        /// The aggregate whose history could not be replayed.
        aggregate_id: Uuid,
        /// The sequence number of the offending event.
        sequence_number: i64,
        /// What went wrong.
        reason: String,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Returns `true` for errors that indicate a code/data mismatch and must
    /// never be retried.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CorruptHistory { .. })
    }
}
