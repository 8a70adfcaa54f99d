//! Event store abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;

/// Stored representation of a domain event.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Version this event produces within the aggregate stream.
    pub sequence_number: i64,
    /// Correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Causation ID linking to the causing event/command.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: chrono::DateTime<chrono::Utc>,
}

/// Append-only, per-aggregate ordered event log.
///
/// Implementations must make the version check and the write in
/// `append_events` a single atomic step: of two appends racing with the same
/// `expected_version`, exactly one succeeds and the other fails with
/// `DomainError::ConcurrencyConflict`. A failed append persists nothing.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Load all events for a given aggregate, ordered by sequence number.
    /// An unknown aggregate has an empty history.
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError>;

    /// Append new events to an aggregate stream with optimistic concurrency.
    /// `expected_version` is the last known sequence number; on success the
    /// new version (`expected_version + events.len()`) is returned.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, DomainError>;

    /// Returns the number of events stored for the aggregate.
    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, DomainError> {
        let events = self.load_events(aggregate_id).await?;
        i64::try_from(events.len()).map_err(|e| DomainError::Infrastructure(e.to_string()))
    }
}

/// Checks the shape of a batch before it is written: every event belongs to
/// `aggregate_id` and the sequence numbers run gaplessly from
/// `expected_version + 1`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` describing the first offending event.
pub fn validate_batch(
    aggregate_id: Uuid,
    expected_version: i64,
    events: &[StoredEvent],
) -> Result<(), DomainError> {
    if expected_version < 0 {
        return Err(DomainError::Infrastructure(format!(
            "negative expected version {expected_version} for aggregate {aggregate_id}"
        )));
    }
    let mut next = expected_version + 1;
    for event in events {
        if event.aggregate_id != aggregate_id {
            return Err(DomainError::Infrastructure(format!(
                "event {} belongs to aggregate {}, not {aggregate_id}",
                event.event_id, event.aggregate_id
            )));
        }
        if event.sequence_number != next {
            return Err(DomainError::Infrastructure(format!(
                "event {} has sequence number {}, expected {next}",
                event.event_id, event.sequence_number
            )));
        }
        next += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn event(aggregate_id: Uuid, sequence_number: i64) -> StoredEvent {
        StoredEvent {
            event_id: Uuid::new_v4(),
            aggregate_id,
            event_type: "TestEvent".to_owned(),
            payload: serde_json::json!({}),
            sequence_number,
            correlation_id: Uuid::new_v4(),
            causation_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_batch_accepts_contiguous_sequence() {
        let id = Uuid::new_v4();

        let result = validate_batch(id, 2, &[event(id, 3), event(id, 4)]);

        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_batch_accepts_empty_batch() {
        assert!(validate_batch(Uuid::new_v4(), 0, &[]).is_ok());
    }

    #[test]
    fn test_validate_batch_rejects_gap() {
        let id = Uuid::new_v4();

        let result = validate_batch(id, 0, &[event(id, 1), event(id, 3)]);

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[test]
    fn test_validate_batch_rejects_foreign_aggregate() {
        let id = Uuid::new_v4();

        let result = validate_batch(id, 0, &[event(Uuid::new_v4(), 1)]);

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[test]
    fn test_validate_batch_rejects_negative_expected_version() {
        let id = Uuid::new_v4();

        let result = validate_batch(id, -1, &[event(id, 0)]);

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
