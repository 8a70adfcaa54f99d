//! Domain event abstractions.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::store::StoredEvent;

/// Metadata attached to every domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Type name for deserialization routing.
    pub event_type: String,
    /// Aggregate/stream this event belongs to.
    pub aggregate_id: Uuid,
    /// The aggregate version this event produces.
    pub sequence_number: i64,
    /// Correlation ID for tracing a command through its effects.
    pub correlation_id: Uuid,
    /// Causation ID linking this event to the event/command that caused it.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    /// Copies the metadata columns out of a stored record.
    #[must_use]
    pub fn from_stored(stored: &StoredEvent) -> Self {
        Self {
            event_id: stored.event_id,
            event_type: stored.event_type.clone(),
            aggregate_id: stored.aggregate_id,
            sequence_number: stored.sequence_number,
            correlation_id: stored.correlation_id,
            causation_id: stored.causation_id,
            occurred_at: stored.occurred_at,
        }
    }
}

/// Trait that all domain events implement.
///
/// An event is an immutable fact. It is folded into aggregate state by
/// [`AggregateRoot::apply`](crate::aggregate::AggregateRoot::apply) and
/// persisted as a [`StoredEvent`]: a type tag plus a self-describing JSON
/// payload holding only the variant's own fields.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name (used for serialization routing).
    fn event_type(&self) -> &'static str;

    /// Serializes the event payload to JSON.
    fn to_payload(&self) -> serde_json::Value;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;

    /// Rebuilds a typed event from its stored representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CorruptHistory` if the type tag is unknown to
    /// this event type or the payload does not have the expected shape.
    fn from_stored(stored: &StoredEvent) -> Result<Self, DomainError>
    where
        Self: Sized;

    /// Converts the event into the record handed to the event store.
    fn to_stored(&self) -> StoredEvent {
        let meta = self.metadata();
        StoredEvent {
            event_id: meta.event_id,
            aggregate_id: meta.aggregate_id,
            event_type: self.event_type().to_owned(),
            payload: self.to_payload(),
            sequence_number: meta.sequence_number,
            correlation_id: meta.correlation_id,
            causation_id: meta.causation_id,
            occurred_at: meta.occurred_at,
        }
    }
}

/// Deserializes a stored payload into a concrete variant struct.
///
/// # Errors
///
/// Returns `DomainError::CorruptHistory` if the payload does not match `T`.
pub fn decode_payload<T: DeserializeOwned>(stored: &StoredEvent) -> Result<T, DomainError> {
    serde_json::from_value(stored.payload.clone()).map_err(|e| DomainError::CorruptHistory {
        aggregate_id: stored.aggregate_id,
        sequence_number: stored.sequence_number,
        reason: format!("malformed `{}` payload: {e}", stored.event_type),
    })
}

/// Builds the error for a stored type tag the model does not know.
#[must_use]
pub fn unknown_event_type(stored: &StoredEvent) -> DomainError {
    DomainError::CorruptHistory {
        aggregate_id: stored.aggregate_id,
        sequence_number: stored.sequence_number,
        reason: format!("unknown event type `{}`", stored.event_type),
    }
}
