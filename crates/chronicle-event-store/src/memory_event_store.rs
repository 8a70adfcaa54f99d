//! In-memory implementation of the `EventStore` trait.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use chronicle_core::error::DomainError;
use chronicle_core::store::{EventStore, StoredEvent, validate_batch};

/// Event store that keeps every stream in process memory.
///
/// The version check and the write happen under one lock, so appends are
/// atomic with respect to each other and to loads.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: Mutex<HashMap<Uuid, Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of events across all streams.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the lock is poisoned.
    pub fn event_count(&self) -> Result<usize, DomainError> {
        Ok(self.lock()?.values().map(Vec::len).sum())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Vec<StoredEvent>>>, DomainError> {
        self.streams
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("event store lock poisoned: {e}")))
    }
}

fn stream_len(stream: &[StoredEvent]) -> Result<i64, DomainError> {
    i64::try_from(stream.len()).map_err(|e| DomainError::Infrastructure(e.to_string()))
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let events = self
            .lock()?
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default();
        debug!(%aggregate_id, count = events.len(), "loaded events");
        Ok(events)
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<i64, DomainError> {
        let mut streams = self.lock()?;
        let actual = streams
            .get(&aggregate_id)
            .map_or(Ok(0), |stream| stream_len(stream))?;

        if actual != expected_version {
            warn!(%aggregate_id, expected_version, actual, "append rejected");
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }
        validate_batch(aggregate_id, expected_version, events)?;
        if events.is_empty() {
            return Ok(actual);
        }

        let stream = streams.entry(aggregate_id).or_default();
        stream.extend_from_slice(events);
        let new_version = stream_len(stream)?;
        debug!(%aggregate_id, new_version, "appended events");
        Ok(new_version)
    }

    async fn current_version(&self, aggregate_id: Uuid) -> Result<i64, DomainError> {
        self.lock()?
            .get(&aggregate_id)
            .map_or(Ok(0), |stream| stream_len(stream))
    }
}
