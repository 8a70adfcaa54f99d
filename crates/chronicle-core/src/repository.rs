//! Aggregate repository: rebuilds aggregates from their event streams and
//! persists their uncommitted events.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::aggregate::AggregateRoot;
use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::store::{EventStore, StoredEvent};

/// Loads and saves aggregates of type `A` through an [`EventStore`].
pub struct Repository<A> {
    store: Arc<dyn EventStore>,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A> Clone for Repository<A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _aggregate: PhantomData,
        }
    }
}

impl<A> std::fmt::Debug for Repository<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("aggregate", &std::any::type_name::<A>())
            .finish_non_exhaustive()
    }
}

impl<A: AggregateRoot> Repository<A> {
    /// Creates a repository over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            _aggregate: PhantomData,
        }
    }

    /// Rebuilds an aggregate by folding its full event stream onto the
    /// zero-state produced by `empty`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the stream is empty,
    /// `DomainError::CorruptHistory` if any event cannot be folded, or the
    /// store's error if loading fails.
    pub async fn load<F>(&self, aggregate_id: Uuid, empty: F) -> Result<A, DomainError>
    where
        F: FnOnce(Uuid) -> A,
    {
        let stored_events = self.store.load_events(aggregate_id).await?;
        if stored_events.is_empty() {
            return Err(DomainError::AggregateNotFound(aggregate_id));
        }
        let aggregate = reconstitute(empty(aggregate_id), &stored_events)?;
        debug!(
            %aggregate_id,
            version = aggregate.version(),
            "aggregate reconstituted"
        );
        Ok(aggregate)
    }

    /// Appends the aggregate's uncommitted events in one atomic batch and
    /// clears them. Returns the persisted version.
    ///
    /// Nothing is sent to the store when there is nothing pending. On
    /// failure the uncommitted events are left in place; after a
    /// `ConcurrencyConflict` the aggregate must be discarded and reloaded.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if another writer advanced
    /// the stream, or the store's error if appending fails.
    pub async fn save(&self, aggregate: &mut A) -> Result<i64, DomainError> {
        if aggregate.uncommitted_events().is_empty() {
            return Ok(aggregate.version());
        }
        let aggregate_id = aggregate.aggregate_id();
        let expected_version = aggregate.expected_version();
        let stored_events: Vec<StoredEvent> = aggregate
            .uncommitted_events()
            .iter()
            .map(DomainEvent::to_stored)
            .collect();

        match self
            .store
            .append_events(aggregate_id, expected_version, &stored_events)
            .await
        {
            Ok(new_version) => {
                aggregate.clear_uncommitted_events();
                debug!(%aggregate_id, new_version, "aggregate saved");
                Ok(new_version)
            }
            Err(err @ DomainError::ConcurrencyConflict { .. }) => {
                warn!(%aggregate_id, expected_version, error = %err, "save rejected");
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}

/// Folds stored events onto `aggregate` in order.
///
/// Every event must belong to the aggregate and carry the next version
/// number; anything else means the log and the model disagree.
///
/// # Errors
///
/// Returns `DomainError::CorruptHistory` for a foreign, out-of-order or
/// undecodable event.
pub fn reconstitute<A: AggregateRoot>(
    mut aggregate: A,
    stored_events: &[StoredEvent],
) -> Result<A, DomainError> {
    let aggregate_id = aggregate.aggregate_id();
    for stored in stored_events {
        if stored.aggregate_id != aggregate_id {
            return Err(DomainError::CorruptHistory {
                aggregate_id,
                sequence_number: stored.sequence_number,
                reason: format!("event belongs to aggregate {}", stored.aggregate_id),
            });
        }
        let next = aggregate.version() + 1;
        if stored.sequence_number != next {
            return Err(DomainError::CorruptHistory {
                aggregate_id,
                sequence_number: stored.sequence_number,
                reason: format!("expected sequence number {next}"),
            });
        }
        let event = A::Event::from_stored(stored)?;
        aggregate
            .check_apply(&event)
            .map_err(|reason| DomainError::CorruptHistory {
                aggregate_id,
                sequence_number: stored.sequence_number,
                reason,
            })?;
        aggregate.apply(&event);
    }
    Ok(aggregate)
}
