//! Application composition root.
//!
//! The [`Application`] owns the event store and clock handed to it at
//! construction and is the only boundary the rest of the system uses to
//! create, load and save aggregates. One `save` call is one unit of work:
//! it persists exactly the events accumulated since the aggregate was
//! created or loaded, in a single atomic append.

use std::sync::Arc;

use uuid::Uuid;

use crate::aggregate::AggregateRoot;
use crate::clock::Clock;
use crate::error::DomainError;
use crate::repository::Repository;
use crate::store::EventStore;

/// Owns the event store and exposes create/get/save.
#[derive(Clone)]
pub struct Application {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application").finish_non_exhaustive()
    }
}

impl Application {
    /// Creates an application over an explicitly provided store and clock.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The clock used to timestamp events.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Returns a repository for aggregates of type `A`.
    #[must_use]
    pub fn repository<A: AggregateRoot>(&self) -> Repository<A> {
        Repository::new(Arc::clone(&self.store))
    }

    /// Creates a fresh aggregate with a new identifier, version 0 and nothing
    /// pending. The store is not contacted.
    #[must_use]
    pub fn create<A: AggregateRoot>(&self) -> A {
        A::empty(Uuid::new_v4())
    }

    /// Loads an aggregate by replaying its stream.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` for an id with no events and
    /// `DomainError::CorruptHistory` if the stream cannot be folded.
    pub async fn get<A: AggregateRoot>(&self, aggregate_id: Uuid) -> Result<A, DomainError> {
        self.repository::<A>().load(aggregate_id, A::empty).await
    }

    /// Persists the aggregate's uncommitted events. Returns the new version.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if the stream moved since
    /// the aggregate was loaded.
    pub async fn save<A: AggregateRoot>(&self, aggregate: &mut A) -> Result<i64, DomainError> {
        self.repository::<A>().save(aggregate).await
    }

    /// Returns `true` if any event has been stored for `aggregate_id`.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the lookup fails.
    pub async fn contains(&self, aggregate_id: Uuid) -> Result<bool, DomainError> {
        Ok(self.store.current_version(aggregate_id).await? > 0)
    }
}
