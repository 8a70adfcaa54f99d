//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;

/// Trait for aggregate roots that reconstitute from event history.
///
/// Implementors hold their version counter and uncommitted-event buffer as
/// plain fields. An intent method validates against current state, builds an
/// event whose sequence number is `version() + 1`, passes it to [`apply`]
/// and buffers it. Replay goes through the same [`apply`], so the in-memory
/// state after an intent equals the state after reloading that event.
///
/// [`apply`]: AggregateRoot::apply
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the zero-state aggregate (version 0, nothing pending) that the
    /// first event in a stream is folded onto.
    fn empty(id: Uuid) -> Self
    where
        Self: Sized;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the current version (number of events applied).
    fn version(&self) -> i64;

    /// Folds one event into state and advances the version by one.
    ///
    /// Must be deterministic and depend only on the event and current state.
    fn apply(&mut self, event: &Self::Event);

    /// Checks that a replayed event can be folded into the current state,
    /// e.g. that every sub-entity it references exists. Intent methods
    /// validate before building their events; this catches stored history
    /// that would otherwise be folded into a half-applied state.
    ///
    /// # Errors
    ///
    /// Returns a description of the mismatch.
    fn check_apply(&self, _event: &Self::Event) -> Result<(), String> {
        Ok(())
    }

    /// Returns uncommitted events produced by intent methods.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self);

    /// The version the store must be at for the uncommitted events to be
    /// appended.
    #[allow(clippy::cast_possible_wrap)]
    fn expected_version(&self) -> i64 {
        self.version() - self.uncommitted_events().len() as i64
    }
}
