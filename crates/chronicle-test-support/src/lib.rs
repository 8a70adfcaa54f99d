//! Shared test doubles for Chronicle.

mod clock;
mod store;

pub use clock::FixedClock;
pub use store::{ConflictingEventStore, EmptyEventStore, FailingEventStore, RecordingEventStore};
