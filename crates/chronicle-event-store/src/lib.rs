//! Chronicle event store implementations.
//!
//! Both stores honour the `EventStore` contract from `chronicle-core`: the
//! expected-version check and the write are one atomic step.

pub mod memory_event_store;
pub mod pg_event_store;
pub mod schema;
