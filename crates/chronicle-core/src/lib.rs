//! Chronicle Core: event-sourcing abstractions.
//!
//! Aggregates never store their state directly. State is derived by folding
//! an ordered, append-only log of domain events. This crate defines the
//! traits and types for that fold and for appending to the log with
//! optimistic concurrency. It contains no infrastructure code.

pub mod aggregate;
pub mod application;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod repository;
pub mod store;
