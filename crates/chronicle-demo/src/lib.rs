//! Chronicle demo: wiring for the report scenario.

pub mod config;
pub mod error;
pub mod scenario;
