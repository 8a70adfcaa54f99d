//! Chronicle: Report aggregate.
//!
//! A report is a list of rows, each optionally bound to a datasource, with
//! individual cells overridden by column. Its state only ever changes by
//! folding report events.

pub mod application;
pub mod domain;
