//! Query handlers for the Report context.
//!
//! Reports are reconstituted from their events on every query; there is no
//! separate read model.

use chronicle_core::aggregate::AggregateRoot;
use chronicle_core::application::Application;
use chronicle_core::error::DomainError;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{Report, Row};

/// Read-only view of a report aggregate.
#[derive(Debug, Serialize)]
pub struct ReportView {
    /// The report identifier.
    pub report_id: Uuid,
    /// The report name, if set.
    pub name: Option<String>,
    /// Rows in insertion order.
    pub rows: Vec<Row>,
    /// Current version (event count).
    pub version: i64,
}

impl From<&Report> for ReportView {
    fn from(report: &Report) -> Self {
        Self {
            report_id: report.aggregate_id(),
            name: report.name().map(str::to_owned),
            rows: report.rows().to_vec(),
            version: report.version(),
        }
    }
}

/// Retrieves a report by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
/// Returns `DomainError::CorruptHistory` if the stream cannot be replayed.
pub async fn get_report_by_id(
    report_id: Uuid,
    app: &Application,
) -> Result<ReportView, DomainError> {
    let report: Report = app.get(report_id).await?;
    Ok(ReportView::from(&report))
}
