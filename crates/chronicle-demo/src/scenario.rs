//! The report scenario: build a report, override one cell, persist, and
//! check that a fresh replay yields the same report.

use chronicle_core::aggregate::AggregateRoot;
use chronicle_core::application::Application;
use chronicle_report::application::query_handlers::ReportView;
use chronicle_report::domain::aggregates::Report;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;

/// Datasource the demo row is bound to.
pub const DEMO_DATASOURCE_ID: Uuid = Uuid::from_u128(0xe1b2_b779_192f_40a4_9dc1_4634_8e40_fc95);

/// Runs the scenario and returns a view of the reloaded report.
///
/// # Errors
///
/// Returns `AppError::Domain` if any intent or save fails and
/// `AppError::ReplayMismatch` if the reloaded report differs from the saved
/// one.
pub async fn run(app: &Application) -> Result<ReportView, AppError> {
    let correlation_id = Uuid::new_v4();

    let mut report: Report = app.create();
    let row_id = report.add_row(Some(DEMO_DATASOURCE_ID), correlation_id, app.clock());
    app.save(&mut report).await?;
    info!(report_id = %report.id, %row_id, version = report.version(), "row added");

    report.override_value(row_id, 3, "1500", correlation_id, app.clock())?;
    report.rename("my report", correlation_id, app.clock())?;
    app.save(&mut report).await?;
    info!(report_id = %report.id, version = report.version(), "value overridden");

    if !app.contains(report.id).await? {
        return Err(AppError::ReplayMismatch(format!(
            "report {} missing from store after save",
            report.id
        )));
    }

    let reloaded: Report = app.get(report.id).await?;
    if reloaded.version() != report.version()
        || reloaded.rows() != report.rows()
        || reloaded.name() != report.name()
    {
        return Err(AppError::ReplayMismatch(format!(
            "report {} differs after reload",
            report.id
        )));
    }
    Ok(ReportView::from(&reloaded))
}
