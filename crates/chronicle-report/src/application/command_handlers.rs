//! Command handlers for the Report context.
//!
//! Each handler is one unit of work: load the aggregate, execute the intent,
//! persist the resulting events with a single `Application::save`.

use chronicle_core::aggregate::AggregateRoot;
use chronicle_core::application::Application;
use chronicle_core::command::Command;
use chronicle_core::error::DomainError;
use chronicle_core::event::DomainEvent;
use chronicle_core::store::StoredEvent;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::aggregates::Report;
use crate::domain::commands::{AddRow, CreateReport, OverrideValue, RenameReport};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct ReportCommandResult {
    /// The aggregate ID affected by the command.
    pub aggregate_id: Uuid,
    /// The version after the events were persisted.
    pub version: i64,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

async fn persist(
    app: &Application,
    command: &dyn Command,
    mut report: Report,
) -> Result<ReportCommandResult, DomainError> {
    let stored_events: Vec<StoredEvent> = report
        .uncommitted_events()
        .iter()
        .map(DomainEvent::to_stored)
        .collect();
    let version = app.save(&mut report).await?;
    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        version,
        events = stored_events.len(),
        "command handled"
    );
    Ok(ReportCommandResult {
        aggregate_id: report.aggregate_id(),
        version,
        stored_events,
    })
}

/// Handles the `CreateReport` command: starts a report at version 0, names
/// it and persists the event.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank name and
/// `DomainError::ConcurrencyConflict` if the id is already taken.
#[instrument(skip(command, app), fields(report_id = %command.report_id))]
pub async fn handle_create_report(
    command: &CreateReport,
    app: &Application,
) -> Result<ReportCommandResult, DomainError> {
    let mut report = Report::new(command.report_id);
    report.rename(&command.name, command.correlation_id, app.clock())?;
    persist(app, command, report).await
}

/// Handles the `RenameReport` command.
///
/// # Errors
///
/// Returns `DomainError` if loading, validation or appending fails.
#[instrument(skip(command, app), fields(report_id = %command.report_id))]
pub async fn handle_rename_report(
    command: &RenameReport,
    app: &Application,
) -> Result<ReportCommandResult, DomainError> {
    let mut report: Report = app.get(command.report_id).await?;
    report.rename(&command.name, command.correlation_id, app.clock())?;
    persist(app, command, report).await
}

/// Handles the `AddRow` command.
///
/// # Errors
///
/// Returns `DomainError` if loading or appending fails.
#[instrument(skip(command, app), fields(report_id = %command.report_id))]
pub async fn handle_add_row(
    command: &AddRow,
    app: &Application,
) -> Result<ReportCommandResult, DomainError> {
    let mut report: Report = app.get(command.report_id).await?;
    report.add_row(command.datasource_id, command.correlation_id, app.clock());
    persist(app, command, report).await
}

/// Handles the `OverrideValue` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the row does not exist, or
/// `DomainError` if loading or appending fails.
#[instrument(skip(command, app), fields(report_id = %command.report_id, row_id = %command.row_id))]
pub async fn handle_override_value(
    command: &OverrideValue,
    app: &Application,
) -> Result<ReportCommandResult, DomainError> {
    let mut report: Report = app.get(command.report_id).await?;
    report.override_value(
        command.row_id,
        command.column,
        &command.value,
        command.correlation_id,
        app.clock(),
    )?;
    persist(app, command, report).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use chronicle_core::application::Application;
    use chronicle_core::error::DomainError;
    use chronicle_core::store::EventStore;
    use chronicle_event_store::memory_event_store::InMemoryEventStore;
    use chronicle_test_support::{
        ConflictingEventStore, EmptyEventStore, FailingEventStore, FixedClock,
        RecordingEventStore,
    };
    use uuid::Uuid;

    use super::*;
    use crate::domain::events::{ROW_ADDED_EVENT_TYPE, VALUE_OVERRIDDEN_EVENT_TYPE};

    fn app_with(store: Arc<dyn EventStore>) -> Application {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        Application::new(store, Arc::new(clock))
    }

    async fn created_report(app: &Application) -> Uuid {
        let report_id = Uuid::new_v4();
        handle_create_report(
            &CreateReport {
                correlation_id: Uuid::new_v4(),
                report_id,
                name: "my report".to_owned(),
            },
            app,
        )
        .await
        .unwrap();
        report_id
    }

    #[tokio::test]
    async fn test_handle_create_report_appends_at_version_zero() {
        // Arrange
        let store = Arc::new(RecordingEventStore::new());
        let app = app_with(store.clone());
        let report_id = Uuid::new_v4();

        // Act
        let result = handle_create_report(
            &CreateReport {
                correlation_id: Uuid::new_v4(),
                report_id,
                name: "my report".to_owned(),
            },
            &app,
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(result.aggregate_id, report_id);
        assert_eq!(result.version, 1);
        let appended = store.appended_events();
        assert_eq!(appended.len(), 1);
        let (agg_id, expected_version, events) = &appended[0];
        assert_eq!(*agg_id, report_id);
        assert_eq!(*expected_version, 0);
        assert_eq!(events, &result.stored_events);
    }

    #[tokio::test]
    async fn test_handle_create_report_twice_conflicts() {
        let app = app_with(Arc::new(InMemoryEventStore::new()));
        let report_id = created_report(&app).await;

        let result = handle_create_report(
            &CreateReport {
                correlation_id: Uuid::new_v4(),
                report_id,
                name: "again".to_owned(),
            },
            &app,
        )
        .await;

        assert!(matches!(
            result,
            Err(DomainError::ConcurrencyConflict {
                expected: 0,
                actual: 1,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_handle_add_row_returns_not_found_for_unknown_report() {
        let app = app_with(Arc::new(EmptyEventStore));
        let report_id = Uuid::new_v4();

        let result = handle_add_row(
            &AddRow {
                correlation_id: Uuid::new_v4(),
                report_id,
                datasource_id: None,
            },
            &app,
        )
        .await;

        match result {
            Err(DomainError::AggregateNotFound(id)) => assert_eq!(id, report_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_add_row_then_override_value() {
        // Arrange
        let store = Arc::new(InMemoryEventStore::new());
        let app = app_with(store.clone());
        let report_id = created_report(&app).await;

        // Act
        let added = handle_add_row(
            &AddRow {
                correlation_id: Uuid::new_v4(),
                report_id,
                datasource_id: Some(Uuid::new_v4()),
            },
            &app,
        )
        .await
        .unwrap();
        let row_id = app.get::<Report>(report_id).await.unwrap().rows()[0].id;
        let overridden = handle_override_value(
            &OverrideValue {
                correlation_id: Uuid::new_v4(),
                report_id,
                row_id,
                column: 3,
                value: "1500".to_owned(),
            },
            &app,
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(added.version, 2);
        assert_eq!(added.stored_events[0].event_type, ROW_ADDED_EVENT_TYPE);
        assert_eq!(overridden.version, 3);
        assert_eq!(
            overridden.stored_events[0].event_type,
            VALUE_OVERRIDDEN_EVENT_TYPE
        );
        assert_eq!(store.current_version(report_id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_handle_override_value_on_unknown_row_persists_nothing() {
        let store = Arc::new(InMemoryEventStore::new());
        let app = app_with(store.clone());
        let report_id = created_report(&app).await;

        let result = handle_override_value(
            &OverrideValue {
                correlation_id: Uuid::new_v4(),
                report_id,
                row_id: Uuid::new_v4(),
                column: 3,
                value: "1500".to_owned(),
            },
            &app,
        )
        .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(store.current_version(report_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_handle_rename_report_propagates_conflict() {
        // Arrange
        let report_id = Uuid::new_v4();
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        let mut existing = Report::new(report_id);
        existing.rename("q1", Uuid::new_v4(), &clock).unwrap();
        let history: Vec<StoredEvent> = existing
            .uncommitted_events()
            .iter()
            .map(DomainEvent::to_stored)
            .collect();
        let app = app_with(Arc::new(ConflictingEventStore::new(history)));

        // Act
        let result = handle_rename_report(
            &RenameReport {
                correlation_id: Uuid::new_v4(),
                report_id,
                name: "q2".to_owned(),
            },
            &app,
        )
        .await;

        // Assert
        match result {
            Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual,
            }) => {
                assert_eq!(aggregate_id, report_id);
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("expected ConcurrencyConflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_rename_report_propagates_infrastructure_error() {
        let app = app_with(Arc::new(FailingEventStore));

        let result = handle_rename_report(
            &RenameReport {
                correlation_id: Uuid::new_v4(),
                report_id: Uuid::new_v4(),
                name: "q2".to_owned(),
            },
            &app,
        )
        .await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
