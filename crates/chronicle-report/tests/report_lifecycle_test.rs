//! End-to-end report lifecycle against the in-memory event store.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use chronicle_core::aggregate::AggregateRoot;
use chronicle_core::application::Application;
use chronicle_core::error::DomainError;
use chronicle_core::event::DomainEvent;
use chronicle_core::store::{EventStore, StoredEvent};
use chronicle_event_store::memory_event_store::InMemoryEventStore;
use chronicle_report::domain::aggregates::Report;
use chronicle_test_support::FixedClock;
use uuid::Uuid;

fn setup() -> (Arc<InMemoryEventStore>, Application) {
    let store = Arc::new(InMemoryEventStore::new());
    let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
    let app = Application::new(store.clone(), Arc::new(clock));
    (store, app)
}

#[tokio::test]
async fn test_create_add_row_override_and_reload() {
    let (store, app) = setup();

    // create: version 0, nothing pending
    let mut report: Report = app.create();
    assert_eq!(report.version(), 0);
    assert!(report.uncommitted_events().is_empty());

    // add-row: applied locally, one pending
    let row_id = report.add_row(Some(Uuid::new_v4()), Uuid::new_v4(), app.clock());
    assert_eq!(report.version(), 1);
    assert_eq!(report.uncommitted_events().len(), 1);
    assert_eq!(report.rows().len(), 1);

    // save: one stored event
    assert_eq!(app.save(&mut report).await.unwrap(), 1);
    assert!(report.uncommitted_events().is_empty());
    assert_eq!(store.current_version(report.id).await.unwrap(), 1);

    // override: applied locally, one pending
    report
        .override_value(row_id, 3, "1500", Uuid::new_v4(), app.clock())
        .unwrap();
    assert_eq!(report.version(), 2);
    assert_eq!(report.uncommitted_events().len(), 1);
    assert_eq!(
        report.row(row_id).unwrap().overrides.get(&3).map(String::as_str),
        Some("1500")
    );

    // save: two stored events
    assert_eq!(app.save(&mut report).await.unwrap(), 2);
    assert_eq!(store.load_events(report.id).await.unwrap().len(), 2);

    // fresh load reproduces the same state
    let reloaded: Report = app.get(report.id).await.unwrap();
    assert_eq!(reloaded.version(), 2);
    assert_eq!(reloaded.rows(), report.rows());
    assert!(app.contains(report.id).await.unwrap());
}

#[tokio::test]
async fn test_loading_twice_yields_equal_state() {
    let (_store, app) = setup();
    let mut report: Report = app.create();
    let row_id = report.add_row(None, Uuid::new_v4(), app.clock());
    report
        .override_value(row_id, 0, "a", Uuid::new_v4(), app.clock())
        .unwrap();
    report.add_row(None, Uuid::new_v4(), app.clock());
    app.save(&mut report).await.unwrap();

    let first: Report = app.get(report.id).await.unwrap();
    let second: Report = app.get(report.id).await.unwrap();

    assert_eq!(first.version(), second.version());
    assert_eq!(first.rows(), second.rows());
    assert_eq!(first.name(), second.name());
}

#[tokio::test]
async fn test_get_unknown_report_is_not_found() {
    let (_store, app) = setup();
    let id = Uuid::new_v4();

    let result = app.get::<Report>(id).await;

    match result {
        Err(DomainError::AggregateNotFound(missing)) => assert_eq!(missing, id),
        other => panic!("expected AggregateNotFound, got {other:?}"),
    }
    assert!(!app.contains(id).await.unwrap());
}

#[tokio::test]
async fn test_stale_expected_version_is_conflict_and_store_unchanged() {
    let (store, app) = setup();
    let mut report: Report = app.create();
    report.add_row(None, Uuid::new_v4(), app.clock());
    app.save(&mut report).await.unwrap();

    let mut fresh = Report::new(report.id);
    fresh.add_row(None, Uuid::new_v4(), app.clock());
    let stale: Vec<StoredEvent> = fresh
        .uncommitted_events()
        .iter()
        .map(DomainEvent::to_stored)
        .collect();
    let result = store.append_events(report.id, 0, &stale).await;

    assert!(matches!(
        result,
        Err(DomainError::ConcurrencyConflict {
            expected: 0,
            actual: 1,
            ..
        })
    ));
    assert_eq!(store.event_count().unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_saves_from_same_version_exactly_one_wins() {
    // Arrange
    let (store, app) = setup();
    let mut report: Report = app.create();
    let row_id = report.add_row(None, Uuid::new_v4(), app.clock());
    app.save(&mut report).await.unwrap();

    let mut writer_a: Report = app.get(report.id).await.unwrap();
    let mut writer_b: Report = app.get(report.id).await.unwrap();
    writer_a
        .override_value(row_id, 1, "a", Uuid::new_v4(), app.clock())
        .unwrap();
    writer_b
        .override_value(row_id, 1, "b", Uuid::new_v4(), app.clock())
        .unwrap();

    // Act
    let app_a = app.clone();
    let app_b = app.clone();
    let task_a = tokio::spawn(async move {
        let outcome = app_a.save(&mut writer_a).await;
        (outcome, writer_a)
    });
    let task_b = tokio::spawn(async move {
        let outcome = app_b.save(&mut writer_b).await;
        (outcome, writer_b)
    });
    let (outcome_a, writer_a) = task_a.await.unwrap();
    let (outcome_b, writer_b) = task_b.await.unwrap();

    // Assert
    let (winner, loser) = match (&outcome_a, &outcome_b) {
        (Ok(_), Err(_)) => (writer_a, writer_b),
        (Err(_), Ok(_)) => (writer_b, writer_a),
        other => panic!("expected exactly one winner, got {other:?}"),
    };
    let conflict = outcome_a.err().or(outcome_b.err());
    assert!(matches!(
        conflict,
        Some(DomainError::ConcurrencyConflict { .. })
    ));
    assert_eq!(store.current_version(report.id).await.unwrap(), 2);
    assert!(winner.uncommitted_events().is_empty());
    assert_eq!(loser.uncommitted_events().len(), 1);

    let reloaded: Report = app.get(report.id).await.unwrap();
    assert_eq!(reloaded.rows(), winner.rows());
}

#[tokio::test]
async fn test_rejected_intent_leaves_pending_and_state_identical() {
    let (_store, app) = setup();
    let mut report: Report = app.create();
    report.add_row(None, Uuid::new_v4(), app.clock());
    let pending_before: Vec<StoredEvent> = report
        .uncommitted_events()
        .iter()
        .map(DomainEvent::to_stored)
        .collect();
    let rows_before = report.rows().to_vec();

    let result = report.override_value(Uuid::new_v4(), 3, "1500", Uuid::new_v4(), app.clock());

    assert!(matches!(result, Err(DomainError::Validation(_))));
    let pending_after: Vec<StoredEvent> = report
        .uncommitted_events()
        .iter()
        .map(DomainEvent::to_stored)
        .collect();
    assert_eq!(pending_after, pending_before);
    assert_eq!(report.rows(), rows_before.as_slice());
    assert_eq!(report.version(), 1);
}
