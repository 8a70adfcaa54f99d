//! Aggregate root for the Report context.

use std::collections::BTreeMap;

use chronicle_core::aggregate::AggregateRoot;
use chronicle_core::clock::Clock;
use chronicle_core::error::DomainError;
use chronicle_core::event::EventMetadata;
use serde::Serialize;
use uuid::Uuid;

use super::events::{
    Column, ReportEvent, ReportEventKind, ReportRenamed, RowAdded, ValueOverridden,
};

/// One row of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// Row identifier, generated when the row is added.
    pub id: Uuid,
    /// Datasource the row draws from, if any.
    pub datasource_id: Option<Uuid>,
    /// Per-column overrides, in column order.
    pub overrides: BTreeMap<Column, String>,
}

/// The aggregate root for a report.
#[derive(Debug)]
pub struct Report {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (events applied, including uncommitted ones).
    pub(crate) version: i64,
    /// Display name, once set.
    name: Option<String>,
    /// Rows in insertion order.
    rows: Vec<Row>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<ReportEvent>,
}

impl Report {
    /// Creates an empty report at version 0.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            name: None,
            rows: Vec::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// The report's name, if one has been set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Rows in the order they were added.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Looks up a row by id.
    #[must_use]
    pub fn row(&self, row_id: Uuid) -> Option<&Row> {
        self.rows.iter().find(|row| row.id == row_id)
    }

    /// Renames the report, producing a `ReportRenamed` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `name` is blank.
    pub fn rename(
        &mut self,
        name: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation(format!(
                "report {} name must not be blank",
                self.id
            )));
        }
        self.trigger(
            ReportEventKind::ReportRenamed(ReportRenamed {
                report_id: self.id,
                name: name.to_owned(),
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Adds a row, producing a `RowAdded` event. Returns the new row's id.
    pub fn add_row(
        &mut self,
        datasource_id: Option<Uuid>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Uuid {
        let row_id = Uuid::new_v4();
        self.trigger(
            ReportEventKind::RowAdded(RowAdded {
                report_id: self.id,
                row_id,
                datasource_id,
                overrides: BTreeMap::new(),
            }),
            correlation_id,
            clock,
        );
        row_id
    }

    /// Overrides one cell of an existing row, producing a `ValueOverridden`
    /// event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the row does not exist.
    pub fn override_value(
        &mut self,
        row_id: Uuid,
        column: Column,
        value: impl ToString,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.row(row_id).is_none() {
            return Err(DomainError::Validation(format!(
                "row {row_id} not found in report {}",
                self.id
            )));
        }
        self.trigger(
            ReportEventKind::ValueOverridden(ValueOverridden {
                report_id: self.id,
                row_id,
                column,
                value: value.to_string(),
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Wraps `kind` in an event at the next version, folds it into state and
    /// buffers it. Callers validate first.
    fn trigger(&mut self, kind: ReportEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        // TODO: event_id uses Uuid::new_v4(); inject an id generator so tests
        // can assert on whole events instead of field by field.
        let event = ReportEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id,
                sequence_number: self.version + 1,
                correlation_id,
                causation_id: correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        };
        self.apply(&event);
        self.uncommitted_events.push(event);
    }
}

impl AggregateRoot for Report {
    type Event = ReportEvent;

    fn empty(id: Uuid) -> Self {
        Self::new(id)
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    /// Callers must run [`AggregateRoot::check_apply`] first; an override for
    /// a missing row would otherwise be dropped while the version advances.
    fn apply(&mut self, event: &Self::Event) {
        debug_assert!(
            self.check_apply(event).is_ok(),
            "apply called with an event that does not fold onto this report"
        );
        match &event.kind {
            ReportEventKind::ReportRenamed(payload) => {
                self.name = Some(payload.name.clone());
            }
            ReportEventKind::RowAdded(payload) => {
                self.rows.push(Row {
                    id: payload.row_id,
                    datasource_id: payload.datasource_id,
                    overrides: payload.overrides.clone(),
                });
            }
            ReportEventKind::ValueOverridden(payload) => {
                if let Some(row) = self.rows.iter_mut().find(|row| row.id == payload.row_id) {
                    row.overrides.insert(payload.column, payload.value.clone());
                }
            }
        }
        self.version += 1;
    }

    fn check_apply(&self, event: &Self::Event) -> Result<(), String> {
        match &event.kind {
            ReportEventKind::ValueOverridden(payload) if self.row(payload.row_id).is_none() => {
                Err(format!("override references unknown row {}", payload.row_id))
            }
            ReportEventKind::RowAdded(payload) if self.row(payload.row_id).is_some() => {
                Err(format!("row {} added twice", payload.row_id))
            }
            _ => Ok(()),
        }
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
