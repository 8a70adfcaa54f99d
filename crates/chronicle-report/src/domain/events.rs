//! Domain events for the Report aggregate.

use std::collections::BTreeMap;

use chronicle_core::error::DomainError;
use chronicle_core::event::{DomainEvent, EventMetadata, decode_payload, unknown_event_type};
use chronicle_core::store::StoredEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type tag for [`ReportRenamed`].
pub const REPORT_RENAMED_EVENT_TYPE: &str = "report.renamed";
/// Event type tag for [`RowAdded`].
pub const ROW_ADDED_EVENT_TYPE: &str = "report.row_added";
/// Event type tag for [`ValueOverridden`].
pub const VALUE_OVERRIDDEN_EVENT_TYPE: &str = "report.value_overridden";

/// Zero-based column index within a row.
pub type Column = u32;

/// Emitted when a report is given a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRenamed {
    /// The report identifier.
    pub report_id: Uuid,
    /// The new name.
    pub name: String,
}

/// Emitted when a row is appended to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowAdded {
    /// The report identifier.
    pub report_id: Uuid,
    /// Generated row identifier.
    pub row_id: Uuid,
    /// Datasource the row draws from, if any.
    pub datasource_id: Option<Uuid>,
    /// Overrides the row starts with.
    #[serde(default)]
    pub overrides: BTreeMap<Column, String>,
}

/// Emitted when a single cell of a row is overridden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueOverridden {
    /// The report identifier.
    pub report_id: Uuid,
    /// The row being overridden.
    pub row_id: Uuid,
    /// The overridden column.
    pub column: Column,
    /// The override, kept in its string form.
    pub value: String,
}

/// Event payload variants for the Report aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEventKind {
    /// The report has been named.
    ReportRenamed(ReportRenamed),
    /// A row has been added.
    RowAdded(RowAdded),
    /// A cell has been overridden.
    ValueOverridden(ValueOverridden),
}

/// Domain event envelope for the Report aggregate.
#[derive(Debug, Clone)]
pub struct ReportEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: ReportEventKind,
}

impl ReportEventKind {
    /// The type tag stored alongside the payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ReportRenamed(_) => REPORT_RENAMED_EVENT_TYPE,
            Self::RowAdded(_) => ROW_ADDED_EVENT_TYPE,
            Self::ValueOverridden(_) => VALUE_OVERRIDDEN_EVENT_TYPE,
        }
    }
}

impl DomainEvent for ReportEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        let value = match &self.kind {
            ReportEventKind::ReportRenamed(payload) => serde_json::to_value(payload),
            ReportEventKind::RowAdded(payload) => serde_json::to_value(payload),
            ReportEventKind::ValueOverridden(payload) => serde_json::to_value(payload),
        };
        // Serialization of derived Serialize structs to Value is infallible.
        value.expect("ReportEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn from_stored(stored: &StoredEvent) -> Result<Self, DomainError> {
        let kind = match stored.event_type.as_str() {
            REPORT_RENAMED_EVENT_TYPE => ReportEventKind::ReportRenamed(decode_payload(stored)?),
            ROW_ADDED_EVENT_TYPE => ReportEventKind::RowAdded(decode_payload(stored)?),
            VALUE_OVERRIDDEN_EVENT_TYPE => {
                ReportEventKind::ValueOverridden(decode_payload(stored)?)
            }
            _ => return Err(unknown_event_type(stored)),
        };
        Ok(Self {
            metadata: EventMetadata::from_stored(stored),
            kind,
        })
    }
}
