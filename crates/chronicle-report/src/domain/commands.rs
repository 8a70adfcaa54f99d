//! Commands for the Report context.

use chronicle_core::command::Command;
use uuid::Uuid;

use super::events::Column;

/// Command to start a new report under a caller-chosen id.
#[derive(Debug, Clone)]
pub struct CreateReport {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The identifier the new report will have.
    pub report_id: Uuid,
    /// The report's name.
    pub name: String,
}

impl Command for CreateReport {
    fn command_type(&self) -> &'static str {
        "report.create"
    }

    fn aggregate_id(&self) -> Uuid {
        self.report_id
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to rename an existing report.
#[derive(Debug, Clone)]
pub struct RenameReport {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The report identifier.
    pub report_id: Uuid,
    /// The new name.
    pub name: String,
}

impl Command for RenameReport {
    fn command_type(&self) -> &'static str {
        "report.rename"
    }

    fn aggregate_id(&self) -> Uuid {
        self.report_id
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to add a row to a report.
#[derive(Debug, Clone)]
pub struct AddRow {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The report identifier.
    pub report_id: Uuid,
    /// Datasource the row draws from, if any.
    pub datasource_id: Option<Uuid>,
}

impl Command for AddRow {
    fn command_type(&self) -> &'static str {
        "report.add_row"
    }

    fn aggregate_id(&self) -> Uuid {
        self.report_id
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to override one cell of a row.
#[derive(Debug, Clone)]
pub struct OverrideValue {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The report identifier.
    pub report_id: Uuid,
    /// The row to override.
    pub row_id: Uuid,
    /// The column to override.
    pub column: Column,
    /// The override value.
    pub value: String,
}

impl Command for OverrideValue {
    fn command_type(&self) -> &'static str {
        "report.override_value"
    }

    fn aggregate_id(&self) -> Uuid {
        self.report_id
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
