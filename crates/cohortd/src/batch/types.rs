//! Batch report types.
//!
//! Per-table outcomes are tagged enums rather than status strings so a
//! caller cannot forget to handle a variant.

use serde::Serialize;

/// Outcome of provisioning one cohort table.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableProvisionOutcome {
    /// The table was processed; counts cover this run only
    Provisioned {
        sessions_found: u32,
        meetings_created: u32,
        students_in_cohort: u32,
    },
    /// The table exists but lacks the expected columns
    SchemaNotReady,
    /// No sessions fell inside the look-ahead window
    NoSessions,
    /// The table-level query failed
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct TableProvisionReport {
    pub table: String,
    #[serde(flatten)]
    pub outcome: TableProvisionOutcome,
}

/// Reconciliation summary for one table. Only emitted for tables where at
/// least one recording was actually fetched.
#[derive(Debug, Clone, Serialize)]
pub struct TableReconcileReport {
    pub table: String,
    pub recordings_fetched: u32,
}

/// Aggregate result of one batch run, returned as the trigger endpoint's
/// JSON body. Operational visibility only.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: String,
    pub provisioning: Vec<TableProvisionReport>,
    pub reconciliation: Vec<TableReconcileReport>,
    pub total_recordings_fetched: u32,
}
