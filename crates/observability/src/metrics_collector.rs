use std::time::Duration;

use metrics::{counter, histogram};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOperation {
    Update,
    Delete,
}

impl BulkOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkOperation::Update => "update",
            BulkOperation::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOutcome {
    Applied,
    NotFound,
    Rejected,
    Failed,
}

impl BulkOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkOutcome::Applied => "applied",
            BulkOutcome::NotFound => "not_found",
            BulkOutcome::Rejected => "rejected",
            BulkOutcome::Failed => "failed",
        }
    }
}

pub fn record_bulk_operation(operation: BulkOperation, outcome: BulkOutcome, affected: u64) {
    counter!(
        "taskboard_bulk_operations_total",
        "operation" => operation.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    if affected > 0 {
        counter!(
            "taskboard_bulk_rows_affected_total",
            "operation" => operation.as_str()
        )
        .increment(affected);
    }
}

pub fn record_dashboard_query(query: &'static str, elapsed: Duration, success: bool) {
    histogram!(
        "taskboard_dashboard_query_duration_seconds",
        "query" => query,
        "success" => if success { "true" } else { "false" }
    )
    .record(elapsed.as_secs_f64());
}

/// 时钟偏差导致落在窗口外的活跃度行
pub fn record_activity_rows_dropped(rows: u64) {
    if rows > 0 {
        counter!("taskboard_activity_rows_dropped_total").increment(rows);
    }
}
