pub mod metrics_collector;
pub mod structured_logger;
pub mod telemetry_setup;

pub use metrics_collector::{
    record_activity_rows_dropped, record_bulk_operation, record_dashboard_query, BulkOperation,
    BulkOutcome,
};
pub use structured_logger::{LogFormat, LoggingConfig, StructuredLogger};
pub use telemetry_setup::{init_metrics, init_structured_logging};
