use std::str::FromStr;

use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub include_location: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!(
                "Invalid log format: {s}. Valid formats: json, pretty, compact"
            )),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            include_location: false,
        }
    }
}

pub struct StructuredLogger;

impl StructuredLogger {
    pub fn log_bulk_update(requested: usize, updated: u64) {
        info!(
            event = "bulk_update",
            bulk.requested = requested,
            bulk.affected = updated,
            bulk.skipped = (requested as u64).saturating_sub(updated),
            "Bulk update applied"
        );
    }

    pub fn log_bulk_delete(requested: usize, deleted: u64) {
        info!(
            event = "bulk_delete",
            bulk.requested = requested,
            bulk.affected = deleted,
            bulk.skipped = (requested as u64).saturating_sub(deleted),
            "Bulk delete applied"
        );
    }

    pub fn log_bulk_miss(operation: &str, requested: usize) {
        warn!(
            event = "bulk_miss",
            bulk.operation = operation,
            bulk.requested = requested,
            "Bulk operation matched no rows"
        );
    }

    pub fn log_dropped_group_key(field: &str, key: Option<&str>, count: i64) {
        warn!(
            event = "dropped_group_key",
            group.field = field,
            group.key = key.unwrap_or("<null>"),
            group.count = count,
            "Ignoring grouped count with unknown key"
        );
    }
}
