//! 仓储操作的错误上下文
//!
//! 数据库错误在转换为 `TaskboardError` 之前带上操作类型和实体描述并记录日志。

use std::fmt;

use chrono::{DateTime, Utc};
use sqlx::Error as SqlxError;
use taskboard_errors::TaskboardError;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryOperation {
    Create,
    Read,
    Update,
    Delete,
    Query,
    BatchUpdate,
    BatchDelete,
    Migrate,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryOperation::Create => write!(f, "创建"),
            RepositoryOperation::Read => write!(f, "查询"),
            RepositoryOperation::Update => write!(f, "更新"),
            RepositoryOperation::Delete => write!(f, "删除"),
            RepositoryOperation::Query => write!(f, "统计"),
            RepositoryOperation::BatchUpdate => write!(f, "批量更新"),
            RepositoryOperation::BatchDelete => write!(f, "批量删除"),
            RepositoryOperation::Migrate => write!(f, "迁移"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskOperationContext {
    pub operation: RepositoryOperation,
    pub task_id: Option<i64>,
    pub task_count: Option<usize>,
    pub timestamp: DateTime<Utc>,
    pub additional_info: Option<String>,
}

impl TaskOperationContext {
    pub fn new(operation: RepositoryOperation) -> Self {
        Self {
            operation,
            task_id: None,
            task_count: None,
            timestamp: Utc::now(),
            additional_info: None,
        }
    }

    pub fn with_task_id(mut self, task_id: i64) -> Self {
        self.task_id = Some(task_id);
        self
    }

    pub fn with_task_count(mut self, count: usize) -> Self {
        self.task_count = Some(count);
        self
    }

    pub fn with_additional_info(mut self, info: String) -> Self {
        self.additional_info = Some(info);
        self
    }

    pub fn entity_description(&self) -> String {
        match (self.task_id, self.task_count) {
            (Some(id), _) => format!("任务 (ID: {id})"),
            (None, Some(count)) => format!("{count} 个任务"),
            (None, None) => "任务".to_string(),
        }
    }
}

pub struct RepositoryErrorHelpers;

impl RepositoryErrorHelpers {
    #[instrument(skip_all, fields(
        operation = %context.operation,
        task_id = ?context.task_id,
        timestamp = %context.timestamp,
    ))]
    pub fn task_database_error(context: TaskOperationContext, error: SqlxError) -> TaskboardError {
        let entity_desc = context.entity_description();
        let operation_desc = context.operation.to_string();

        let error_msg = match &error {
            SqlxError::Database(db_error) => match db_error.constraint() {
                Some(constraint) => format!(
                    "{operation_desc}{entity_desc}时违反约束 {constraint}: {db_error}"
                ),
                None => format!("{operation_desc}{entity_desc}时发生数据库错误: {db_error}"),
            },
            SqlxError::PoolClosed => format!("{operation_desc}{entity_desc}时连接池已关闭"),
            SqlxError::PoolTimedOut => format!("{operation_desc}{entity_desc}时获取连接超时"),
            SqlxError::Io(io_error) => {
                format!("{operation_desc}{entity_desc}时发生IO错误: {io_error}")
            }
            other => format!("{operation_desc}{entity_desc}时发生数据库错误: {other}"),
        };

        match &context.additional_info {
            Some(info) => error!(error = %error, info = %info, "{}", error_msg),
            None => error!(error = %error, "{}", error_msg),
        }
        TaskboardError::store_unavailable(error_msg)
    }

    pub fn log_operation_success(context: TaskOperationContext, additional_info: Option<&str>) {
        let base_msg = format!(
            "{}{}成功",
            context.operation,
            context.entity_description()
        );
        match additional_info {
            Some(info) => info!("{}: {}", base_msg, info),
            None => info!("{}", base_msg),
        }
    }
}

#[macro_export]
macro_rules! task_context {
    ($operation:expr) => {
        $crate::error_handling::TaskOperationContext::new($operation)
    };
    ($operation:expr, task_id = $task_id:expr) => {
        $crate::error_handling::TaskOperationContext::new($operation).with_task_id($task_id)
    };
    ($operation:expr, task_count = $count:expr) => {
        $crate::error_handling::TaskOperationContext::new($operation).with_task_count($count)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_description() {
        assert_eq!(
            task_context!(RepositoryOperation::Read, task_id = 7).entity_description(),
            "任务 (ID: 7)"
        );
        assert_eq!(
            task_context!(RepositoryOperation::BatchDelete, task_count = 3).entity_description(),
            "3 个任务"
        );
        assert_eq!(
            task_context!(RepositoryOperation::Query).entity_description(),
            "任务"
        );
    }

    #[test]
    fn test_database_error_maps_to_store_unavailable() {
        let context = task_context!(RepositoryOperation::BatchUpdate, task_count = 2);
        let err = RepositoryErrorHelpers::task_database_error(context, SqlxError::PoolTimedOut);

        match err {
            TaskboardError::StoreUnavailable(msg) => {
                assert!(msg.contains("批量更新"));
                assert!(msg.contains("超时"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
