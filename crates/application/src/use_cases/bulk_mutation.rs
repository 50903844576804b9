use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use taskboard_domain::entities::TaskPatch;
use taskboard_domain::repositories::TaskMutationGateway;
use taskboard_errors::{TaskboardError, TaskboardResult};
use taskboard_observability::{
    record_bulk_operation, BulkOperation, BulkOutcome, StructuredLogger,
};

use crate::clock::Clock;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateResult {
    pub success: bool,
    pub updated_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResult {
    pub success: bool,
    pub deleted_count: u64,
}

/// 批量变更协调器
///
/// 参数校验失败时不会触达存储；通过校验后只发出一条存储语句，
/// 不存在的 id 被静默跳过，全部未命中时返回 `NotFound`。
pub struct BulkMutationCoordinator {
    gateway: Arc<dyn TaskMutationGateway>,
    clock: Arc<dyn Clock>,
}

impl BulkMutationCoordinator {
    pub fn new(gateway: Arc<dyn TaskMutationGateway>, clock: Arc<dyn Clock>) -> Self {
        Self { gateway, clock }
    }

    #[instrument(skip(self, patch), fields(ids = ids.len()))]
    pub async fn bulk_update(
        &self,
        ids: &[i64],
        patch: &TaskPatch,
    ) -> TaskboardResult<BulkUpdateResult> {
        let ids = match normalize_ids(ids) {
            Ok(ids) => ids,
            Err(e) => {
                record_bulk_operation(BulkOperation::Update, BulkOutcome::Rejected, 0);
                return Err(e);
            }
        };
        if patch.is_empty() {
            record_bulk_operation(BulkOperation::Update, BulkOutcome::Rejected, 0);
            return Err(TaskboardError::invalid_argument("更新内容不能为空"));
        }

        let updated = self
            .gateway
            .update_where(&ids, patch, self.clock.now())
            .await
            .inspect_err(|e| {
                error!("批量更新失败: {}", e);
                record_bulk_operation(BulkOperation::Update, BulkOutcome::Failed, 0);
            })?;

        if updated == 0 {
            StructuredLogger::log_bulk_miss(BulkOperation::Update.as_str(), ids.len());
            record_bulk_operation(BulkOperation::Update, BulkOutcome::NotFound, 0);
            return Err(TaskboardError::not_found("没有找到需要更新的任务"));
        }

        StructuredLogger::log_bulk_update(ids.len(), updated);
        record_bulk_operation(BulkOperation::Update, BulkOutcome::Applied, updated);

        Ok(BulkUpdateResult {
            success: true,
            updated_count: updated,
        })
    }

    #[instrument(skip(self), fields(ids = ids.len()))]
    pub async fn bulk_delete(&self, ids: &[i64]) -> TaskboardResult<BulkDeleteResult> {
        let ids = match normalize_ids(ids) {
            Ok(ids) => ids,
            Err(e) => {
                record_bulk_operation(BulkOperation::Delete, BulkOutcome::Rejected, 0);
                return Err(e);
            }
        };

        let deleted = self.gateway.delete_where(&ids).await.inspect_err(|e| {
            error!("批量删除失败: {}", e);
            record_bulk_operation(BulkOperation::Delete, BulkOutcome::Failed, 0);
        })?;

        if deleted == 0 {
            StructuredLogger::log_bulk_miss(BulkOperation::Delete.as_str(), ids.len());
            record_bulk_operation(BulkOperation::Delete, BulkOutcome::NotFound, 0);
            return Err(TaskboardError::not_found("没有找到需要删除的任务"));
        }

        StructuredLogger::log_bulk_delete(ids.len(), deleted);
        record_bulk_operation(BulkOperation::Delete, BulkOutcome::Applied, deleted);

        Ok(BulkDeleteResult {
            success: true,
            deleted_count: deleted,
        })
    }
}

/// 去重并排序，空集合视为参数错误
fn normalize_ids(ids: &[i64]) -> TaskboardResult<Vec<i64>> {
    if ids.is_empty() {
        return Err(TaskboardError::invalid_argument("任务 ID 列表不能为空"));
    }
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}
