//! 领域仓储抽象
//!
//! 定义数据访问的抽象接口，遵循依赖倒置原则。统计引擎只依赖 `TaskStore`，
//! 批量操作只依赖 `TaskMutationGateway`。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taskboard_errors::TaskboardResult;

use crate::entities::{GroupField, Task, TaskFilter, TaskPatch, TaskUpdate, TimestampField};

/// 分组计数的原始行，分组键由调用方校验
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedCount {
    pub key: Option<String>,
    pub count: i64,
}

impl GroupedCount {
    pub fn new(key: impl Into<String>, count: i64) -> Self {
        Self {
            key: Some(key.into()),
            count,
        }
    }
}

/// 按 (时间戳, 状态) 分组计数的原始行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyStatusCount {
    pub date: DateTime<Utc>,
    pub status: Option<String>,
    pub count: i64,
}

/// 只读统计查询
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn count(&self, filter: &TaskFilter) -> TaskboardResult<i64>;

    async fn count_grouped_by(
        &self,
        field: GroupField,
        filter: &TaskFilter,
    ) -> TaskboardResult<Vec<GroupedCount>>;

    /// 统计 `field >= since` 的行，按 (field, status) 分组
    async fn count_by_day_and_status(
        &self,
        field: TimestampField,
        since: DateTime<Utc>,
    ) -> TaskboardResult<Vec<DailyStatusCount>>;
}

/// 批量变更网关，每个方法在存储层都是单条原子语句
#[async_trait]
pub trait TaskMutationGateway: Send + Sync {
    /// 返回实际受影响的行数，并把 `updated_at` 统一写为 `stamped_at`
    async fn update_where(
        &self,
        ids: &[i64],
        patch: &TaskPatch,
        stamped_at: DateTime<Utc>,
    ) -> TaskboardResult<u64>;

    async fn delete_where(&self, ids: &[i64]) -> TaskboardResult<u64>;
}

/// 存储连通性探测，供健康检查使用
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> TaskboardResult<()>;
}

/// 单任务增删改查
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn find_all(&self) -> TaskboardResult<Vec<Task>>;
    async fn find_by_id(&self, id: i64) -> TaskboardResult<Option<Task>>;
    async fn create(&self, task: &Task) -> TaskboardResult<Task>;
    /// 单条语句覆盖内容、标签、状态与优先级并返回新行，不触碰 `completed`；
    /// 任务不存在时返回 None
    async fn update(
        &self,
        id: i64,
        update: &TaskUpdate,
        stamped_at: DateTime<Utc>,
    ) -> TaskboardResult<Option<Task>>;
    async fn set_completed(
        &self,
        id: i64,
        completed: bool,
        stamped_at: DateTime<Utc>,
    ) -> TaskboardResult<bool>;
    async fn delete(&self, id: i64) -> TaskboardResult<bool>;
}
