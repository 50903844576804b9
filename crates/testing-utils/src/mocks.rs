//! 存储 trait 的内存实现
//!
//! `InMemoryTaskStore` 的行为与 SQL 存储保持一致：分组计数按原始时间戳分组，
//! 批量语句在同一把锁内完成。每次 trait 调用都会计数，测试据此断言请求在
//! 校验阶段就被拒绝、没有访问存储。

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taskboard_domain::entities::{
    GroupField, Task, TaskFilter, TaskPatch, TaskUpdate, TimestampField,
};
use taskboard_domain::repositories::{
    DailyStatusCount, GroupedCount, StoreHealth, TaskMutationGateway, TaskRepository,
    TaskStore,
};
use taskboard_errors::{TaskboardError, TaskboardResult};

#[derive(Debug, Clone)]
pub struct InMemoryTaskStore {
    tasks: Arc<Mutex<BTreeMap<i64, Task>>>,
    next_id: Arc<Mutex<i64>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: Arc::new(Mutex::new(1)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let max_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        let task_map = tasks.into_iter().map(|t| (t.id, t)).collect();

        Self {
            tasks: Arc::new(Mutex::new(task_map)),
            next_id: Arc::new(Mutex::new(max_id + 1)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 已发生的存储调用次数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: i64) -> Option<Task> {
        self.tasks.lock().unwrap().get(&id).cloned()
    }

    pub fn insert(&self, task: Task) {
        let mut next_id = self.next_id.lock().unwrap();
        if task.id >= *next_id {
            *next_id = task.id + 1;
        }
        self.tasks.lock().unwrap().insert(task.id, task);
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn count(&self, filter: &TaskFilter) -> TaskboardResult<i64> {
        self.touch();
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.values().filter(|t| filter.matches(t)).count() as i64)
    }

    async fn count_grouped_by(
        &self,
        field: GroupField,
        filter: &TaskFilter,
    ) -> TaskboardResult<Vec<GroupedCount>> {
        self.touch();
        let tasks = self.tasks.lock().unwrap();
        let mut groups: BTreeMap<&'static str, i64> = BTreeMap::new();
        for task in tasks.values().filter(|t| filter.matches(t)) {
            *groups.entry(field.value_of(task)).or_insert(0) += 1;
        }
        Ok(groups
            .into_iter()
            .map(|(key, count)| GroupedCount::new(key, count))
            .collect())
    }

    async fn count_by_day_and_status(
        &self,
        field: TimestampField,
        since: DateTime<Utc>,
    ) -> TaskboardResult<Vec<DailyStatusCount>> {
        self.touch();
        let tasks = self.tasks.lock().unwrap();
        let mut groups: HashMap<(DateTime<Utc>, &'static str), i64> = HashMap::new();
        for task in tasks.values() {
            let at = field.value_of(task);
            if at >= since {
                *groups.entry((at, task.status.as_str())).or_insert(0) += 1;
            }
        }
        Ok(groups
            .into_iter()
            .map(|((date, status), count)| DailyStatusCount {
                date,
                status: Some(status.to_string()),
                count,
            })
            .collect())
    }
}

#[async_trait]
impl TaskMutationGateway for InMemoryTaskStore {
    async fn update_where(
        &self,
        ids: &[i64],
        patch: &TaskPatch,
        stamped_at: DateTime<Utc>,
    ) -> TaskboardResult<u64> {
        self.touch();
        let mut tasks = self.tasks.lock().unwrap();
        let mut affected = 0;
        for id in ids {
            if let Some(task) = tasks.get_mut(id) {
                patch.apply_to(task);
                task.updated_at = stamped_at;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn delete_where(&self, ids: &[i64]) -> TaskboardResult<u64> {
        self.touch();
        let mut tasks = self.tasks.lock().unwrap();
        Ok(ids.iter().filter(|id| tasks.remove(id).is_some()).count() as u64)
    }
}

#[async_trait]
impl StoreHealth for InMemoryTaskStore {
    async fn ping(&self) -> TaskboardResult<()> {
        self.touch();
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskStore {
    async fn find_all(&self) -> TaskboardResult<Vec<Task>> {
        self.touch();
        Ok(self.tasks.lock().unwrap().values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> TaskboardResult<Option<Task>> {
        self.touch();
        Ok(self.get(id))
    }

    async fn create(&self, task: &Task) -> TaskboardResult<Task> {
        self.touch();
        let mut next_id = self.next_id.lock().unwrap();
        let mut created = task.clone();
        created.id = *next_id;
        *next_id += 1;
        self.tasks.lock().unwrap().insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: i64,
        update: &TaskUpdate,
        stamped_at: DateTime<Utc>,
    ) -> TaskboardResult<Option<Task>> {
        self.touch();
        let mut tasks = self.tasks.lock().unwrap();
        Ok(tasks.get_mut(&id).map(|existing| {
            existing.text = update.text.clone();
            existing.label = update.label;
            existing.status = update.status;
            existing.priority = update.priority;
            existing.updated_at = stamped_at;
            existing.clone()
        }))
    }

    async fn set_completed(
        &self,
        id: i64,
        completed: bool,
        stamped_at: DateTime<Utc>,
    ) -> TaskboardResult<bool> {
        self.touch();
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.get_mut(&id) {
            Some(task) => {
                task.completed = completed;
                task.updated_at = stamped_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> TaskboardResult<bool> {
        self.touch();
        Ok(self.tasks.lock().unwrap().remove(&id).is_some())
    }
}

/// 失败注入点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    Everything,
    Count,
    GroupedBy(GroupField),
    DailyCounts(TimestampField),
    Mutations,
}

/// 在指定调用上返回 `StoreUnavailable`，其余调用委托给内存存储
#[derive(Debug, Clone)]
pub struct FailingTaskStore {
    inner: InMemoryTaskStore,
    point: FailurePoint,
}

impl FailingTaskStore {
    pub fn new(point: FailurePoint) -> Self {
        Self::wrapping(InMemoryTaskStore::new(), point)
    }

    pub fn wrapping(inner: InMemoryTaskStore, point: FailurePoint) -> Self {
        Self { inner, point }
    }

    fn fail_if(&self, hit: bool) -> TaskboardResult<()> {
        if hit || self.point == FailurePoint::Everything {
            return Err(TaskboardError::store_unavailable("injected store failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for FailingTaskStore {
    async fn count(&self, filter: &TaskFilter) -> TaskboardResult<i64> {
        self.fail_if(self.point == FailurePoint::Count)?;
        self.inner.count(filter).await
    }

    async fn count_grouped_by(
        &self,
        field: GroupField,
        filter: &TaskFilter,
    ) -> TaskboardResult<Vec<GroupedCount>> {
        self.fail_if(self.point == FailurePoint::GroupedBy(field))?;
        self.inner.count_grouped_by(field, filter).await
    }

    async fn count_by_day_and_status(
        &self,
        field: TimestampField,
        since: DateTime<Utc>,
    ) -> TaskboardResult<Vec<DailyStatusCount>> {
        self.fail_if(self.point == FailurePoint::DailyCounts(field))?;
        self.inner.count_by_day_and_status(field, since).await
    }
}

#[async_trait]
impl TaskMutationGateway for FailingTaskStore {
    async fn update_where(
        &self,
        ids: &[i64],
        patch: &TaskPatch,
        stamped_at: DateTime<Utc>,
    ) -> TaskboardResult<u64> {
        self.fail_if(self.point == FailurePoint::Mutations)?;
        self.inner.update_where(ids, patch, stamped_at).await
    }

    async fn delete_where(&self, ids: &[i64]) -> TaskboardResult<u64> {
        self.fail_if(self.point == FailurePoint::Mutations)?;
        self.inner.delete_where(ids).await
    }
}

#[async_trait]
impl StoreHealth for FailingTaskStore {
    async fn ping(&self) -> TaskboardResult<()> {
        self.fail_if(false)?;
        self.inner.ping().await
    }
}

/// 返回预设原始行的统计存储，用于验证脏数据的容错
#[derive(Debug, Clone, Default)]
pub struct CannedTaskStore {
    pub total: i64,
    pub grouped: HashMap<&'static str, Vec<GroupedCount>>,
    pub created_rows: Vec<DailyStatusCount>,
    pub updated_rows: Vec<DailyStatusCount>,
}

#[async_trait]
impl TaskStore for CannedTaskStore {
    async fn count(&self, filter: &TaskFilter) -> TaskboardResult<i64> {
        Ok(if filter.is_empty() { self.total } else { 0 })
    }

    async fn count_grouped_by(
        &self,
        field: GroupField,
        _filter: &TaskFilter,
    ) -> TaskboardResult<Vec<GroupedCount>> {
        Ok(self.grouped.get(field.column()).cloned().unwrap_or_default())
    }

    async fn count_by_day_and_status(
        &self,
        field: TimestampField,
        _since: DateTime<Utc>,
    ) -> TaskboardResult<Vec<DailyStatusCount>> {
        Ok(match field {
            TimestampField::CreatedAt => self.created_rows.clone(),
            TimestampField::UpdatedAt => self.updated_rows.clone(),
        })
    }
}
