use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use futures::try_join;
use tracing::{debug, instrument};

use taskboard_domain::entities::{GroupField, Priority, TaskFilter, TaskStatus};
use taskboard_domain::repositories::{GroupedCount, TaskStore};
use taskboard_domain::value_objects::{completion_rate, DashboardStats};
use taskboard_errors::TaskboardResult;
use taskboard_observability::StructuredLogger;

/// 汇总统计器 - 并发发出七个独立查询并合成 `DashboardStats`
pub struct SummaryAggregator {
    store: Arc<dyn TaskStore>,
}

impl SummaryAggregator {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// 任一子查询失败则整体失败，不返回部分结果
    #[instrument(skip(self))]
    pub async fn summarize(&self) -> TaskboardResult<DashboardStats> {
        let all = TaskFilter::all();
        let done = TaskFilter::all().with_status(TaskStatus::Done);
        let in_progress = TaskFilter::all().with_status(TaskStatus::InProgress);
        let urgent = TaskFilter::all()
            .with_priority(Priority::High)
            .with_status(TaskStatus::Todo);

        let (total, by_status, by_priority, by_label, completed, in_progress, high_priority) = try_join!(
            self.store.count(&all),
            self.store.count_grouped_by(GroupField::Status, &all),
            self.store.count_grouped_by(GroupField::Priority, &all),
            self.store.count_grouped_by(GroupField::Label, &all),
            self.store.count(&done),
            self.store.count(&in_progress),
            self.store.count(&urgent),
        )?;

        let total = total.max(0);
        let completed = completed.max(0);

        debug!(
            "汇总统计: 总计 {}，已完成 {}，进行中 {}",
            total, completed, in_progress
        );

        Ok(DashboardStats {
            total_todos: total,
            completed_todos: completed,
            in_progress_todos: in_progress.max(0),
            high_priority_todos: high_priority.max(0),
            completion_rate: completion_rate(completed, total),
            todos_by_status: tally(GroupField::Status, by_status),
            todos_by_priority: tally(GroupField::Priority, by_priority),
            todos_by_label: tally(GroupField::Label, by_label),
        })
    }
}

/// 把分组行转成以枚举为键的映射，空键或未知键被丢弃
pub fn tally<K>(field: GroupField, rows: Vec<GroupedCount>) -> BTreeMap<K, i64>
where
    K: FromStr + Ord,
{
    let mut counts = BTreeMap::new();
    for row in rows {
        let parsed = row.key.as_deref().and_then(|k| k.parse::<K>().ok());
        match parsed {
            Some(key) => *counts.entry(key).or_insert(0) += row.count.max(0),
            None => StructuredLogger::log_dropped_group_key(
                field.column(),
                row.key.as_deref(),
                row.count,
            ),
        }
    }
    counts
}
