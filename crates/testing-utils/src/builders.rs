//! 测试数据构建器

use chrono::{DateTime, Utc};
use taskboard_domain::entities::{Label, Priority, Task, TaskStatus};

use crate::helpers::fixed_now;

/// 任务实体构建器，默认值与新建任务一致
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new() -> Self {
        let now = fixed_now();
        Self {
            task: Task {
                id: 1,
                text: "test task".to_string(),
                completed: false,
                label: Label::Feature,
                status: TaskStatus::Todo,
                priority: Priority::Medium,
                created_at: now,
                updated_at: now,
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.task.id = id;
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.task.text = text.to_string();
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.task.priority = priority;
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.task.label = label;
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.task.completed = completed;
        self
    }

    /// 同时设置创建和更新时间
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.task.created_at = at;
        self.task.updated_at = at;
        self
    }

    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.task.updated_at = at;
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

impl Default for TaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 生成 `count` 个连续 id 的任务，由 `customize` 调整每一个
pub fn tasks_with<F>(count: i64, mut customize: F) -> Vec<Task>
where
    F: FnMut(i64, TaskBuilder) -> TaskBuilder,
{
    (1..=count)
        .map(|id| customize(id, TaskBuilder::new().with_id(id).with_text(&format!("task {id}"))).build())
        .collect()
}
