use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_errors::TaskboardError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub text: String,
    /// 仅作展示，工作流状态以 `status` 为准
    pub completed: bool,
    pub label: Label,
    pub status: TaskStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(text: String, now: DateTime<Utc>) -> Self {
        Self {
            id: 0, // 将由数据库生成
            text,
            completed: false,
            label: Label::default(),
            status: TaskStatus::default(),
            priority: Priority::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.status, TaskStatus::Done)
    }

    pub fn entity_description(&self) -> String {
        format!("任务 '{}' (ID: {}, 状态: {})", self.text, self.id, self.status)
    }
}

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub enum Label {
    #[serde(rename = "bug")]
    Bug,
    #[default]
    #[serde(rename = "feature")]
    Feature,
    #[serde(rename = "documentation")]
    Documentation,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Bug, Label::Feature, Label::Documentation];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Bug => "bug",
            Label::Feature => "feature",
            Label::Documentation => "documentation",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub enum TaskStatus {
    #[serde(rename = "backlog")]
    Backlog,
    #[default]
    #[serde(rename = "todo")]
    Todo,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "canceled")]
    Canceled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Backlog,
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Done => "done",
            TaskStatus::Canceled => "canceled",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub enum Priority {
    #[serde(rename = "low")]
    Low,
    #[default]
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "high")]
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

macro_rules! impl_literal_enum {
    ($ty:ident, $kind:literal) => {
        impl FromStr for $ty {
            type Err = TaskboardError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        TaskboardError::invalid_argument(format!("无效的{}: {s}", $kind))
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_literal_enum!(Label, "标签");
impl_literal_enum!(TaskStatus, "任务状态");
impl_literal_enum!(Priority, "优先级");

/// 创建任务的输入，缺省字段由服务层补全默认值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub text: String,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub label: Option<Label>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

/// 单个任务的整体更新
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub text: String,
    pub label: Label,
    pub status: TaskStatus,
    pub priority: Priority,
}

/// 批量更新使用的部分字段补丁，`id` 与时间戳不可修改
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.completed.is_none()
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(label) = self.label {
            task.label = label;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

/// 等值过滤条件，多个字段之间为 AND
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub label: Option<Label>,
}

impl TaskFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none() && self.label.is_none()
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |s| s == task.status)
            && self.priority.map_or(true, |p| p == task.priority)
            && self.label.map_or(true, |l| l == task.label)
    }
}

/// 可分组统计的分类字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupField {
    Status,
    Priority,
    Label,
}

impl GroupField {
    pub fn column(&self) -> &'static str {
        match self {
            GroupField::Status => "status",
            GroupField::Priority => "priority",
            GroupField::Label => "label",
        }
    }

    pub fn value_of(&self, task: &Task) -> &'static str {
        match self {
            GroupField::Status => task.status.as_str(),
            GroupField::Priority => task.priority.as_str(),
            GroupField::Label => task.label.as_str(),
        }
    }
}

/// 可按天分组的时间戳字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampField {
    CreatedAt,
    UpdatedAt,
}

impl TimestampField {
    pub fn column(&self) -> &'static str {
        match self {
            TimestampField::CreatedAt => "created_at",
            TimestampField::UpdatedAt => "updated_at",
        }
    }

    pub fn value_of(&self, task: &Task) -> DateTime<Utc> {
        match self {
            TimestampField::CreatedAt => task.created_at,
            TimestampField::UpdatedAt => task.updated_at,
        }
    }
}
