use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entities::{Label, Priority, TaskStatus};

/// 仪表盘汇总统计，每次请求重新计算，不落库
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_todos: i64,
    pub completed_todos: i64,
    pub in_progress_todos: i64,
    pub high_priority_todos: i64,
    pub completion_rate: f64,
    pub todos_by_status: BTreeMap<TaskStatus, i64>,
    pub todos_by_priority: BTreeMap<Priority, i64>,
    pub todos_by_label: BTreeMap<Label, i64>,
}

/// 活跃度时间序列中的一天
///
/// `total` 只反映当天的创建量，并不是创建与更新的合计。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDay {
    pub date: NaiveDate,
    pub created: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub total: i64,
}

impl ActivityDay {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            created: 0,
            completed: 0,
            in_progress: 0,
            total: 0,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.created == 0 && self.completed == 0 && self.in_progress == 0 && self.total == 0
    }
}

/// 完成率：保留一位小数，四舍五入；总数为 0 时为 0
pub fn completion_rate(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let rate = completed as f64 / total as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_rate_zero_total() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(5, 0), 0.0);
    }

    #[test]
    fn test_completion_rate_rounding() {
        assert_eq!(completion_rate(3, 10), 30.0);
        assert_eq!(completion_rate(1, 3), 33.3);
        assert_eq!(completion_rate(2, 3), 66.7);
        assert_eq!(completion_rate(1, 8), 12.5);
        assert_eq!(completion_rate(10, 10), 100.0);
    }

    #[test]
    fn test_stats_wire_format() {
        let mut stats = DashboardStats {
            total_todos: 2,
            completed_todos: 1,
            completion_rate: 50.0,
            ..Default::default()
        };
        stats.todos_by_status.insert(TaskStatus::InProgress, 1);
        stats.todos_by_status.insert(TaskStatus::Done, 1);

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["totalTodos"], 2);
        assert_eq!(value["completionRate"], 50.0);
        assert_eq!(value["todosByStatus"]["in progress"], 1);
        assert_eq!(value["todosByStatus"]["done"], 1);
        assert!(value["todosByLabel"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_activity_day_wire_format() {
        let day = ActivityDay {
            date: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
            created: 3,
            completed: 1,
            in_progress: 2,
            total: 3,
        };
        let value = serde_json::to_value(day).unwrap();
        assert_eq!(value["date"], "2024-01-09");
        assert_eq!(value["inProgress"], 2);
        assert_eq!(value["total"], 3);
    }
}
