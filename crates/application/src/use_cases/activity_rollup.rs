//! 30 天活跃度汇总
//!
//! 先按窗口生成 30 个零值日期，再把创建行与更新行合并进去。
//! 活跃度由 `created_at`/`updated_at` 两列推断，并不是真实的事件日志：
//! 某任务今天被再次修改后，它之前的完成记录会"移动"到今天。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::try_join;
use tracing::{instrument, warn};

use taskboard_domain::calendar::{day_key, ActivityWindow};
use taskboard_domain::entities::{TaskStatus, TimestampField};
use taskboard_domain::repositories::{DailyStatusCount, TaskStore};
use taskboard_domain::value_objects::ActivityDay;
use taskboard_errors::TaskboardResult;
use taskboard_observability::record_activity_rows_dropped;

pub struct ActivityRollup {
    store: Arc<dyn TaskStore>,
}

impl ActivityRollup {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// 返回以 `now` 所在 UTC 日为结尾的 30 天序列，升序且无缺口
    #[instrument(skip(self))]
    pub async fn rollup(&self, now: DateTime<Utc>) -> TaskboardResult<Vec<ActivityDay>> {
        let window = ActivityWindow::ending_at(now);
        let since = window.start_instant();

        let (created_rows, updated_rows) = try_join!(
            self.store
                .count_by_day_and_status(TimestampField::CreatedAt, since),
            self.store
                .count_by_day_and_status(TimestampField::UpdatedAt, since),
        )?;

        let mut days: Vec<ActivityDay> = window.days().map(ActivityDay::empty).collect();
        let mut dropped = 0u64;

        for row in &created_rows {
            match slot(&window, &mut days, row) {
                Some(day) => {
                    day.created += row.count.max(0);
                    day.total += row.count.max(0);
                }
                None => dropped += 1,
            }
        }

        for row in &updated_rows {
            let status = row.status.as_deref().and_then(|s| s.parse::<TaskStatus>().ok());
            let Some(day) = slot(&window, &mut days, row) else {
                dropped += 1;
                continue;
            };
            match status {
                Some(TaskStatus::Done) => day.completed += row.count.max(0),
                Some(TaskStatus::InProgress) => day.in_progress += row.count.max(0),
                _ => {}
            }
        }

        if dropped > 0 {
            warn!("{} 行活跃度数据落在窗口 {}..={} 之外，已忽略", dropped, window.start(), window.end());
            record_activity_rows_dropped(dropped);
        }

        Ok(days)
    }
}

fn slot<'a>(
    window: &ActivityWindow,
    days: &'a mut [ActivityDay],
    row: &DailyStatusCount,
) -> Option<&'a mut ActivityDay> {
    window
        .index_of(day_key(row.date))
        .and_then(move |idx| days.get_mut(idx))
}
