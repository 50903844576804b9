use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument};

use taskboard_domain::repositories::TaskStore;
use taskboard_domain::value_objects::{ActivityDay, DashboardStats};
use taskboard_errors::TaskboardResult;
use taskboard_observability::record_dashboard_query;

use crate::clock::Clock;
use crate::use_cases::activity_rollup::ActivityRollup;
use crate::use_cases::summary_aggregator::SummaryAggregator;

/// 仪表盘门面，对外唯一可见的统计入口
pub struct DashboardService {
    aggregator: SummaryAggregator,
    rollup: ActivityRollup,
    clock: Arc<dyn Clock>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            aggregator: SummaryAggregator::new(store.clone()),
            rollup: ActivityRollup::new(store),
            clock,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> TaskboardResult<DashboardStats> {
        let started = Instant::now();
        let result = self.aggregator.summarize().await;
        record_dashboard_query("stats", started.elapsed(), result.is_ok());

        if let Ok(stats) = &result {
            debug!(
                "仪表盘统计完成: 总计 {}，完成率 {}%，耗时 {:?}",
                stats.total_todos,
                stats.completion_rate,
                started.elapsed()
            );
        }
        result
    }

    #[instrument(skip(self))]
    pub async fn get_activity(&self) -> TaskboardResult<Vec<ActivityDay>> {
        let started = Instant::now();
        let now = self.clock.now();
        let result = self.rollup.rollup(now).await;
        record_dashboard_query("activity", started.elapsed(), result.is_ok());

        if result.is_ok() {
            debug!("活跃度序列生成完成，参考时间 {}，耗时 {:?}", now, started.elapsed());
        }
        result
    }
}
