use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use taskboard_application::{BulkMutationCoordinator, DashboardService, TodoService};
use taskboard_domain::repositories::StoreHealth;

use crate::handlers::{
    dashboard::{get_activity, get_stats},
    health::health_check,
    metrics::render_metrics,
    todos::{bulk_delete, bulk_update, create_todo, delete_todo, list_todos, toggle_todo, update_todo},
};

/// Prometheus 导出端点
#[derive(Clone)]
pub struct MetricsRoute {
    pub path: String,
    pub handle: PrometheusHandle,
}

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<DashboardService>,
    pub bulk: Arc<BulkMutationCoordinator>,
    pub todos: Arc<TodoService>,
    pub store_health: Arc<dyn StoreHealth>,
    pub metrics: Option<MetricsRoute>,
}

/// 创建路由
pub fn create_routes(state: AppState) -> Router {
    let mut router = Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 仪表盘
        .route("/api/dashboard/stats", get(get_stats))
        .route("/api/dashboard/activity", get(get_activity))
        // 待办
        .route("/api/todo", get(list_todos).post(create_todo))
        .route("/api/todo/toggle", patch(toggle_todo))
        .route("/api/todo/bulk", patch(bulk_update).delete(bulk_delete))
        .route("/api/todo/{id}", patch(update_todo).delete(delete_todo));

    if let Some(metrics) = &state.metrics {
        router = router.route(&metrics.path, get(render_metrics));
    }

    router.with_state(state)
}
