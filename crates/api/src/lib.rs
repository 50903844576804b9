//! # Taskboard API
//!
//! 任务看板的 REST 接口层，基于 Axum 构建：
//! - 仪表盘统计（汇总与 30 天活跃度）
//! - 待办的增删改查与批量更新/删除
//! - 健康检查与 Prometheus 指标
//!
//! 所有响应体均为 JSON，字段使用 camelCase，枚举值保持原始字面量（如 `"in progress"`）。
//! 错误统一返回 `{"error": {...}}` 结构，见 [`error::ApiError`]。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

use middleware::{cors_layer, request_logging, trace_layer};
use routes::create_routes;
use taskboard_config::ApiConfig;

pub use routes::{AppState, MetricsRoute};

/// 创建完整的API应用
pub fn create_app(state: AppState, api_config: &ApiConfig) -> Router {
    let router = create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(axum::middleware::from_fn(request_logging))
            .layer(TimeoutLayer::new(Duration::from_secs(
                api_config.request_timeout_seconds,
            ))),
    );

    if api_config.cors_enabled {
        router.layer(cors_layer())
    } else {
        router
    }
}
