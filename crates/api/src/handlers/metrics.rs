use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::routes::AppState;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// 以 Prometheus 文本格式导出指标
pub async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(metrics) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            metrics.handle.render(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            String::new(),
        ),
    }
}
