use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::warn;

use crate::routes::AppState;

/// 健康检查，存储不可达时返回 503
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (status_code, status, database) = match state.store_health.ping().await {
        Ok(()) => (StatusCode::OK, "ok", "ok"),
        Err(e) => {
            warn!("健康检查失败: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
        }
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "database": database,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "service": "taskboard",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
