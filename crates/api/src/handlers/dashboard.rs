use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::{error::ApiResult, response::success, routes::AppState};

/// 获取仪表盘汇总统计
#[instrument(skip_all)]
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let stats = state.dashboard.get_stats().await?;
    Ok(success(stats))
}

/// 获取最近 30 天的活跃度，按日期升序
#[instrument(skip_all)]
pub async fn get_activity(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let days = state.dashboard.get_activity().await?;
    Ok(success(days))
}
