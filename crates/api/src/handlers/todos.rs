use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use taskboard_domain::entities::{NewTask, TaskPatch, TaskUpdate};
use tracing::{debug, instrument};

use crate::{
    error::ApiResult,
    response::{created, no_content, success, SuccessResponse},
    routes::AppState,
};

/// 批量更新请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkUpdateRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(default)]
    pub updates: TaskPatch,
}

/// 批量删除请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
}

/// 切换完成标记请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub id: i64,
    pub completed: bool,
}

/// 获取全部待办
pub async fn list_todos(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let tasks = state.todos.list().await?;
    Ok(success(tasks))
}

/// 创建待办
#[instrument(skip_all)]
pub async fn create_todo(
    State(state): State<AppState>,
    Json(request): Json<NewTask>,
) -> ApiResult<impl IntoResponse> {
    let task = state.todos.create(request).await?;
    debug!("已创建待办 {}", task.id);
    Ok(created(task))
}

pub async fn toggle_todo(
    State(state): State<AppState>,
    Json(request): Json<ToggleRequest>,
) -> ApiResult<impl IntoResponse> {
    state.todos.toggle(request.id, request.completed).await?;
    Ok(success(SuccessResponse::ok()))
}

/// 更新单个待办
#[instrument(skip_all)]
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<TaskUpdate>,
) -> ApiResult<impl IntoResponse> {
    let task = state.todos.update(id, request).await?;
    Ok(success(task))
}

/// 删除单个待办
#[instrument(skip_all)]
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    state.todos.delete(id).await?;
    Ok(no_content())
}

/// 批量更新：`{ids, updates}`
#[instrument(skip_all)]
pub async fn bulk_update(
    State(state): State<AppState>,
    Json(request): Json<BulkUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    let result = state.bulk.bulk_update(&request.ids, &request.updates).await?;
    Ok(success(result))
}

/// 批量删除：`{ids}`
#[instrument(skip_all)]
pub async fn bulk_delete(
    State(state): State<AppState>,
    Json(request): Json<BulkDeleteRequest>,
) -> ApiResult<impl IntoResponse> {
    let result = state.bulk.bulk_delete(&request.ids).await?;
    Ok(success(result))
}
