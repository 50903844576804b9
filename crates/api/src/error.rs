use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use taskboard_errors::TaskboardError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Taskboard(#[from] TaskboardError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn parts(&self) -> (StatusCode, String, &'static str, Vec<&'static str>) {
        match self {
            ApiError::Taskboard(TaskboardError::InvalidArgument(msg)) => (
                StatusCode::BAD_REQUEST,
                format!("请求参数错误: {msg}"),
                "INVALID_ARGUMENT",
                vec!["请检查请求参数是否符合要求", "批量操作需要非空的 ids 与至少一个更新字段"],
            ),
            ApiError::Taskboard(TaskboardError::NotFound(msg)) => (
                StatusCode::NOT_FOUND,
                msg.clone(),
                "NOT_FOUND",
                vec!["请检查任务ID是否正确", "使用 GET /api/todo 查看所有任务"],
            ),
            ApiError::Taskboard(TaskboardError::Serialization(msg)) => (
                StatusCode::BAD_REQUEST,
                format!("请求数据格式错误: {msg}"),
                "SERIALIZATION_ERROR",
                vec!["请检查JSON格式是否正确"],
            ),
            ApiError::Taskboard(err @ TaskboardError::StoreUnavailable(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.user_message().to_string(),
                "STORE_UNAVAILABLE",
                vec!["请稍后重试", "查看 GET /health 检查系统状态"],
            ),
            ApiError::Taskboard(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.user_message().to_string(),
                "INTERNAL_ERROR",
                vec!["系统遇到内部错误，请稍后重试"],
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, error_type, suggestions) = self.parts();

        if status.is_server_error() {
            error!(error = %self, "请求处理失败");
        }

        let body = Json(json!({
            "error": {
                "message": message,
                "type": error_type,
                "code": status.as_u16(),
                "suggestions": suggestions,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}
