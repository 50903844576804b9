use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskboardError {
    #[error("存储不可用: {0}")]
    StoreUnavailable(String),
    #[error("参数无效: {0}")]
    InvalidArgument(String),
    #[error("未找到: {0}")]
    NotFound(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type TaskboardResult<T> = Result<T, TaskboardError>;

impl TaskboardError {
    pub fn store_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::StoreUnavailable(msg.into())
    }
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn task_not_found(id: i64) -> Self {
        Self::NotFound(format!("任务 ID {id} 不存在"))
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    /// 仅存储层故障值得调用方重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskboardError::StoreUnavailable(_))
    }
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TaskboardError::InvalidArgument(_) | TaskboardError::NotFound(_)
        )
    }
    pub fn user_message(&self) -> &str {
        match self {
            TaskboardError::StoreUnavailable(_) => "数据存储暂时不可用，请稍后重试",
            TaskboardError::InvalidArgument(_) => "请求参数有误",
            TaskboardError::NotFound(_) => "请求的任务不存在",
            TaskboardError::Serialization(_) => "数据格式错误",
            _ => "系统繁忙，请稍后重试",
        }
    }
}

impl From<sqlx::Error> for TaskboardError {
    fn from(err: sqlx::Error) -> Self {
        TaskboardError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for TaskboardError {
    fn from(err: serde_json::Error) -> Self {
        TaskboardError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for TaskboardError {
    fn from(err: anyhow::Error) -> Self {
        TaskboardError::Internal(err.to_string())
    }
}
