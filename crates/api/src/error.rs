use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use taskboard_domain::{FailureKind, TaskError};
use tracing::error;

/// 缺少必需参数时返回给调用方的消息
pub const MISSING_DATA_MESSAGE: &str = "Required data is not provided.";
/// 记录或附件不存在时返回给调用方的消息
pub const NOT_FOUND_MESSAGE: &str = "Required data not found.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// 必需的查询参数缺失或为空
    pub fn missing_parameter(name: &str) -> Self {
        ApiError::BadRequest(format!("缺少参数 {name}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, error_type) = match &self {
            ApiError::Task(err) => match err.kind() {
                FailureKind::InvalidInput => (
                    StatusCode::BAD_REQUEST,
                    MISSING_DATA_MESSAGE.to_string(),
                    FailureKind::InvalidInput.as_code(),
                ),
                // 沿用原有接口约定，未找到返回 400 而不是 404
                FailureKind::NotFound => (
                    StatusCode::BAD_REQUEST,
                    NOT_FOUND_MESSAGE.to_string(),
                    FailureKind::NotFound.as_code(),
                ),
                kind => {
                    error!("任务操作失败: {}", err);
                    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), kind.as_code())
                }
            },
            ApiError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                MISSING_DATA_MESSAGE.to_string(),
                FailureKind::InvalidInput.as_code(),
            ),
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "type": error_type,
                "code": status.as_u16(),
                "details": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
