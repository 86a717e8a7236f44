use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reactor_rules::RuleError;
use serde_json::json;
use std::fmt;

/// API 错误类型
#[derive(Debug)]
pub enum ApiError {
    /// 规则未找到
    NotFound(String),
    /// 请求错误（校验失败、请求体无法解析）
    BadRequest(String),
    /// 名称冲突，携带已存在规则的 ID
    Conflict { message: String, conflict_id: String },
    /// 内部错误
    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Conflict { message, conflict_id } => {
                write!(f, "Conflict: {} (conflict-id={})", message, conflict_id)
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, conflict_id) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Conflict { message, conflict_id } => {
                (StatusCode::CONFLICT, message, Some(conflict_id))
            }
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
        };

        let mut body = json!({
            "error": message,
            "status": status.as_u16(),
        });
        if let Some(conflict_id) = conflict_id {
            body["conflict-id"] = json!(conflict_id);
        }

        (status, Json(body)).into_response()
    }
}

impl From<RuleError> for ApiError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::Validation(msg) => ApiError::BadRequest(msg),
            RuleError::NotFound { message, .. } => ApiError::NotFound(message),
            RuleError::Conflict {
                conflict_id,
                message,
            } => ApiError::Conflict {
                message,
                conflict_id,
            },
            RuleError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
