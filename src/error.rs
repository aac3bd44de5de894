//! Custom error types and handling
//!
//! This module defines the application's error types, their conversion to
//! HTTP responses for the Axum framework, and the judge-side error-code
//! table used when a submission ends in the `error` state.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::constants::judge_errors;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authorization errors
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Resource errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // External service errors
    #[error("Docker error: {0}")]
    Docker(String),

    #[error("Object storage error: {0}")]
    Storage(String),

    #[error("Graph service unavailable: {0}")]
    Graph(String),

    // Judging errors (message text drives error-code classification)
    #[error("{0}")]
    Judge(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in response
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl AppError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Docker(_) => "DOCKER_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Graph(_) => "GRAPH_ERROR",
            Self::Judge(_) => "JUDGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Graph(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_)
            | Self::Docker(_)
            | Self::Storage(_)
            | Self::Judge(_)
            | Self::Internal(_)
            | Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal errors but don't expose details to clients
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "An internal error occurred".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "A database error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code: self.error_code().to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

// Implement From for common error types
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    AppError::AlreadyExists("Resource already exists".to_string())
                } else {
                    AppError::Database(db_err.to_string())
                }
            }
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<bollard::errors::Error> for AppError {
    fn from(err: bollard::errors::Error) -> Self {
        AppError::Docker(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Map a judging failure to its submission error code.
///
/// The judge pipeline reports failures with Chinese-language messages; the
/// code is derived from characteristic substrings, mirroring the boundary
/// contract the web frontend expects.
pub fn classify_judge_error(message: &str) -> &'static str {
    if message.contains("测试用例") {
        judge_errors::MISSING_TEST_CASES
    } else if message.contains("编译") {
        judge_errors::COMPILE
    } else if message.contains("超时") {
        judge_errors::TIMEOUT
    } else if message.contains("内存") {
        judge_errors::MEMORY
    } else if message.contains("网络") {
        judge_errors::NETWORK
    } else {
        judge_errors::UNKNOWN
    }
}

/// User-facing message for a submission error code.
pub fn judge_error_message(code: &str) -> &'static str {
    match code {
        judge_errors::MISSING_TEST_CASES => "题目配置错误：缺少测试用例，请联系管理员",
        judge_errors::COMPILE => "代码编译失败，请检查语法错误",
        judge_errors::TIMEOUT => "代码运行超时，请优化算法效率",
        judge_errors::MEMORY => "内存使用超限，请优化内存使用",
        judge_errors::NETWORK => "网络连接错误，请稍后重试",
        judge_errors::UNKNOWN => "系统内部错误，请联系管理员",
        _ => "未知错误，请联系管理员",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_judge_error_table() {
        assert_eq!(classify_judge_error("题目没有可用的测试用例"), "E001");
        assert_eq!(classify_judge_error("编译失败: exit status 1"), "E002");
        assert_eq!(classify_judge_error("评测超时"), "E003");
        assert_eq!(classify_judge_error("内存超限"), "E004");
        assert_eq!(classify_judge_error("网络连接失败"), "E005");
        assert_eq!(classify_judge_error("something unexpected"), "E999");
    }

    #[test]
    fn test_judge_error_messages_cover_all_codes() {
        for code in ["E001", "E002", "E003", "E004", "E005", "E999"] {
            assert!(!judge_error_message(code).is_empty());
        }
        assert_eq!(judge_error_message("E042"), "未知错误，请联系管理员");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Judge("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
