//! shop-errors - 统一错误处理
//!
//! 数据访问层的错误分类，基于 RFC 7807 Problem Details 对外呈现

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用错误类型
///
/// "未找到" 在仓储层以 `Option::None` 表示，`NotFound` 仅供调用方在需要时转换使用。
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn concurrency_conflict(msg: impl Into<String>) -> Self {
        Self::ConcurrencyConflict(msg.into())
    }

    pub fn illegal_state(msg: impl Into<String>) -> Self {
        Self::IllegalState(msg.into())
    }

    pub fn storage_failure(msg: impl Into<String>) -> Self {
        Self::StorageFailure(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 提交失败时是否需要回滚
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Self::StorageFailure(_) | Self::ConcurrencyConflict(_))
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidArgument(_) => 400,
            Self::ConcurrencyConflict(_) => 409,
            Self::IllegalState(_) => 409,
            Self::StorageFailure(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// 转换为 Problem Details
    pub fn to_problem_details(&self) -> ProblemDetails {
        ProblemDetails {
            r#type: self.problem_type(),
            title: self.problem_title(),
            status: self.status_code(),
            detail: self.to_string(),
            instance: None,
        }
    }

    fn problem_type(&self) -> String {
        let slug = match self {
            Self::NotFound(_) => "not-found",
            Self::InvalidArgument(_) => "invalid-argument",
            Self::ConcurrencyConflict(_) => "concurrency-conflict",
            Self::IllegalState(_) => "illegal-state",
            Self::StorageFailure(_) => "storage-failure",
            Self::Internal(_) => "internal",
        };
        format!("https://api.shop.local/problems/{}", slug)
    }

    fn problem_title(&self) -> String {
        match self {
            Self::NotFound(_) => "Resource Not Found".to_string(),
            Self::InvalidArgument(_) => "Invalid Argument".to_string(),
            Self::ConcurrencyConflict(_) => "Concurrency Conflict".to_string(),
            Self::IllegalState(_) => "Illegal State".to_string(),
            Self::StorageFailure(_) => "Storage Failure".to_string(),
            Self::Internal(_) => "Internal Server Error".to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("Entity mapping failed: {}", err))
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
