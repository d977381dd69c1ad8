//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;
use uuid::Uuid;

use crate::application::ports::{
    EditorSessionError, ExtractError, GenerationError, StoreError,
};
use crate::domain::story::StoryError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误（在任何网络调用之前返回）
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 无权操作他人的资源
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 存储错误
    #[error("Store error: {0}")]
    StoreError(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 外部服务超时
    #[error("External service timeout: {0}")]
    Timeout(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: Uuid) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建 NotFound 错误（使用字符串 ID）
    pub fn not_found_str(resource_type: &'static str, id: &str) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建无权限错误
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<StoreError> for ApplicationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound {
                resource_type: "Document",
                id,
            },
            other => Self::StoreError(other.to_string()),
        }
    }
}

impl From<StoryError> for ApplicationError {
    fn from(err: StoryError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<GenerationError> for ApplicationError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Timeout(_) => Self::Timeout(err.to_string()),
            other => Self::ExternalServiceError(other.to_string()),
        }
    }
}

impl From<EditorSessionError> for ApplicationError {
    fn from(err: EditorSessionError) -> Self {
        match err {
            EditorSessionError::NotFound(id) => Self::not_found_str("Editor session", &id),
            other => Self::InternalError(other.to_string()),
        }
    }
}

impl From<ExtractError> for ApplicationError {
    fn from(err: ExtractError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_timeout_maps_to_timeout() {
        let err = ApplicationError::from(GenerationError::Timeout(900));
        assert!(matches!(err, ApplicationError::Timeout(_)));
    }

    #[test]
    fn test_store_not_found_maps_to_not_found() {
        let err = ApplicationError::from(StoreError::NotFound("abc".to_string()));
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }

    #[test]
    fn test_story_error_is_validation() {
        let err = ApplicationError::from(StoryError::MissingField("genre"));
        assert!(matches!(err, ApplicationError::ValidationError(_)));
    }
}
