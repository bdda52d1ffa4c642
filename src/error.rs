//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了记录服务的错误类型以及对外暴露的错误分类。

use thiserror::Error;

/// 记录服务错误类型枚举
///
/// 存储层错误对请求是致命的；缓存层错误在同步引擎边界被吞掉，只记录日志。
#[derive(Error, Debug)]
pub enum SyncError {
    /// 存储中不存在该记录
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 缺少必填字段或字段为空
    #[error("Validation failed: {0}")]
    Validation(String),

    /// 权威存储不可达或操作失败
    #[error("Store operation failed: {0}")]
    Store(String),

    /// 缓存不可达或缓存条目损坏
    #[error("Cache operation failed: {0}")]
    Cache(String),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 超过请求截止时间
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// 上游取消了请求
    #[error("Operation cancelled")]
    Cancelled,

    /// Redis错误
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 对调用方可见的错误分类
///
/// 每个响应恰好属于 {成功, 未找到, 请求错误, 内部错误} 之一。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    BadRequest,
    Internal,
}

impl ErrorCategory {
    /// 不包含任何驱动细节的对外消息
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCategory::NotFound => "record not found",
            ErrorCategory::BadRequest => "invalid request",
            ErrorCategory::Internal => "internal error",
        }
    }
}

impl SyncError {
    /// 将错误映射为对外分类
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::NotFound(_) => ErrorCategory::NotFound,
            SyncError::Validation(_) => ErrorCategory::BadRequest,
            _ => ErrorCategory::Internal,
        }
    }

    /// 是否为缓存层错误（永远非致命）
    pub fn is_cache_failure(&self) -> bool {
        matches!(self, SyncError::Cache(_) | SyncError::Redis(_))
    }

    pub(crate) fn cache<E: std::fmt::Display>(e: E) -> Self {
        SyncError::Cache(e.to_string())
    }
}

impl From<sea_orm::DbErr> for SyncError {
    fn from(e: sea_orm::DbErr) -> Self {
        SyncError::Store(e.to_string())
    }
}

/// 操作结果类型别名
pub type Result<T> = std::result::Result<T, SyncError>;
