//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 存储连接字符串解析
//!
//! 根据连接字符串识别存储类型，并为文件型SQLite数据库准备目录。

use crate::error::{Result, SyncError};
use std::path::PathBuf;

/// 存储类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// 进程内存储（`memory://`）
    Memory,
    SQLite,
    MySQL,
    PostgreSQL,
}

impl StoreKind {
    /// 从连接字符串推断存储类型
    pub fn from_connection_string(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        if lower.starts_with("memory://") {
            Ok(StoreKind::Memory)
        } else if lower.starts_with("sqlite:") {
            Ok(StoreKind::SQLite)
        } else if lower.starts_with("mysql://") {
            Ok(StoreKind::MySQL)
        } else if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Ok(StoreKind::PostgreSQL)
        } else {
            Err(SyncError::Config(
                "unsupported store connection string scheme".to_string(),
            ))
        }
    }
}

/// 提取SQLite数据库文件路径
///
/// 内存数据库返回None
pub fn sqlite_file_path(connection_string: &str) -> Option<PathBuf> {
    let rest = connection_string
        .strip_prefix("sqlite://")
        .or_else(|| connection_string.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

/// 是否为SQLite内存数据库
pub fn is_sqlite_memory(connection_string: &str) -> bool {
    StoreKind::from_connection_string(connection_string).ok() == Some(StoreKind::SQLite)
        && sqlite_file_path(connection_string).is_none()
}

/// 确保SQLite数据库文件所在目录存在
pub fn ensure_database_directory(connection_string: &str) -> Result<()> {
    if let Some(path) = sqlite_file_path(connection_string) {
        let full_path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()?.join(path)
        };
        if let Some(parent) = full_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SyncError::Store(format!(
                        "Unable to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
    }
    Ok(())
}
