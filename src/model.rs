//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了记录数据模型。

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};

/// 记录
///
/// `id` 在权威存储中唯一；缓存只镜像最后一次经由同步引擎写入的内容。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Record {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// 原地覆盖字段，保留已分配的缓冲区
    pub fn assign(&mut self, id: &str, name: &str) {
        self.id.clear();
        self.id.push_str(id);
        self.name.clear();
        self.name.push_str(name);
    }

    /// 写入前校验：标识符必须存在，名称不能为空
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(SyncError::Validation("id is required".to_string()));
        }
        validate_name(&self.name)
    }
}

/// 校验名称字段
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SyncError::Validation("name is required".to_string()));
    }
    Ok(())
}

/// 更新请求体，只携带新名称
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameUpdate {
    #[serde(default)]
    pub name: String,
}
