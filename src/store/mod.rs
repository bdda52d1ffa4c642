//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 权威存储模块
//!
//! 定义记录存储接口，提供基于 sea-orm 的SQL实现和进程内实现

pub mod connection;
pub mod memory;
pub mod sql;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::model::Record;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::sync::Arc;

pub use connection::StoreKind;
pub use memory::MemoryStore;
pub use sql::SqlStore;

/// 记录存储特征
///
/// 权威数据源。所有操作都是一次同步往返，失败对请求是致命的。
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 存储名称，用于日志
    fn name(&self) -> &'static str;

    /// 创建记录表以及记录标识符上的唯一索引
    async fn ensure_schema(&self) -> Result<()>;

    /// 按标识符查找，不存在返回 `SyncError::NotFound`
    async fn find_one(&self, id: &str) -> Result<Record>;

    /// 按插入顺序把全部记录追加到 `out`
    ///
    /// 中途出错时 `out` 恢复到调用前的长度，不会留下部分结果
    async fn find_all_into(&self, out: &mut Vec<Record>) -> Result<()>;

    /// 插入记录，返回存储生成的主键
    async fn insert(&self, record: &Record) -> Result<String>;

    /// 更新记录名称，不存在返回 `SyncError::NotFound`
    async fn update_name(&self, id: &str, name: &str) -> Result<()>;

    /// 删除记录，不存在返回 `SyncError::NotFound`
    async fn delete(&self, id: &str) -> Result<()>;

    /// 检查存储连接
    async fn ping(&self) -> Result<()>;

    /// 按插入顺序返回全部记录
    async fn find_all(&self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        self.find_all_into(&mut records).await?;
        Ok(records)
    }
}

/// 根据配置连接权威存储
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    let url = config.connection_string.expose_secret();
    match StoreKind::from_connection_string(url)? {
        StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
        _ => Ok(Arc::new(SqlStore::connect(config).await?)),
    }
}
