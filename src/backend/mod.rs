//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存后端接口，以及Redis和进程内两种实现。

pub mod memory;
pub mod redis;

use crate::config::CacheConfig;
use crate::error::Result;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::sync::Arc;

pub use self::memory::MemoryBackend;
pub use self::redis::RedisBackend;

/// 缓存后端特征
///
/// 以字节为单位的键值操作，记录的编解码由上层的 `RecordCache` 负责
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// 后端名称，用于日志
    fn name(&self) -> &'static str;

    /// 获取缓存值，不存在返回None
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// 一次往返批量获取，结果与 `keys` 按位置一一对应
    async fn mget_bytes(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>>;

    /// 写入缓存值（无过期时间）
    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// 删除缓存项，键不存在不是错误
    async fn delete(&self, key: &str) -> Result<()>;

    /// 枚举匹配glob模式的键
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// 检查连接是否正常
    async fn ping(&self) -> Result<()>;
}

/// 根据配置创建缓存后端
///
/// `memory://` 使用进程内实现，其余按Redis连接串处理
pub async fn connect(config: &CacheConfig) -> Result<Arc<dyn CacheBackend>> {
    if config.connection_string.expose_secret().starts_with("memory://") {
        return Ok(Arc::new(MemoryBackend::new()));
    }
    Ok(Arc::new(RedisBackend::connect(config).await?))
}
