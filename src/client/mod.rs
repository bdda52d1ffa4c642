//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了类型化的记录缓存客户端。

use crate::backend::CacheBackend;
use crate::codec::RecordCodec;
use crate::config::CacheConfig;
use crate::error::{Result, SyncError};
use crate::model::Record;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{instrument, warn};

/// 记录缓存客户端
///
/// 键格式为 `<prefix>:<id>`，值为编码后的记录。所有后端错误都归一为
/// [`SyncError::Cache`]，由同步引擎决定如何处理。
#[derive(Clone)]
pub struct RecordCache {
    backend: Arc<dyn CacheBackend>,
    codec: RecordCodec,
    prefix: String,
}

impl std::fmt::Debug for RecordCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCache")
            .field("backend", &self.backend.name())
            .field("codec", &self.codec)
            .field("prefix", &self.prefix)
            .finish()
    }
}

fn as_cache_error(e: SyncError) -> SyncError {
    match e {
        SyncError::Cache(_) => e,
        other => SyncError::cache(other),
    }
}

impl RecordCache {
    pub fn new(backend: Arc<dyn CacheBackend>, codec: RecordCodec, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            codec,
            prefix: prefix.into(),
        }
    }

    pub fn from_config(backend: Arc<dyn CacheBackend>, config: &CacheConfig) -> Self {
        Self::new(
            backend,
            RecordCodec::new(config.compression),
            config.key_prefix.clone(),
        )
    }

    /// 记录对应的缓存键
    pub fn key(&self, id: &str) -> String {
        format!("{}:{}", self.prefix, id)
    }

    /// 匹配全部记录键的模式
    pub fn all_pattern(&self) -> String {
        format!("{}:*", self.prefix)
    }

    fn id_from_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
    }

    /// 获取单条记录
    ///
    /// 缓存值无法解码时记录日志并按不存在处理
    #[instrument(skip(self), level = "debug")]
    pub async fn get(&self, id: &str) -> Result<Option<Record>> {
        let key = self.key(id);
        let bytes = self.backend.get_bytes(&key).await.map_err(as_cache_error)?;
        Ok(bytes.and_then(|data| self.decode_entry(&key, &data)))
    }

    /// 一次往返批量获取记录
    ///
    /// 缺失的键不会出现在结果中，也不是错误
    #[instrument(skip(self, ids), level = "debug", fields(id_count = ids.len()))]
    pub async fn multi_get(&self, ids: &[String]) -> Result<HashMap<String, Record>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let keys: Vec<String> = ids.iter().map(|id| self.key(id)).collect();
        let values = self
            .backend
            .mget_bytes(&keys)
            .await
            .map_err(as_cache_error)?;

        let mut found = HashMap::with_capacity(values.len());
        for ((id, key), value) in ids.iter().zip(&keys).zip(values) {
            if let Some(record) = value.and_then(|data| self.decode_entry(key, &data)) {
                found.insert(id.clone(), record);
            }
        }
        Ok(found)
    }

    /// 写入记录（幂等覆盖）
    #[instrument(skip(self, record), level = "debug")]
    pub async fn set(&self, id: &str, record: &Record) -> Result<()> {
        let bytes = self.codec.encode(record).map_err(as_cache_error)?;
        self.backend
            .set_bytes(&self.key(id), bytes)
            .await
            .map_err(as_cache_error)
    }

    /// 删除记录，键不存在不是错误
    #[instrument(skip(self), level = "debug")]
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.backend
            .delete(&self.key(id))
            .await
            .map_err(as_cache_error)
    }

    /// 枚举匹配模式的缓存键，返回其中的记录标识符
    ///
    /// 代价与缓存中的键总数成正比，只适用于中小规模的数据集
    #[instrument(skip(self), level = "debug")]
    pub async fn list_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let keys = self
            .backend
            .scan_keys(pattern)
            .await
            .map_err(as_cache_error)?;
        Ok(keys
            .iter()
            .filter_map(|key| self.id_from_key(key))
            .map(str::to_string)
            .collect())
    }

    /// 检查缓存后端连接
    pub async fn ping(&self) -> Result<()> {
        self.backend.ping().await.map_err(as_cache_error)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn decode_entry(&self, key: &str, data: &[u8]) -> Option<Record> {
        match self.codec.decode(data) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Unable to decode cached value for {}: {}", key, e);
                None
            }
        }
    }
}
