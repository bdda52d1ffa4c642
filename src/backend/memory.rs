//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了进程内缓存后端，用于测试和无Redis的单机部署。

use super::CacheBackend;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use tracing::{debug, instrument};

/// 进程内缓存后端
///
/// 语义与Redis后端保持一致：无过期、删除不存在的键不报错、按glob模式枚举键
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 直接写入原始字节，测试中用于构造损坏条目
    pub fn insert_raw(&self, key: impl Into<String>, value: Vec<u8>) {
        self.entries.insert(key.into(), value);
    }

    /// 清空所有条目
    pub fn flush(&self) {
        self.entries.clear();
    }
}

/// 将Redis风格的glob模式转换为正则表达式
///
/// 支持 `*`、`?` 和 `[...]` 字符类，`\` 转义下一个字符
pub(crate) fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '[' => {
                re.push('[');
                for inner in chars.by_ref() {
                    if inner == ']' {
                        break;
                    }
                    if inner == '\\' {
                        re.push_str("\\\\");
                    } else {
                        re.push(inner);
                    }
                }
                re.push(']');
            }
            '\\' => {
                if let Some(escaped) = chars.next() {
                    re.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|e| SyncError::Cache(format!("invalid key pattern {}: {}", pattern, e)))
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn mget_bytes(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        Ok(keys
            .iter()
            .map(|key| self.entries.get(key).map(|entry| entry.value().clone()))
            .collect())
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let matcher = glob_to_regex(pattern)?;
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| matcher.is_match(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort_unstable();
        debug!("Memory scan {} matched {} keys", pattern, keys.len());
        Ok(keys)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
