//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了记录服务的配置结构和解析逻辑。

use crate::error::{Result, SyncError};
use crate::store::StoreKind;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;

/// 存储连接串环境变量
pub const ENV_STORE_URL: &str = "OXRECORD_STORE_URL";
/// 兼容旧部署的存储连接串环境变量，取值仍须是受支持的SQL或 `memory://` 连接串
pub const ENV_LEGACY_STORE_URL: &str = "MONGO_URI";
/// 缓存连接串环境变量
pub const ENV_CACHE_URL: &str = "OXRECORD_CACHE_URL";
/// 仅给出Redis主机名时使用的环境变量，端口固定为6379
pub const ENV_REDIS_HOST: &str = "REDIS_HOST";
pub const ENV_BIND_ADDR: &str = "OXRECORD_BIND_ADDR";
pub const ENV_PORT: &str = "PORT";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub config_version: Option<u32>,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub store: StoreConfig,
    pub pool: PoolConfig,
    pub sync: SyncConfig,
    pub warmup: WarmupConfig,
    pub telemetry: TelemetryConfig,
}

/// HTTP服务配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub bind_addr: String,
    /// 单个请求的截止时间（毫秒），0表示不限制
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

/// 缓存配置
///
/// `connection_string` 为 `redis://` 时使用Redis，为 `memory://` 时使用进程内缓存
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct CacheConfig {
    /// 连接字符串
    pub connection_string: SecretString,
    /// 连接超时时间（毫秒）
    pub connection_timeout_ms: u64,
    /// 命令执行超时时间（毫秒）
    pub command_timeout_ms: u64,
    /// 缓存键前缀，键格式为 `<prefix>:<id>`
    pub key_prefix: String,
    /// 是否压缩缓存值
    pub compression: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            connection_string: SecretString::new("redis://localhost:6379".to_string().into()),
            connection_timeout_ms: 5000,
            command_timeout_ms: 3000,
            key_prefix: "record".to_string(),
            compression: false,
        }
    }
}

/// 权威存储配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct StoreConfig {
    /// 连接字符串（sqlite/postgres/mysql，或 `memory://`）
    pub connection_string: SecretString,
    /// 最大连接数
    pub max_connections: u32,
    /// 连接超时时间（毫秒）
    pub connect_timeout_ms: u64,
    /// 记录表名
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            connection_string: SecretString::new(
                "sqlite://./data/records.db?mode=rwc".to_string().into(),
            ),
            max_connections: 10,
            connect_timeout_ms: 5000,
            table: "records".to_string(),
        }
    }
}

/// 对象池配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct PoolConfig {
    /// 是否启用对象复用
    pub enabled: bool,
    /// 每个池最多保留的空闲槽位
    pub max_idle: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_idle: 1024,
        }
    }
}

/// 同步引擎策略配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SyncConfig {
    /// 缓存中名称为空的记录是否按未命中处理
    pub empty_name_is_miss: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            empty_name_is_miss: true,
        }
    }
}

/// 缓存预热配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct WarmupConfig {
    /// 启动时是否自动预热
    pub enabled: bool,
    /// 预热超时时间（秒）
    pub timeout_seconds: u64,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_seconds: 300,
        }
    }
}

/// 日志与链路追踪配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct TelemetryConfig {
    /// 默认日志级别，`RUST_LOG` 优先
    pub level: String,
    /// 是否输出JSON格式日志
    pub json: bool,
    /// 是否挂载 OpenTelemetry 层
    pub opentelemetry: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            opentelemetry: false,
        }
    }
}

impl Config {
    /// 从TOML字符串解析配置
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// 从文件加载配置
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// 加载配置：文件（可选）+ 环境变量覆盖 + 校验
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate().map_err(SyncError::Config)?;
        Ok(config)
    }

    /// 应用环境变量覆盖
    ///
    /// `lookup` 抽象了环境变量读取，便于测试注入
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_STORE_URL).or_else(|| lookup(ENV_LEGACY_STORE_URL)) {
            self.store.connection_string = SecretString::new(url.into());
        }

        if let Some(url) = lookup(ENV_CACHE_URL) {
            self.cache.connection_string = SecretString::new(url.into());
        } else if let Some(host) = lookup(ENV_REDIS_HOST) {
            self.cache.connection_string =
                SecretString::new(format!("redis://{}:6379", host).into());
        }

        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            self.server.bind_addr = addr;
        } else if let Some(port) = lookup(ENV_PORT) {
            self.server.bind_addr = format!("0.0.0.0:{}", port);
        }
    }

    /// 验证配置
    ///
    /// 检查配置的有效性，确保所有必需的字段都已设置，并且值在合理范围内
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(version) = &self.config_version {
            if *version > CONFIG_VERSION {
                return Err(format!(
                    "Configuration version {} is not supported. Current version is {}.",
                    version, CONFIG_VERSION
                ));
            }
        }

        if self.server.bind_addr.trim().is_empty() {
            return Err("server.bind_addr cannot be empty".to_string());
        }

        if self.server.request_timeout_ms > 300_000 {
            return Err("server.request_timeout_ms cannot exceed 300000 ms".to_string());
        }

        let cache_url = self.cache.connection_string.expose_secret();
        if !(cache_url.starts_with("redis://")
            || cache_url.starts_with("rediss://")
            || cache_url.starts_with("memory://"))
        {
            return Err(
                "cache.connection_string must start with redis://, rediss:// or memory://"
                    .to_string(),
            );
        }

        if !(100..=30000).contains(&self.cache.connection_timeout_ms) {
            return Err("cache.connection_timeout_ms must be between 100 and 30000 ms".to_string());
        }

        if !(100..=60000).contains(&self.cache.command_timeout_ms) {
            return Err("cache.command_timeout_ms must be between 100 and 60000 ms".to_string());
        }

        let prefix = &self.cache.key_prefix;
        if prefix.is_empty() || prefix.len() > 64 {
            return Err("cache.key_prefix must be between 1 and 64 characters".to_string());
        }
        if prefix.contains(['*', '?', '[', ']', ':']) {
            return Err(format!(
                "cache.key_prefix '{}' cannot contain glob characters or ':'",
                prefix
            ));
        }

        let store_url = self.store.connection_string.expose_secret().trim();
        if store_url.is_empty() {
            return Err("store.connection_string cannot be empty".to_string());
        }
        if store_url.to_lowercase().starts_with("mongodb") {
            return Err(format!(
                "store.connection_string uses a mongodb:// URL (possibly from {}), which is not supported; \
                 set {} to a sqlite, postgres, mysql or memory:// URL",
                ENV_LEGACY_STORE_URL, ENV_STORE_URL
            ));
        }
        if StoreKind::from_connection_string(store_url).is_err() {
            return Err(
                "store.connection_string must be a sqlite, postgres, mysql or memory:// URL"
                    .to_string(),
            );
        }

        if self.store.max_connections == 0 || self.store.max_connections > 1000 {
            return Err("store.max_connections must be between 1 and 1000".to_string());
        }

        if !(100..=60000).contains(&self.store.connect_timeout_ms) {
            return Err("store.connect_timeout_ms must be between 100 and 60000 ms".to_string());
        }

        let table = &self.store.table;
        let mut chars = table.chars();
        let valid_table = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
                    && table.len() <= 64
            }
            None => false,
        };
        if !valid_table {
            return Err(format!(
                "store.table '{}' must be a plain SQL identifier (letters, digits, underscores)",
                table
            ));
        }

        if self.pool.enabled && self.pool.max_idle > 1_000_000 {
            return Err("pool.max_idle cannot exceed 1,000,000".to_string());
        }

        if self.warmup.enabled {
            if self.warmup.timeout_seconds == 0 {
                return Err("warmup.timeout_seconds cannot be zero".to_string());
            }
            if self.warmup.timeout_seconds > 3600 {
                return Err("warmup.timeout_seconds cannot exceed 3600 seconds".to_string());
            }
        }

        Ok(())
    }
}
