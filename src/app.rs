//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块负责按配置装配存储、缓存和同步引擎。

use crate::backend;
use crate::client::RecordCache;
use crate::config::Config;
use crate::error::Result;
use crate::http::AppState;
use crate::pool::PoolSet;
use crate::store;
use crate::sync::{SyncEngine, WarmupManager};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// 装配完成的服务
pub struct App {
    pub config: Config,
    pub engine: Arc<SyncEngine>,
    pub warmup: Arc<WarmupManager>,
}

impl App {
    /// 连接存储和缓存，确保表结构存在
    ///
    /// 存储或缓存连接失败时启动失败
    #[instrument(skip(config), level = "info", name = "bootstrap")]
    pub async fn bootstrap(config: Config) -> Result<Self> {
        let store = store::connect(&config.store).await?;
        store.ensure_schema().await?;
        info!("Store '{}' ready", store.name());

        let backend = backend::connect(&config.cache).await?;
        let cache = RecordCache::from_config(backend, &config.cache);
        info!("Cache '{}' ready", cache.backend_name());

        let engine = SyncEngine::new(
            store,
            cache,
            PoolSet::new(&config.pool),
            config.sync.clone(),
        );
        let warmup = WarmupManager::new(config.warmup.clone());

        Ok(Self {
            config,
            engine: Arc::new(engine),
            warmup: Arc::new(warmup),
        })
    }

    /// HTTP处理器状态
    pub fn state(&self, shutdown: CancellationToken) -> AppState {
        AppState {
            engine: self.engine.clone(),
            warmup: self.warmup.clone(),
            request_timeout: Duration::from_millis(self.config.server.request_timeout_ms),
            shutdown,
        }
    }

    /// 执行启动预热，然后提供HTTP服务直到 `shutdown` 被取消
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        self.warmup.run(&self.engine).await?;
        crate::http::serve(self.state(shutdown), &self.config.server.bind_addr).await
    }
}
