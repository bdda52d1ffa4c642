//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了启动时的缓存预热。

use super::context::RequestContext;
use super::engine::SyncEngine;
use crate::config::WarmupConfig;
use crate::error::{Result, SyncError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// 启动预热管理器
pub struct WarmupManager {
    config: WarmupConfig,
    status: Arc<RwLock<WarmupStatus>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WarmupStatus {
    Pending,
    InProgress,
    Completed {
        loaded: usize,
        failed: usize,
        finished_at: DateTime<Utc>,
    },
    Failed {
        error: String,
    },
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WarmupReport {
    pub loaded: usize,
    pub failed: usize,
}

impl WarmupManager {
    pub fn new(config: WarmupConfig) -> Self {
        Self {
            config,
            status: Arc::new(RwLock::new(WarmupStatus::Pending)),
        }
    }

    pub async fn status(&self) -> WarmupStatus {
        self.status.read().await.clone()
    }

    /// 执行一次预热
    ///
    /// 禁用时直接返回空报告；读取存储失败或超时返回错误，状态记为 `Failed`。
    /// 缓存写入阶段到达截止时间时返回部分报告
    pub async fn run(&self, engine: &SyncEngine) -> Result<WarmupReport> {
        info!("Starting cache warmup, enabled: {}", self.config.enabled);

        if !self.config.enabled {
            info!("Cache warmup is disabled, skipping");
            self.set_status(WarmupStatus::Skipped).await;
            return Ok(WarmupReport::default());
        }

        self.set_status(WarmupStatus::InProgress).await;

        // 截止时间只让存储读取失败；缓存阶段超时时剩余记录计为 failed
        let ctx = RequestContext::with_timeout(Duration::from_secs(self.config.timeout_seconds));
        let result = engine.warm_up(&ctx).await;
        if let Err(SyncError::Timeout(_)) = &result {
            warn!(
                "Cache warmup timed out after {} seconds",
                self.config.timeout_seconds
            );
        }

        match &result {
            Ok(report) => {
                info!(
                    "Cache warmup completed: loaded={}, failed={}",
                    report.loaded, report.failed
                );
                self.set_status(WarmupStatus::Completed {
                    loaded: report.loaded,
                    failed: report.failed,
                    finished_at: Utc::now(),
                })
                .await;
            }
            Err(e) => {
                warn!("Cache warmup failed: {}", e);
                self.set_status(WarmupStatus::Failed {
                    error: e.to_string(),
                })
                .await;
            }
        }
        result
    }

    async fn set_status(&self, status: WarmupStatus) {
        *self.status.write().await = status;
    }
}
