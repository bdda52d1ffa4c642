//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步引擎，在缓存和权威存储之间编排读写路径。

use super::context::RequestContext;
use super::warmup::WarmupReport;
use crate::client::RecordCache;
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::metrics::SyncMetrics;
use crate::model::{validate_name, Record};
use crate::pool::{PoolSet, Pooled};
use crate::store::RecordStore;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 同步引擎
///
/// 读路径为旁路缓存：先查缓存，未命中再查存储并回填。写路径为先写存储再写缓存。
/// 缓存失败只记录日志和指标，不会让请求失败；存储失败原样向上传播。
///
/// 读取结果以池化句柄返回，调用方使用完毕后句柄自动归还到池中。
pub struct SyncEngine {
    store: Arc<dyn RecordStore>,
    cache: RecordCache,
    pools: PoolSet,
    config: SyncConfig,
    metrics: Arc<SyncMetrics>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        cache: RecordCache,
        pools: PoolSet,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            cache,
            pools,
            config,
            metrics: Arc::new(SyncMetrics::new()),
        }
    }

    /// 使用外部指标收集器
    pub fn with_metrics(mut self, metrics: Arc<SyncMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<SyncMetrics> {
        &self.metrics
    }

    pub fn pools(&self) -> &PoolSet {
        &self.pools
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// 读取单条记录
    ///
    /// 缓存命中直接返回；未命中（或缓存出错）时查询存储，并尽力回填缓存。
    /// 存储中不存在时返回 `SyncError::NotFound`。
    #[instrument(skip(self, ctx), level = "debug")]
    pub async fn read_one(&self, ctx: &RequestContext, id: &str) -> Result<Pooled<'_, Record>> {
        if id.trim().is_empty() {
            return Err(SyncError::Validation("id must not be empty".to_string()));
        }

        let mut slot = self.pools.records.acquire();

        match ctx.run("cache_get", self.cache.get(id)).await {
            Ok(Some(record)) if self.is_hit(&record) => {
                debug!("Cache hit for record {}", id);
                self.metrics.record("read_one", "cache_hit");
                slot.assign(&record.id, &record.name);
                return Ok(slot);
            }
            Ok(_) => {
                debug!("Cache miss for record {}", id);
            }
            Err(e) => self.cache_failure("get", id, &e),
        }

        let record = ctx.run("find_one", self.store.find_one(id)).await?;
        slot.assign(&record.id, &record.name);
        self.metrics.record("read_one", "store_hit");

        self.best_effort("populate", id, self.cache.set(id, &slot))
            .await;
        Ok(slot)
    }

    /// 读取全部记录
    ///
    /// 缓存中枚举到任何记录时以缓存结果为准，不与存储合并。
    /// 缓存为空或出错时回退到存储，回退结果不回填缓存。
    #[instrument(skip(self, ctx), level = "debug")]
    pub async fn read_all(&self, ctx: &RequestContext) -> Result<Pooled<'_, Vec<Record>>> {
        let mut slot = self.pools.collections.acquire();

        match self.read_all_cached(ctx, &mut slot).await {
            Ok(()) if !slot.is_empty() => {
                debug!("Serving {} records from cache", slot.len());
                self.metrics.record("read_all", "cache");
                return Ok(slot);
            }
            Ok(()) => {}
            Err(e) => {
                slot.clear();
                self.cache_failure("read_all", "*", &e);
            }
        }

        ctx.run("find_all", self.store.find_all_into(&mut slot))
            .await?;
        self.metrics.record("read_all", "store");
        Ok(slot)
    }

    async fn read_all_cached(&self, ctx: &RequestContext, out: &mut Vec<Record>) -> Result<()> {
        let pattern = self.cache.all_pattern();
        let ids = ctx.run("cache_scan", self.cache.list_keys(&pattern)).await?;
        if ids.is_empty() {
            return Ok(());
        }

        let mut found = ctx.run("cache_mget", self.cache.multi_get(&ids)).await?;
        out.reserve(found.len());
        for id in &ids {
            if let Some(record) = found.remove(id) {
                if self.is_hit(&record) {
                    out.push(record);
                }
            }
        }
        Ok(())
    }

    /// 创建记录，返回存储生成的标识
    ///
    /// 存储写入成功后才写缓存；缓存写入失败不影响返回值
    #[instrument(skip(self, ctx, record), level = "debug", fields(id = %record.id))]
    pub async fn create(&self, ctx: &RequestContext, record: &Record) -> Result<String> {
        record.validate()?;

        let store_id = ctx.run("insert", self.store.insert(record)).await?;
        self.metrics.record("create", "ok");

        self.best_effort("write_through", &record.id, self.cache.set(&record.id, record))
            .await;
        Ok(store_id)
    }

    /// 更新记录名称
    #[instrument(skip(self, ctx), level = "debug")]
    pub async fn update(&self, ctx: &RequestContext, id: &str, name: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(SyncError::Validation("id must not be empty".to_string()));
        }
        validate_name(name)?;

        ctx.run("update_name", self.store.update_name(id, name))
            .await?;
        self.metrics.record("update", "ok");

        let mut slot = self.pools.records.acquire();
        slot.assign(id, name);
        self.best_effort("write_through", id, self.cache.set(id, &slot))
            .await;
        Ok(())
    }

    /// 删除记录
    ///
    /// 存储删除成功后使缓存条目失效
    #[instrument(skip(self, ctx), level = "debug")]
    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(SyncError::Validation("id must not be empty".to_string()));
        }

        ctx.run("delete", self.store.delete(id)).await?;
        self.metrics.record("delete", "ok");

        self.best_effort("invalidate", id, self.cache.delete(id))
            .await;
        Ok(())
    }

    /// 把存储中的全部记录加载到缓存
    ///
    /// 读取存储失败时返回错误；单条缓存写入失败只计入 `failed`，
    /// 写入阶段到达截止时间时剩余记录全部计入 `failed`
    #[instrument(skip(self, ctx), level = "info")]
    pub async fn warm_up(&self, ctx: &RequestContext) -> Result<WarmupReport> {
        let mut records = self.pools.collections.acquire();
        ctx.run("find_all", self.store.find_all_into(&mut records))
            .await?;

        let mut report = WarmupReport::default();
        for (index, record) in records.iter().enumerate() {
            match ctx.run("cache_set", self.cache.set(&record.id, record)).await {
                Ok(()) => report.loaded += 1,
                Err(e @ (SyncError::Timeout(_) | SyncError::Cancelled)) => {
                    let remaining = records.len() - index;
                    warn!("Warmup stopped with {} records left: {}", remaining, e);
                    report.failed += remaining;
                    break;
                }
                Err(e) => {
                    warn!("Failed to warm record {}: {}", record.id, e);
                    report.failed += 1;
                }
            }
        }

        self.metrics.add("warmup", "loaded", report.loaded as u64);
        self.metrics.add("warmup", "failed", report.failed as u64);
        info!(
            "Warmed {} records into cache ({} failed)",
            report.loaded, report.failed
        );
        Ok(report)
    }

    /// 检查缓存和存储连接
    ///
    /// 返回 (缓存可用, 存储可用)
    pub async fn health(&self) -> (bool, bool) {
        let (cache, store) = futures::join!(self.cache.ping(), self.store.ping());
        (cache.is_ok(), store.is_ok())
    }

    /// 以文本格式输出计数器和池统计
    pub fn render_metrics(&self) -> String {
        self.metrics.render(&[
            (self.pools.records.name(), self.pools.records.stats()),
            (self.pools.collections.name(), self.pools.collections.stats()),
        ])
    }

    fn is_hit(&self, record: &Record) -> bool {
        !(self.config.empty_name_is_miss && record.name.is_empty())
    }

    async fn best_effort<F>(&self, op: &'static str, id: &str, fut: F)
    where
        F: Future<Output = Result<()>>,
    {
        if let Err(e) = fut.await {
            self.cache_failure(op, id, &e);
        }
    }

    fn cache_failure(&self, op: &'static str, id: &str, error: &SyncError) {
        warn!(op, id, "Cache operation failed, continuing with store: {}", error);
        self.metrics.record("cache", "failure");
    }
}
