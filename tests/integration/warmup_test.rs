//! 启动预热测试
//!
//! 覆盖预热后的缓存命中、单条写入失败、缓存写入缓慢、禁用和存储失败

#[path = "../common/mod.rs"]
mod common;

use common::{build_engine, setup_logging, CountingStore, RejectingCacheBackend, SlowCacheBackend};
use oxrecord::backend::MemoryBackend;
use oxrecord::config::WarmupConfig;
use oxrecord::error::SyncError;
use oxrecord::{PoolSet, Record, RequestContext, WarmupManager, WarmupStatus};
use std::sync::Arc;
use std::time::Duration;

fn seed() -> Vec<Record> {
    (1..=5)
        .map(|i| Record::new(format!("u{}", i), format!("user {}", i)))
        .collect()
}

#[tokio::test]
async fn test_reads_after_warmup_hit_cache() {
    setup_logging();

    let store = Arc::new(CountingStore::new(seed()));
    let engine = build_engine(store.clone(), Arc::new(MemoryBackend::new()), PoolSet::default());
    let manager = WarmupManager::new(WarmupConfig::default());

    let report = manager.run(&engine).await.unwrap();
    assert_eq!(report.loaded, 5);
    assert_eq!(report.failed, 0);
    assert!(matches!(
        manager.status().await,
        WarmupStatus::Completed { loaded: 5, failed: 0, .. }
    ));

    let ctx = RequestContext::background();
    for i in 1..=5 {
        let record = engine.read_one(&ctx, &format!("u{}", i)).await.unwrap();
        assert_eq!(record.name, format!("user {}", i));
    }
    assert_eq!(store.find_one_calls(), 0);
    assert_eq!(engine.metrics().get("read_one", "cache_hit"), 5);
    assert_eq!(engine.metrics().get("warmup", "loaded"), 5);

    let all = engine.read_all(&ctx).await.unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(store.find_all_calls(), 1);
}

#[tokio::test]
async fn test_individual_cache_failures_do_not_abort_warmup() {
    setup_logging();

    let backend = Arc::new(RejectingCacheBackend::rejecting(["record:u2", "record:u4"]));
    let store = Arc::new(CountingStore::new(seed()));
    let engine = build_engine(store, backend.clone(), PoolSet::default());

    let report = engine
        .warm_up(&RequestContext::background())
        .await
        .unwrap();

    assert_eq!(report.loaded, 3);
    assert_eq!(report.failed, 2);
    assert_eq!(backend.inner.len(), 3);
}

#[tokio::test]
async fn test_disabled_warmup_is_skipped() {
    let store = Arc::new(CountingStore::new(seed()));
    let engine = build_engine(store.clone(), Arc::new(MemoryBackend::new()), PoolSet::default());
    let manager = WarmupManager::new(WarmupConfig {
        enabled: false,
        ..Default::default()
    });

    let report = manager.run(&engine).await.unwrap();
    assert_eq!(report.loaded, 0);
    assert_eq!(manager.status().await, WarmupStatus::Skipped);
    assert_eq!(store.find_all_calls(), 0);
}

#[tokio::test]
async fn test_warmup_times_out() {
    let store = Arc::new(CountingStore::new(seed()).with_delay(Duration::from_secs(3)));
    let engine = build_engine(store, Arc::new(MemoryBackend::new()), PoolSet::default());
    let manager = WarmupManager::new(WarmupConfig {
        enabled: true,
        timeout_seconds: 1,
    });

    let err = manager.run(&engine).await.unwrap_err();
    assert!(matches!(err, SyncError::Timeout(_)));
    assert!(matches!(manager.status().await, WarmupStatus::Failed { .. }));
}

/// 缓存写入缓慢时截止时间到达，已写入的保留，剩余计为失败，预热本身不失败
#[tokio::test]
async fn test_slow_cache_gives_partial_report() {
    setup_logging();

    let backend = Arc::new(SlowCacheBackend::new(Duration::from_millis(400)));
    let store = Arc::new(CountingStore::new(seed()));
    let engine = build_engine(store, backend.clone(), PoolSet::default());
    let manager = WarmupManager::new(WarmupConfig {
        enabled: true,
        timeout_seconds: 1,
    });

    let report = manager.run(&engine).await.unwrap();
    assert_eq!(report.loaded + report.failed, 5);
    assert!(report.loaded >= 1);
    assert!(report.failed >= 1);
    assert_eq!(backend.inner.len(), report.loaded);
    assert_eq!(engine.metrics().get("warmup", "failed"), report.failed as u64);
    assert!(matches!(
        manager.status().await,
        WarmupStatus::Completed { loaded, failed, .. } if loaded == report.loaded && failed == report.failed
    ));
}
