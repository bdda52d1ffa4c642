//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! Redis集成测试，Redis不可用时跳过

#[path = "../common/mod.rs"]
mod common;

use common::{is_redis_available, redis_url, setup_logging, unique_prefix, CountingStore};
use oxrecord::backend::{CacheBackend, RedisBackend};
use oxrecord::codec::RecordCodec;
use oxrecord::config::{CacheConfig, SyncConfig};
use oxrecord::{PoolSet, Record, RecordCache, RequestContext, SyncEngine};
use secrecy::SecretString;
use std::sync::Arc;

fn redis_config() -> CacheConfig {
    CacheConfig {
        connection_string: SecretString::new(redis_url().into()),
        ..Default::default()
    }
}

async fn cleanup(backend: &RedisBackend, prefix: &str) {
    let keys = backend
        .scan_keys(&format!("{}:*", prefix))
        .await
        .unwrap_or_default();
    for key in keys {
        let _ = backend.delete(&key).await;
    }
}

#[tokio::test]
async fn test_redis_backend_basic_operations() {
    setup_logging();
    if !is_redis_available().await {
        println!("跳过测试: Redis不可用");
        return;
    }

    let backend = RedisBackend::connect(&redis_config()).await.unwrap();
    let prefix = unique_prefix("basic");
    let key = format!("{}:u1", prefix);

    backend.ping().await.unwrap();
    assert_eq!(backend.get_bytes(&key).await.unwrap(), None);

    backend.set_bytes(&key, b"hello".to_vec()).await.unwrap();
    assert_eq!(backend.get_bytes(&key).await.unwrap(), Some(b"hello".to_vec()));

    let keys = vec![key.clone(), format!("{}:missing", prefix)];
    let values = backend.mget_bytes(&keys).await.unwrap();
    assert_eq!(values, vec![Some(b"hello".to_vec()), None]);
    assert!(backend.mget_bytes(&[]).await.unwrap().is_empty());

    assert_eq!(
        backend.scan_keys(&format!("{}:*", prefix)).await.unwrap(),
        vec![key.clone()]
    );

    backend.delete(&key).await.unwrap();
    backend.delete(&key).await.unwrap();
    assert_eq!(backend.get_bytes(&key).await.unwrap(), None);
}

#[tokio::test]
async fn test_engine_with_redis_cache() {
    setup_logging();
    if !is_redis_available().await {
        println!("跳过测试: Redis不可用");
        return;
    }

    let backend = Arc::new(RedisBackend::connect(&redis_config()).await.unwrap());
    let prefix = unique_prefix("engine");
    let store = Arc::new(CountingStore::new(vec![
        Record::new("u1", "Ada"),
        Record::new("u2", "Grace"),
    ]));

    let cache = RecordCache::new(backend.clone(), RecordCodec::GzipJson, prefix.clone());
    let engine = SyncEngine::new(store.clone(), cache, PoolSet::default(), SyncConfig::default());
    let ctx = RequestContext::background();

    let report = engine.warm_up(&ctx).await.unwrap();
    assert_eq!(report.loaded, 2);

    assert_eq!(engine.read_one(&ctx, "u2").await.unwrap().name, "Grace");
    assert_eq!(store.find_one_calls(), 0);

    let all = engine.read_all(&ctx).await.unwrap();
    let mut ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["u1", "u2"]);
    drop(all);

    engine.delete(&ctx, "u1").await.unwrap();
    assert!(engine.read_one(&ctx, "u1").await.is_err());

    cleanup(&backend, &prefix).await;
}
