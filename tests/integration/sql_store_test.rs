//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! SQL存储集成测试（SeaORM + SQLite）

#[path = "../common/mod.rs"]
mod common;

use common::{build_engine, setup_logging};
use oxrecord::backend::MemoryBackend;
use oxrecord::config::StoreConfig;
use oxrecord::error::SyncError;
use oxrecord::store::{RecordStore, SqlStore};
use oxrecord::{PoolSet, Record, RequestContext};
use secrecy::SecretString;
use std::sync::Arc;

fn sqlite_config(url: &str) -> StoreConfig {
    StoreConfig {
        connection_string: SecretString::new(url.to_string().into()),
        ..Default::default()
    }
}

async fn memory_store() -> SqlStore {
    let store = SqlStore::connect(&sqlite_config("sqlite::memory:"))
        .await
        .expect("sqlite memory store should open");
    store.ensure_schema().await.unwrap();
    store
}

#[tokio::test]
async fn test_sqlite_crud() {
    setup_logging();
    let store = memory_store().await;

    assert_eq!(store.name(), "sqlite");
    let pk = store.insert(&Record::new("u1", "Ada")).await.unwrap();
    assert_eq!(pk, "1");

    assert_eq!(store.find_one("u1").await.unwrap(), Record::new("u1", "Ada"));

    store.update_name("u1", "Ada L.").await.unwrap();
    assert_eq!(store.find_one("u1").await.unwrap().name, "Ada L.");

    // 名称未变化的更新仍然成功
    store.update_name("u1", "Ada L.").await.unwrap();

    store.delete("u1").await.unwrap();
    assert!(matches!(
        store.find_one("u1").await,
        Err(SyncError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_sqlite_missing_records() {
    let store = memory_store().await;

    assert!(matches!(
        store.update_name("ghost", "x").await,
        Err(SyncError::NotFound(_))
    ));
    assert!(matches!(
        store.delete("ghost").await,
        Err(SyncError::NotFound(_))
    ));
    assert!(store.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sqlite_unique_index_rejects_duplicates() {
    let store = memory_store().await;

    store.insert(&Record::new("u1", "Ada")).await.unwrap();
    let err = store.insert(&Record::new("u1", "Eve")).await.unwrap_err();
    assert!(matches!(err, SyncError::Store(_)));
    assert_eq!(store.find_one("u1").await.unwrap().name, "Ada");
}

#[tokio::test]
async fn test_sqlite_find_all_in_insertion_order() {
    let store = memory_store().await;

    for (id, name) in [("c", "3"), ("a", "1"), ("b", "2")] {
        store.insert(&Record::new(id, name)).await.unwrap();
    }

    let ids: Vec<String> = store
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["c", "a", "b"]);

    // 追加而不是覆盖
    let mut out = vec![Record::new("x", "existing")];
    store.find_all_into(&mut out).await.unwrap();
    assert_eq!(out.len(), 4);
    assert_eq!(out[0].id, "x");
}

#[tokio::test]
async fn test_sqlite_schema_is_idempotent() {
    let store = memory_store().await;
    store.insert(&Record::new("u1", "Ada")).await.unwrap();

    store.ensure_schema().await.unwrap();
    assert_eq!(store.find_all().await.unwrap().len(), 1);
    store.ping().await.unwrap();
}

#[tokio::test]
async fn test_sqlite_file_store_persists_across_connections() {
    setup_logging();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("records.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());

    {
        let store = SqlStore::connect(&sqlite_config(&url)).await.unwrap();
        store.ensure_schema().await.unwrap();
        store.insert(&Record::new("u1", "Ada")).await.unwrap();
        store.insert(&Record::new("u2", "Grace")).await.unwrap();
    }

    let store = SqlStore::connect(&sqlite_config(&url)).await.unwrap();
    store.ensure_schema().await.unwrap();
    assert!(path.exists());
    assert_eq!(store.find_all().await.unwrap().len(), 2);
    assert_eq!(store.insert(&Record::new("u3", "Linus")).await.unwrap(), "3");
}

#[tokio::test]
async fn test_engine_over_sqlite() {
    setup_logging();

    let store = Arc::new(memory_store().await);
    let engine = build_engine(store, Arc::new(MemoryBackend::new()), PoolSet::default());
    let ctx = RequestContext::background();

    assert_eq!(
        engine.create(&ctx, &Record::new("u1", "Ada")).await.unwrap(),
        "1"
    );
    engine.update(&ctx, "u1", "Ada L.").await.unwrap();
    assert_eq!(engine.read_one(&ctx, "u1").await.unwrap().name, "Ada L.");

    engine.delete(&ctx, "u1").await.unwrap();
    assert!(matches!(
        engine.read_one(&ctx, "u1").await,
        Err(SyncError::NotFound(_))
    ));
    assert!(engine.read_all(&ctx).await.unwrap().is_empty());
}
