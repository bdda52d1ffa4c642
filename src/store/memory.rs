//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了进程内记录存储。

use super::RecordStore;
use crate::error::{Result, SyncError};
use crate::model::Record;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    next_pk: u64,
    // 主键 -> 记录，按插入顺序迭代
    rows: BTreeMap<u64, Record>,
    // 记录标识符 -> 主键，承担唯一索引的职责
    index: HashMap<String, u64>,
}

/// 进程内记录存储
///
/// 与SQL实现保持相同语义：标识符唯一、按插入顺序返回、主键自增
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建预置了记录的存储
    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Result<Self> {
        let store = Self::new();
        for record in records {
            store.insert_sync(&record)?;
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert_sync(&self, record: &Record) -> Result<String> {
        let mut state = self.lock();
        if state.index.contains_key(&record.id) {
            return Err(SyncError::Store(format!(
                "duplicate key value violates unique index on id: {}",
                record.id
            )));
        }
        state.next_pk += 1;
        let pk = state.next_pk;
        state.rows.insert(pk, record.clone());
        state.index.insert(record.id.clone(), pk);
        Ok(pk.to_string())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn find_one(&self, id: &str) -> Result<Record> {
        let state = self.lock();
        state
            .index
            .get(id)
            .and_then(|pk| state.rows.get(pk))
            .cloned()
            .ok_or_else(|| SyncError::NotFound(id.to_string()))
    }

    async fn find_all_into(&self, out: &mut Vec<Record>) -> Result<()> {
        let state = self.lock();
        out.extend(state.rows.values().cloned());
        Ok(())
    }

    async fn insert(&self, record: &Record) -> Result<String> {
        self.insert_sync(record)
    }

    async fn update_name(&self, id: &str, name: &str) -> Result<()> {
        let mut state = self.lock();
        let pk = *state
            .index
            .get(id)
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
        if let Some(row) = state.rows.get_mut(&pk) {
            row.name = name.to_string();
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        let pk = state
            .index
            .remove(id)
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
        state.rows.remove(&pk);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
