//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了请求级对象复用池。
//!
//! 每种记录形态一个强类型池（单条记录、记录集合），由同步引擎持有，
//! 不存在进程级全局状态。取出的槽位由 [`Pooled`] 守卫独占，守卫在任何
//! 退出路径上被 drop 时归还槽位，因此不会在错误分支上遗漏归还。

use crate::config::PoolConfig;
use crate::model::Record;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// 可复用对象特征
///
/// `reset` 在每次取出时调用，必须清除上一次使用留下的全部内容。
pub trait Reusable: Default + Send {
    fn reset(&mut self);
}

impl Reusable for Record {
    fn reset(&mut self) {
        self.id.clear();
        self.name.clear();
    }
}

impl Reusable for Vec<Record> {
    fn reset(&mut self) {
        self.clear();
    }
}

/// 池统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// 新分配的槽位数
    pub allocated: u64,
    /// 复用的槽位数
    pub reused: u64,
    /// 当前空闲槽位数
    pub idle: usize,
}

/// 对象复用池
///
/// 互斥锁保护的空闲列表。取出永不阻塞等待：有空闲槽位则复用，否则新分配。
pub struct Pool<T: Reusable> {
    name: &'static str,
    enabled: bool,
    max_idle: usize,
    free: Mutex<Vec<T>>,
    allocated: AtomicU64,
    reused: AtomicU64,
}

impl<T: Reusable> Pool<T> {
    /// 创建新的对象池
    ///
    /// # 参数
    ///
    /// * `name` - 池名称，用于日志和指标
    /// * `enabled` - 是否启用复用；禁用时每次取出都新分配，归还时直接丢弃
    /// * `max_idle` - 最多保留的空闲槽位数
    pub fn new(name: &'static str, enabled: bool, max_idle: usize) -> Self {
        Self {
            name,
            enabled,
            max_idle,
            free: Mutex::new(Vec::new()),
            allocated: AtomicU64::new(0),
            reused: AtomicU64::new(0),
        }
    }

    /// 创建禁用复用的对象池
    pub fn disabled(name: &'static str) -> Self {
        Self::new(name, false, 0)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 取出一个已重置的槽位
    pub fn acquire(&self) -> Pooled<'_, T> {
        let recycled = if self.enabled {
            self.lock_free().pop()
        } else {
            None
        };

        let mut value = match recycled {
            Some(value) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                value
            }
            None => {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                T::default()
            }
        };
        value.reset();

        Pooled { value, pool: self }
    }

    /// 当前空闲槽位数
    pub fn idle(&self) -> usize {
        self.lock_free().len()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.allocated.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            idle: self.idle(),
        }
    }

    fn release(&self, value: T) {
        if !self.enabled {
            return;
        }
        let mut free = self.lock_free();
        if free.len() < self.max_idle {
            free.push(value);
        }
    }

    // 空闲列表中的槽位不被任何任务持有，锁中毒时内容仍然可用
    fn lock_free(&self) -> MutexGuard<'_, Vec<T>> {
        self.free.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Reusable> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("max_idle", &self.max_idle)
            .field("stats", &self.stats())
            .finish()
    }
}

/// 池化槽位守卫
///
/// 独占持有一个槽位，drop 时归还到所属的池。
pub struct Pooled<'a, T: Reusable> {
    value: T,
    pool: &'a Pool<T>,
}

impl<T: Reusable> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Reusable> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Reusable + fmt::Debug> fmt::Debug for Pooled<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pooled").field(&self.value).finish()
    }
}

impl<T: Reusable> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        let value = std::mem::take(&mut self.value);
        self.pool.release(value);
    }
}

/// 同步引擎使用的池集合
#[derive(Debug)]
pub struct PoolSet {
    /// 单条记录池
    pub records: Pool<Record>,
    /// 记录集合池
    pub collections: Pool<Vec<Record>>,
}

impl PoolSet {
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            records: Pool::new("record", config.enabled, config.max_idle),
            collections: Pool::new("record_collection", config.enabled, config.max_idle),
        }
    }

    /// 禁用复用的池集合，结果必须与启用时完全一致
    pub fn disabled() -> Self {
        Self {
            records: Pool::disabled("record"),
            collections: Pool::disabled("record_collection"),
        }
    }
}

impl Default for PoolSet {
    fn default() -> Self {
        Self::new(&PoolConfig::default())
    }
}
