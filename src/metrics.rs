//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步引擎的指标收集功能。

use crate::pool::PoolStats;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// 指标收集器
///
/// 计数器按 `op:result` 分组，例如 `read_one:cache_hit`、`cache:failure`。
/// 由引擎持有，不存在全局实例。
#[derive(Debug, Default)]
pub struct SyncMetrics {
    counters: Mutex<BTreeMap<String, u64>>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次操作结果
    ///
    /// # 参数
    ///
    /// * `op` - 操作名称（read_one/read_all/create/update/delete/warmup/cache）
    /// * `result` - 操作结果（cache_hit/store_hit/failure/...）
    pub fn record(&self, op: &str, result: &str) {
        self.add(op, result, 1);
    }

    /// 按数量累加
    pub fn add(&self, op: &str, result: &str, n: u64) {
        let key = format!("{}:{}", op, result);
        *self.lock().entry(key).or_insert(0) += n;
    }

    /// 读取计数器
    pub fn get(&self, op: &str, result: &str) -> u64 {
        self.lock()
            .get(&format!("{}:{}", op, result))
            .copied()
            .unwrap_or(0)
    }

    /// 所有计数器的快照
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.lock().clone()
    }

    /// 将计数器和池统计格式化为文本，用于监控系统采集
    pub fn render(&self, pools: &[(&str, PoolStats)]) -> String {
        let mut output = String::new();
        for (key, value) in self.lock().iter() {
            let (op, result) = key.split_once(':').unwrap_or((key.as_str(), ""));
            output.push_str(&format!(
                "oxrecord_operations_total{{op=\"{}\",result=\"{}\"}} {}\n",
                op, result, value
            ));
        }
        for (name, stats) in pools {
            output.push_str(&format!(
                "oxrecord_pool_allocated_total{{pool=\"{}\"}} {}\n",
                name, stats.allocated
            ));
            output.push_str(&format!(
                "oxrecord_pool_reused_total{{pool=\"{}\"}} {}\n",
                name, stats.reused
            ));
            output.push_str(&format!(
                "oxrecord_pool_idle{{pool=\"{}\"}} {}\n",
                name, stats.idle
            ));
        }
        output
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, u64>> {
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
