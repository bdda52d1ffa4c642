//! oxrecord - 旁路缓存记录服务
//!
//! 以Redis（或进程内后端）作为读缓存，以SQL数据库作为权威存储，
//! 提供读穿、写穿、失效和启动预热，并通过HTTP接口对外暴露。

#![doc(html_root_url = "https://docs.rs/oxrecord/0.1.0")]

pub use serde;
pub use serde::{Deserialize, Serialize};
pub use serde_json;
pub use tokio;

pub mod app;
pub mod backend;
pub mod cli;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod model;
pub mod pool;
pub mod store;
pub mod sync;
pub mod telemetry;
pub mod utils;

// Re-export commonly used items
pub use app::App;
pub use client::RecordCache;
pub use config::Config;
pub use error::{ErrorCategory, Result, SyncError};
pub use model::Record;
pub use pool::{PoolSet, Pooled};
pub use store::RecordStore;
pub use sync::{RequestContext, SyncEngine, WarmupManager, WarmupReport, WarmupStatus};

/// oxrecord 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
