//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存与权威存储之间的同步机制，包括读写路径、请求上下文和启动预热。

pub mod context;
pub mod engine;
pub mod warmup;

pub use context::RequestContext;
pub use engine::SyncEngine;
pub use warmup::{WarmupManager, WarmupReport, WarmupStatus};
