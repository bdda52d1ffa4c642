//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 工具模块
//!
//! 提供日志脱敏等通用函数

pub mod redaction;

pub use redaction::{redact_connection_string, redact_value};
