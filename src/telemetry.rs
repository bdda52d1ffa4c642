//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了记录服务的日志和链路追踪初始化。

use crate::config::TelemetryConfig;
use crate::error::{Result, SyncError};
use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::trace::TracerProvider as SdkTracerProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// 初始化日志和链路追踪
///
/// 此函数应该在应用程序启动时调用一次。`RUST_LOG` 优先于配置中的日志级别。
///
/// # 参数
///
/// * `config` - 遥测配置
/// * `service_name` - 服务名称，用作 tracer 名称
pub fn init_tracing(config: &TelemetryConfig, service_name: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| SyncError::Config(format!("Invalid log level '{}': {}", config.level, e)))?;

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    let otel_layer = if config.opentelemetry {
        // 没有配置导出器，span 只在进程内可见
        let provider = SdkTracerProvider::builder().build();
        global::set_tracer_provider(provider.clone());
        let tracer = provider.tracer(service_name.to_string());
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    Registry::default()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| SyncError::Config(format!("Failed to install subscriber: {}", e)))
}
