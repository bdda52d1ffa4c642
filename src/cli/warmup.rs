use crate::app::App;
use crate::cli::WarmupArgs;
use crate::sync::WarmupReport;
use crate::telemetry::init_tracing;
use anyhow::{Context, Result};

pub async fn execute(args: &WarmupArgs) -> Result<()> {
    let mut config = super::load_config(args.config.as_ref())?;
    init_tracing(&config.telemetry, env!("CARGO_PKG_NAME"))?;

    // 显式调用时总是执行
    config.warmup.enabled = true;

    let app = App::bootstrap(config)
        .await
        .context("Failed to initialise record service")?;

    println!("Starting cache warmup...");
    let report = app.warmup.run(&app.engine).await?;
    display_report(&report);
    Ok(())
}

fn display_report(report: &WarmupReport) {
    println!("=== Warmup Report ===\n");
    println!("Status:          ✅ COMPLETED");
    println!("Loaded Items:    {}", report.loaded);
    println!("Failed Items:    {}", report.failed);
}
