use crate::app::App;
use crate::cli::ServeArgs;
use crate::telemetry::init_tracing;
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn execute(args: &ServeArgs) -> Result<()> {
    let config = super::load_config(args.config.as_ref())?;
    init_tracing(&config.telemetry, env!("CARGO_PKG_NAME"))?;

    let app = App::bootstrap(config)
        .await
        .context("Failed to initialise record service")?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
        }
        signal.cancel();
    });

    app.run(shutdown).await?;
    Ok(())
}
