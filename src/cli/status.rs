use crate::backend;
use crate::cli::StatusArgs;
use crate::client::RecordCache;
use crate::config::Config;
use crate::store;
use crate::utils::redact_connection_string;
use anyhow::Result;
use secrecy::ExposeSecret;
use serde::Serialize;

#[derive(Debug, Default, Serialize)]
struct ServiceStatus {
    store_url: String,
    store_backend: Option<&'static str>,
    store_reachable: bool,
    cache_url: String,
    cache_backend: Option<&'static str>,
    cache_reachable: bool,
    cached_records: Option<usize>,
    errors: Vec<String>,
}

pub async fn execute(args: &StatusArgs) -> Result<()> {
    let config = super::load_config(args.config.as_ref())?;
    let status = collect(&config).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status);
    }
    Ok(())
}

async fn collect(config: &Config) -> ServiceStatus {
    let mut status = ServiceStatus {
        store_url: redact_connection_string(config.store.connection_string.expose_secret()),
        cache_url: redact_connection_string(config.cache.connection_string.expose_secret()),
        ..Default::default()
    };

    match store::connect(&config.store).await {
        Ok(store) => {
            status.store_backend = Some(store.name());
            match store.ping().await {
                Ok(()) => status.store_reachable = true,
                Err(e) => status.errors.push(format!("store: {}", e)),
            }
        }
        Err(e) => status.errors.push(format!("store: {}", e)),
    }

    match backend::connect(&config.cache).await {
        Ok(backend) => {
            let cache = RecordCache::from_config(backend, &config.cache);
            status.cache_backend = Some(cache.backend_name());
            match cache.ping().await {
                Ok(()) => status.cache_reachable = true,
                Err(e) => status.errors.push(format!("cache: {}", e)),
            }
            match cache.list_keys(&cache.all_pattern()).await {
                Ok(ids) => status.cached_records = Some(ids.len()),
                Err(e) => status.errors.push(format!("cache: {}", e)),
            }
        }
        Err(e) => status.errors.push(format!("cache: {}", e)),
    }

    status
}

fn print_status(status: &ServiceStatus) {
    println!("=== Record Service Status ===\n");

    let reachability = |ok: bool| if ok { "✅ REACHABLE" } else { "❌ UNREACHABLE" };

    println!("Store:   {} ({})", reachability(status.store_reachable), status.store_url);
    if let Some(name) = status.store_backend {
        println!("Backend: {}", name);
    }
    println!();
    println!("Cache:   {} ({})", reachability(status.cache_reachable), status.cache_url);
    if let Some(name) = status.cache_backend {
        println!("Backend: {}", name);
    }
    if let Some(count) = status.cached_records {
        println!("Cached records: {}", count);
    }

    if !status.errors.is_empty() {
        println!("\nErrors:");
        for error in &status.errors {
            println!("  - {}", error);
        }
    }
}
