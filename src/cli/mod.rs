//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了CLI命令行接口。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "oxrecord")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(name = "serve", about = "Warm the cache and serve the HTTP API")]
    Serve(ServeArgs),

    #[command(name = "warmup", about = "Load every stored record into the cache once")]
    Warmup(WarmupArgs),

    #[command(name = "status", about = "Check store and cache reachability")]
    Status(StatusArgs),
}

#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[arg(short, long, env = "OXRECORD_CONFIG", help = "Path to the TOML config file")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct WarmupArgs {
    #[arg(short, long, env = "OXRECORD_CONFIG", help = "Path to the TOML config file")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    #[arg(short, long, env = "OXRECORD_CONFIG", help = "Path to the TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Output in JSON format")]
    pub json: bool,
}

mod serve;
mod status;
mod warmup;

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve(args) => serve::execute(args).await,
        Commands::Warmup(args) => warmup::execute(args).await,
        Commands::Status(args) => status::execute(args).await,
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    Config::load(path.map(PathBuf::as_path)).with_context(|| match path {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load default config".to_string(),
    })
}
