// src/main.rs

//! The main entry point for the rconnect relay.

use anyhow::Result;
use rconnect::cli::{self, BOOTSTRAP_LOG_LEVEL};
use rconnect::config::Config;
use rconnect::server;
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::{filter::EnvFilter, prelude::*, reload};

/// Used when `--config` is not given. A missing default file means built-in defaults.
const DEFAULT_CONFIG_PATH: &str = "rconnect.toml";

#[tokio::main]
async fn main() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().collect();
    let cli = match cli::parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if cli.version {
        println!("rconnect version {VERSION}");
        return Ok(());
    }

    // Logging comes up before the config is read so that load and validation
    // warnings are not lost. The configured level is applied afterwards.
    let rust_log = env::var("RUST_LOG").ok();
    let (filter, reload_handle) = reload::Layer::new(EnvFilter::new(cli::log_level(
        rust_log.clone(),
        BOOTSTRAP_LOG_LEVEL,
    )));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact() // Use the compact, single-line format.
                .with_ansi(true),
        )
        .init();

    // An explicit --config path must exist; the default one may be absent.
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut config = match Config::load(config_path, cli.config.is_some()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration from \"{config_path}\": {e:#}");
            std::process::exit(1);
        }
    };

    // PORT from the environment, then --port, override the file.
    if let Ok(port_str) = env::var("PORT") {
        match cli::parse_port(&port_str) {
            Ok(port) => config.port = port,
            Err(e) => {
                error!("PORT: {e}");
                std::process::exit(1);
            }
        }
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(dir) = cli.config_dir {
        config.config_dir = dir;
    }

    if let Err(e) = reload_handle.reload(EnvFilter::new(cli::log_level(rust_log, &config.log_level))) {
        warn!("Failed to apply log level '{}': {}", config.log_level, e);
    }

    info!("Starting rconnect {}.", VERSION);

    if let Err(e) = server::run(config).await {
        error!("Relay runtime error: {:#}", e);
        return Err(e);
    }
    Ok(())
}
