//! Beer tap dispenser service: CLI entry point
//!
//! ```sh
//! # Run with default config (~/.config/beer-tap/config.toml)
//! beer-tap-service
//!
//! # Custom config path and port
//! beer-tap-service --config /etc/beer-tap/config.toml --port 8080
//!
//! # Validate config without starting
//! beer-tap-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use beer_tap::config::{default_config_path, AppConfig};
use beer_tap::server::{init_tracing, ServerHandle, ServerOptions};

#[derive(Parser, Debug)]
#[command(
    name = "beer-tap-service",
    version,
    about = "Beer tap dispenser service: open/close tracking and spend billing",
    long_about = "REST API for beer tap dispensers. Records every open/close \
                  as a usage session and bills each by flow volume and time.\n\n\
                  Default config: ~/.config/beer-tap/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "TAP_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    skip_migrations: bool,

    /// Keep dispensers in memory instead of the configured database.
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        if let Some(e) = load_error {
            eprintln!("Configuration is invalid: {}", e);
            std::process::exit(1);
        }
        println!("Configuration is valid");
        println!("   Config file     : {}", config_path.display());
        println!("   API address     : {}", config.server.address());
        println!("   Database        : {}", config.database.url);
        println!("   Log level       : {}", config.logging.level);
        println!("   Price per liter : {}", config.billing.price_per_liter);
        return Ok(());
    }

    init_tracing(&config);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.skip_migrations,
        in_memory: cli.in_memory,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shutdown gracefully.");

    handle.wait().await;
    Ok(())
}
