//! Greeting content server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ axum (request id, trace, timeout, limits)
//!                        │
//!                        ▼
//!                     routing ──no match──▶ 404
//!                        │ Location (name, RouteConfig)
//!                        ▼
//!                     pipeline content phase
//!                        │  greeting: drain → check → compose → assemble
//!                        │  declined → default content (404)
//!                        ▼
//!     ◀────────────── status + Content-Type + Content-Length (+ body)
//! ```
//!
//! Startup order: CLI → config (load, validate) → logging → metrics →
//! greeting module + pipeline → config watcher → listener.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use hello_server::config::{load_config, watcher::ConfigWatcher, ServerConfig};
use hello_server::greeting::GreetingModule;
use hello_server::http::HttpServer;
use hello_server::lifecycle::{signals, Shutdown};
use hello_server::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "hello-server")]
#[command(about = "Serves location-scoped greetings with optional visit counters", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("hello-server: {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };

    if cli.check {
        println!(
            "hello-server: configuration ok ({} location(s))",
            config.locations.len()
        );
        return ExitCode::SUCCESS;
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("hello-server: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    logging::init_tracing(&config.observability)?;

    tracing::info!("hello-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        locations = config.locations.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    // Module state outlives every config generation.
    let module = Arc::new(GreetingModule::new(config.greeting.counter_scope));

    let (watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };
    // Dropping the watcher stops it.
    let _watcher = watcher;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::trigger_on_signal(&signal_shutdown).await;
    });

    let server = HttpServer::with_module(config, module)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
