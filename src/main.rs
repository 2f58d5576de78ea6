//! Authenticating edge gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ route table ─▶ auth gate ─▶ header projection ─▶ backend
//!                        │              │ 404          │ 401                            │
//!                        │              ▼              ▼                                │
//!     Client Response    │         error body     error body                            │
//!     ◀──────────────────┴──── response normalizer ◀─────────────────────────────────────┘
//! ```
//!
//! The gateway is the only component that validates access tokens. Backends
//! trust the identity headers it sets and nothing else.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use edge_gateway::config::load_config;
use edge_gateway::lifecycle::shutdown_signal;
use edge_gateway::observability::{logging, metrics};
use edge_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "edge-gateway")]
#[command(about = "Authenticating edge gateway for backend services")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "GATEWAY_CONFIG", default_value = "config/gateway.toml")]
    config: PathBuf,

    /// Validate configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Gateway exited with error");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    cli: Cli,
    config: edge_gateway::GatewayConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "edge-gateway starting"
    );

    let bind_address = config.listener.bind_address.clone();
    let metrics_enabled = config.observability.metrics_enabled;
    let metrics_address = config.observability.metrics_address.clone();

    let server = HttpServer::new(config)?;

    if cli.check {
        tracing::info!("Configuration is valid");
        return Ok(());
    }

    if metrics_enabled {
        metrics::init_metrics(metrics_address.parse()?)?;
    }

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
