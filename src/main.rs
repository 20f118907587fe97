//! Cache Relay - caching HTTP forwarding proxy
//!
//! Relays inbound requests to a caller-named target URL and serves repeat
//! requests from a short-lived in-memory response cache.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use cache_relay::{cli::Cli, config::Config, server::RelayServer, setup_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(mut config) => {
            // Apply CLI overrides
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            if let Some(ref host) = cli.host {
                config.server.host = host.clone();
            }
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        cache = config.cache.enabled,
        "Starting cache relay"
    );

    // Create and run the server
    let server = match RelayServer::new(config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create server: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run().await {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Relay shutdown complete");
    ExitCode::SUCCESS
}
