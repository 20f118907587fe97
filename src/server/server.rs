//! Relay server lifecycle

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, info};

use super::router::{AppState, create_router};
use crate::config::Config;
use crate::{Error, Result};

/// Cache relay server
pub struct RelayServer {
    /// Configuration
    config: Config,
    /// Shared application state
    state: Arc<AppState>,
}

impl RelayServer {
    /// Create a new relay server
    pub fn new(config: Config) -> Result<Self> {
        let state = Arc::new(AppState::new(&config)?);
        Ok(Self { config, state })
    }

    /// Run the relay until a shutdown signal arrives
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

        // Periodic sweep of expired cache entries
        if self.config.cache.enabled {
            let cache = Arc::clone(&self.state.cache);
            let sweep_interval = self.config.cache.sweep_interval;
            let mut shutdown_rx = shutdown_tx.subscribe();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(sweep_interval);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            cache.evict_expired();
                            debug!(size = cache.size(), "Cache sweep completed");
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }
                }
            });
        }

        let app = create_router(Arc::clone(&self.state));
        let listener = TcpListener::bind(addr).await?;

        info!(host = %self.config.server.host, port = self.config.server.port, "Listening");
        info!(
            cache = self.config.cache.enabled,
            ttl = ?self.config.cache.default_ttl,
            timeout = ?self.config.upstream.timeout,
            "Relay ready: ANY /proxy?target=<url>"
        );

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown_tx))
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
