//! Gateway server

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{info, warn};

use super::router::{AppState, create_router};
use crate::bridge::Bridge;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::module::ModuleRegistry;
use crate::render::CollectionRendererFactory;
use crate::{Error, Result};

/// Datatables HTTP server
pub struct Gateway {
    /// Configuration
    config: Config,
    /// Request pipeline
    bridge: Arc<Bridge>,
}

impl Gateway {
    /// Create a new gateway from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn new(config: Config) -> Result<Self> {
        let catalog = Catalog::from_config(&config)?;

        let bridge = Arc::new(Bridge::new(
            catalog.modules,
            catalog.types,
            catalog.resolver,
            Arc::new(CollectionRendererFactory::new(catalog.datasets)),
        ));

        Ok(Self { config, bridge })
    }

    /// Create a gateway around an existing bridge
    #[must_use]
    pub fn with_bridge(config: Config, bridge: Arc<Bridge>) -> Self {
        Self { config, bridge }
    }

    /// HTTP router serving this gateway
    pub fn router(&self) -> Router {
        let state = Arc::new(AppState {
            bridge: Arc::clone(&self.bridge),
        });
        create_router(state, self.config.server.request_timeout)
    }

    /// Run the gateway until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or the listener fails.
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let app = self.router();
        let listener = TcpListener::bind(addr).await?;

        info!("============================================================");
        info!("DATATABLES BRIDGE v{}", env!("CARGO_PKG_VERSION"));
        info!("============================================================");
        info!(host = %self.config.server.host, port = %self.config.server.port, "Listening");
        for module in self.bridge.modules().all() {
            info!(module = %module.name, enabled = module.enabled, "Module");
        }
        for name in self.bridge.types().transformer_names() {
            info!("  transformer {name}");
        }
        info!(
            "  GET  http://{}:{}/datatables/{{module}}/{{transformer}}",
            self.config.server.host, self.config.server.port
        );
        info!("============================================================");

        // In-flight requests get `shutdown_timeout` to drain once a signal arrives
        let shutdown_timeout = self.config.server.shutdown_timeout;
        let (signal_tx, signal_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signal_tx.send(());
            })
            .into_future();
        tokio::pin!(server);

        let drain_deadline = async {
            if signal_rx.await.is_ok() {
                tokio::time::sleep(shutdown_timeout).await;
            } else {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = &mut server => {
                result.map_err(|e| Error::Internal(e.to_string()))?;
            }
            () = drain_deadline => {
                warn!(
                    timeout = ?shutdown_timeout,
                    "Graceful shutdown timed out, dropping connections"
                );
            }
        }

        info!("Server stopped");
        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
