//! HTTP surface for probes and metrics scraping
//!
//! The server runs as its own task next to the scheduler and only reads the
//! shared [`SchedulerState`](crate::scheduler::SchedulerState).

pub mod health;

use std::net::SocketAddr;

use axum::Router;
use thiserror::Error;
use tower_http::trace::TraceLayer;

pub use health::{create_router, AppState, ALIVE_BANNER};

/// Errors from the health server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    BindError {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    ServeError(#[from] std::io::Error),
}

/// Health and metrics HTTP server
pub struct HealthServer {
    addr: SocketAddr,
    state: AppState,
}

impl HealthServer {
    /// Create a server listening on all interfaces at `port`
    pub fn new(port: u16, state: AppState) -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            state,
        }
    }

    /// Address the server binds to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build the router with request tracing
    pub fn build_router(&self) -> Router {
        create_router(self.state.clone()).layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown_signal` resolves
    pub async fn start_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServerError::BindError {
                addr: self.addr,
                source,
            })?;

        tracing::info!(addr = %self.addr, "Health server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        tracing::info!("Health server shutdown complete");
        Ok(())
    }
}
