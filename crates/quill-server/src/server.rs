use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Quill HTTP server.
pub struct QuillServer {
    config: ServerConfig,
    state: AppState,
}

impl QuillServer {
    /// Build a server with an in-memory store from `config`.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let state = AppState::from_config(&config)?;
        Ok(Self { config, state })
    }

    /// Build a server around an existing state.
    pub fn with_state(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), self.config.frontend_url.as_deref())
    }

    /// Serve until Ctrl+C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(addr = %self.config.bind_addr, "quill server listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        info!("quill server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        info!("received Ctrl+C, shutting down");
    }
}
