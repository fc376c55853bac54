//! ClauseGuard Server
//!
//! HTTP boundary for the ClauseGuard pipeline: `POST /analyze`,
//! `POST /chat`, and static `GET /` and `GET /health` endpoints.

pub mod config;
pub mod handlers;

use config::ServerConfig;
use handlers::{create_router, AppState};
use tokio::net::TcpListener;
use tracing::info;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Runtime configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] clauseguard_runtime::ConfigError),

    /// LLM provider could not be set up
    #[error("Provider error: {0}")]
    Provider(#[from] clauseguard_runtime::ProviderError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Build the service and serve until the process is stopped.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    let service = config.build_service()?;

    info!(backend = service.backend_name(), "Starting ClauseGuard server");

    let app = create_router(AppState::new(service)).layer(config.cors_layer());

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!(addr = %config.bind_addr(), "Listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
