//! ClauseGuard server binary.

use clap::Parser;
use clauseguard_server::{config::ServerConfig, start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServerConfig::parse();
    start_server(config).await?;
    Ok(())
}
