//! Server configuration from command-line flags and environment variables.

use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use clap::Parser;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};

use clauseguard_runtime::{provider_from_name, ClauseGuard, RuntimeConfig};

use crate::ServerError;

/// ClauseGuard HTTP API settings.
///
/// Not `Debug`: it carries the API key.
#[derive(Parser, Clone)]
#[command(name = "clauseguard-server", version, about = "ClauseGuard HTTP API")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "CLAUSEGUARD_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on
    #[arg(long, env = "CLAUSEGUARD_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Comma-separated CORS origins; any origin when empty
    #[arg(long, env = "CLAUSEGUARD_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// LLM provider ("none" or "anthropic")
    #[arg(long, env = "CLAUSEGUARD_PROVIDER", default_value = "none")]
    pub provider: String,

    /// Runtime configuration file (YAML or JSON)
    #[arg(long, env = "CLAUSEGUARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// API key for the LLM provider
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// CORS for the configured origins, or any origin when none are set.
    pub fn cors_layer(&self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE]);

        let origins: Vec<&str> = self
            .allowed_origins
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .collect();

        if origins.is_empty() || origins.contains(&"*") {
            return layer.allow_origin(Any);
        }

        let origins: Vec<HeaderValue> = origins
            .into_iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        layer.allow_origin(origins)
    }

    /// Runtime settings from the config file, or defaults.
    pub fn runtime_config(&self) -> Result<RuntimeConfig, ServerError> {
        match &self.config {
            Some(path) => Ok(RuntimeConfig::from_file(path)?),
            None => Ok(RuntimeConfig::default()),
        }
    }

    /// Build the analysis service these settings describe.
    pub fn build_service(&self) -> Result<ClauseGuard, ServerError> {
        let mut builder = ClauseGuard::builder().with_config(self.runtime_config()?);
        if let Some(provider) = provider_from_name(&self.provider, self.api_key.as_deref())? {
            builder = builder.with_provider(provider);
        }
        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ServerConfig {
        ServerConfig::try_parse_from(std::iter::once("clauseguard-server").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.provider, "none");
        assert!(config.config.is_none());
    }

    #[test]
    fn test_bind_addr() {
        let config = parse(&["--bind", "127.0.0.1", "--port", "9090"]);
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn test_origins_are_split() {
        let config = parse(&["--allowed-origins", "http://localhost:3000,https://app.example"]);
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:3000", "https://app.example"]
        );
    }

    #[test]
    fn test_deterministic_service_builds() {
        let service = parse(&[]).build_service().unwrap();
        assert_eq!(service.backend_name(), "deterministic");
    }

    #[test]
    fn test_unknown_provider_fails() {
        assert!(matches!(
            parse(&["--provider", "oracle"]).build_service(),
            Err(ServerError::Provider(_))
        ));
    }

    #[test]
    fn test_missing_config_file_fails() {
        assert!(matches!(
            parse(&["--config", "/nonexistent/clauseguard.yaml"]).build_service(),
            Err(ServerError::Config(_))
        ));
    }
}
