//! HTTP server, logging and metrics configuration.

use std::env;

/// Log output format for the tracing subscriber
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Configuration for the HTTP listener and ambient observability
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub log_format: LogFormat,
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let bind_address =
            env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

        let log_format = match env::var("LOG_FORMAT").map(|v| v.to_lowercase()) {
            Ok(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let metrics_enabled = env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        Self {
            bind_address,
            log_format,
            metrics_enabled,
        }
    }
}
