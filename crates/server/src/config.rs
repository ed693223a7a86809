//! HTTP server configuration

use crate::error::{Result, ServerError};
use ::config::ServerSettings;
use std::net::SocketAddr;
use std::time::Duration;

/// Port the calculator listens on when nothing else is configured
pub const DEFAULT_HTTP_PORT: u16 = 5001;

/// Requests still running after this are answered with 408
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Bind address and browser access rules for the HTTP server
///
/// ```
/// use server::config::ServerConfig;
///
/// let config = ServerConfig::new("127.0.0.1", 5001)
///     .with_allowed_origins(vec!["http://localhost:5173".to_string()]);
/// assert_eq!(config.http_addr().unwrap().port(), 5001);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// 0 binds an ephemeral port
    pub port: u16,
    /// Origins allowed by CORS; empty means same-origin only
    pub allowed_origins: Vec<String>,
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            allowed_origins: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self::new(settings.host.clone(), settings.port)
            .with_allowed_origins(settings.allowed_origins.clone())
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn http_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("0.0.0.0", DEFAULT_HTTP_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings() {
        let settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 6001,
            allowed_origins: vec!["https://example.com".to_string()],
        };
        let config = ServerConfig::from_settings(&settings);

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 6001);
        assert_eq!(config.allowed_origins, vec!["https://example.com".to_string()]);
    }

    #[test]
    fn test_port_override() {
        let config = ServerConfig::default().with_port(7000);
        assert_eq!(config.port, 7000);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_invalid_host() {
        let config = ServerConfig::new("not a host", 80);
        assert!(matches!(config.http_addr(), Err(ServerError::InvalidAddress(_))));
    }
}
