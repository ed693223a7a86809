//! Early port checks before the server starts
//!
//! A free port can still be taken between the check and the real bind; these
//! checks only give a clearer error at startup.

use tokio::net::TcpListener;
use tracing::{debug, error, warn};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

/// Reject port 0 and warn about privileged ports
pub fn validate_port_range(port: u16) -> Result<()> {
    if port == 0 {
        return Err(ServerError::ConfigError(
            "Port cannot be 0 for the public listener".to_string(),
        ));
    }
    if port < 1024 {
        warn!(port, "Privileged port requires elevated permissions");
    }
    Ok(())
}

pub async fn is_port_in_use(host: &str, port: u16) -> bool {
    TcpListener::bind((host, port)).await.is_err()
}

/// Range check plus a trial bind of the configured address
pub async fn validate_port_available(config: &ServerConfig) -> Result<()> {
    validate_port_range(config.port)?;
    let addr = config.http_addr()?;
    debug!(%addr, "Checking HTTP port");

    match TcpListener::bind(addr).await {
        Ok(listener) => {
            drop(listener);
            Ok(())
        }
        Err(e) => {
            error!(%addr, %e, "HTTP port is not available");
            Err(ServerError::port_in_use(config.port, e.to_string()))
        }
    }
}
