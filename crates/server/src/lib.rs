//! HTTP server infrastructure for the option calculator
//!
//! Provides the server lifecycle ([`Server`], [`ServerExt`]), an Axum-based
//! [`HttpServer`] that layers CORS, tracing and request metrics over an
//! application router, and signal-driven shutdown.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod port_validator;
pub mod shutdown;
pub mod traits;

pub use self::config::{ServerConfig, DEFAULT_HTTP_PORT};
pub use error::{Result, ServerError};
pub use health::{health_routes, HealthState, HealthStatus};
pub use http::{cors_layer, HttpServer};
pub use port_validator::{is_port_in_use, validate_port_available, validate_port_range};
pub use shutdown::{run_until_shutdown, ShutdownController};
pub use traits::{Server, ServerExt};
