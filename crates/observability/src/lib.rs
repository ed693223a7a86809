//! Logging and metrics for the option calculator
//!
//! - Structured logging via `tracing` with pretty, JSON or compact output
//! - Prometheus exporter plus the engine and HTTP route metric sets
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("optcalc", LogFormat::Pretty)?;
//! observability::metrics::init_metrics(9090)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, EngineMetrics, RequestMetricsGuard, RouteMetrics, TableKind};
