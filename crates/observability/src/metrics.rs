//! Prometheus metrics
//!
//! Without an installed exporter every handle is a no-op, so the metric sets
//! can be created unconditionally.

use metrics::{counter, histogram, Counter, Histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Start the Prometheus exporter on `0.0.0.0:port` (`/metrics`).
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Which kind of pricing table a measurement belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    SingleOption,
    Strategy,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::SingleOption => "single_option",
            TableKind::Strategy => "strategy",
        }
    }
}

/// Table generation metrics
///
/// * `pricing_tables_total{kind}` - tables generated
/// * `pricing_table_errors_total{kind,reason}` - failed generations
/// * `pricing_table_duration_seconds{kind}` - generation time
/// * `pricing_table_cells{kind}` - cells per table
#[derive(Clone)]
pub struct EngineMetrics {
    kind: TableKind,
    tables_total: Counter,
    duration: Histogram,
    cells: Histogram,
}

impl EngineMetrics {
    pub fn new(kind: TableKind) -> Self {
        let label = kind.as_str();
        Self {
            kind,
            tables_total: counter!("pricing_tables_total", "kind" => label),
            duration: histogram!("pricing_table_duration_seconds", "kind" => label),
            cells: histogram!("pricing_table_cells", "kind" => label),
        }
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn record_table(&self, elapsed: Duration, cells: usize) {
        self.tables_total.increment(1);
        self.duration.record(elapsed.as_secs_f64());
        self.cells.record(cells as f64);
    }

    pub fn record_error(&self, reason: &'static str) {
        counter!(
            "pricing_table_errors_total",
            "kind" => self.kind.as_str(),
            "reason" => reason
        )
        .increment(1);
    }
}

/// Per-route HTTP metrics
///
/// * `http_requests_total{route,status}`
/// * `http_request_duration_seconds{route}`
#[derive(Clone)]
pub struct RouteMetrics {
    route: String,
    duration: Histogram,
}

impl RouteMetrics {
    pub fn new(route: impl Into<String>) -> Self {
        let route = route.into();
        Self {
            duration: histogram!("http_request_duration_seconds", "route" => route.clone()),
            route,
        }
    }

    pub fn record_request(&self, duration: Duration, status_code: u16) {
        counter!(
            "http_requests_total",
            "route" => self.route.clone(),
            "status" => status_code.to_string()
        )
        .increment(1);
        self.duration.record(duration.as_secs_f64());
    }

    pub fn route(&self) -> &str {
        &self.route
    }
}

/// Records the request duration when dropped
///
/// ```ignore
/// let metrics = RouteMetrics::new("/api/calculate");
/// let mut guard = RequestMetricsGuard::new(&metrics);
/// // ... handle request ...
/// guard.set_status(400);
/// ```
pub struct RequestMetricsGuard<'a> {
    metrics: &'a RouteMetrics,
    start: Instant,
    status_code: u16,
}

impl<'a> RequestMetricsGuard<'a> {
    pub fn new(metrics: &'a RouteMetrics) -> Self {
        Self {
            metrics,
            start: Instant::now(),
            status_code: 200,
        }
    }

    pub fn set_status(&mut self, code: u16) {
        self.status_code = code;
    }
}

impl Drop for RequestMetricsGuard<'_> {
    fn drop(&mut self) {
        self.metrics.record_request(self.start.elapsed(), self.status_code);
    }
}
