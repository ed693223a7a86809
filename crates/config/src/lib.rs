use chrono::NaiveDate;
use serde::de::{Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

/// Root of the YAML configuration file.
///
/// Every section is optional in the file; missing sections fall back to the
/// values in [`defaults`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MasterConfig {
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub market_data: MarketDataStubConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: Option<MetricsConfig>,
}

impl Default for MasterConfig {
    fn default() -> Self {
        generate_default_config()
    }
}

// ==================================================================================
// CALENDAR
// ==================================================================================

/// Exchange session and holiday data.
///
/// Times are Eastern wall-clock `HH:MM`. The daylight-saving offset is picked
/// by calendar month: `dst_start_month..=dst_end_month` use
/// `dst_utc_offset_hours`, every other month uses `standard_utc_offset_hours`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CalendarConfig {
    #[serde(default = "default_market_open")]
    pub market_open: String,
    #[serde(default = "default_market_close")]
    pub market_close: String,
    #[serde(default = "default_standard_utc_offset_hours")]
    pub standard_utc_offset_hours: i32,
    #[serde(default = "default_dst_utc_offset_hours")]
    pub dst_utc_offset_hours: i32,
    #[serde(default = "default_dst_start_month")]
    pub dst_start_month: u32,
    #[serde(default = "default_dst_end_month")]
    pub dst_end_month: u32,
    /// Full-day market closures. Years not listed here have no holidays.
    #[serde(default = "default_us_holidays")]
    pub holidays: Vec<NaiveDate>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            market_open: default_market_open(),
            market_close: default_market_close(),
            standard_utc_offset_hours: default_standard_utc_offset_hours(),
            dst_utc_offset_hours: default_dst_utc_offset_hours(),
            dst_start_month: default_dst_start_month(),
            dst_end_month: default_dst_end_month(),
            holidays: default_us_holidays(),
        }
    }
}

// ==================================================================================
// PRICING
// ==================================================================================

/// Valuation model selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Closed-form European model
    Analytic,
    /// Cox-Ross-Rubinstein tree with early exercise
    #[default]
    Lattice,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Analytic => "analytic",
            ModelKind::Lattice => "lattice",
        }
    }

    /// Parse from string (case-insensitive). `black_scholes` and `binomial`
    /// are accepted as aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "analytic" | "black_scholes" | "black-scholes" => Some(Self::Analytic),
            "lattice" | "binomial" | "crr" => Some(Self::Lattice),
            _ => None,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown pricing model: {}", s))
    }
}

impl Serialize for ModelKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ModelKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ModelKindVisitor;

        impl<'de> Visitor<'de> for ModelKindVisitor {
            type Value = ModelKind;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a pricing model name (analytic or lattice)")
            }

            fn visit_str<E>(self, value: &str) -> Result<ModelKind, E>
            where
                E: serde::de::Error,
            {
                ModelKind::parse(value).ok_or_else(|| {
                    E::invalid_value(serde::de::Unexpected::Str(value), &self)
                })
            }
        }

        deserializer.deserialize_str(ModelKindVisitor)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub model: ModelKind,
    #[serde(default = "default_lattice_steps")]
    pub lattice_steps: u32,
    /// Risk-free rates the price band is computed across
    #[serde(default = "default_candidate_rates")]
    pub candidate_rates: Vec<f64>,
    #[serde(default = "default_days_per_year")]
    pub days_per_year: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            lattice_steps: default_lattice_steps(),
            candidate_rates: default_candidate_rates(),
            days_per_year: default_days_per_year(),
        }
    }
}

// ==================================================================================
// GRID
// ==================================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GridConfig {
    /// Number of time-axis columns, including the start and expiration columns
    #[serde(default = "default_time_columns")]
    pub time_columns: usize,
    /// Increments added below the lowest and above the highest of spot/strikes
    #[serde(default = "default_price_padding_steps")]
    pub price_padding_steps: u32,
    /// Upper bound on the trading-minute walk for a single time-axis slot
    #[serde(default = "default_max_walk_iterations")]
    pub max_walk_iterations: u32,
    /// Largest price axis a single request may produce
    #[serde(default = "default_max_price_rows")]
    pub max_price_rows: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            time_columns: default_time_columns(),
            price_padding_steps: default_price_padding_steps(),
            max_walk_iterations: default_max_walk_iterations(),
            max_price_rows: default_max_price_rows(),
        }
    }
}

// ==================================================================================
// SERVICE SURFACES
// ==================================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
    /// Origins allowed by CORS. An empty list disables cross-origin access.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_http_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

/// Canned quote returned by the market-data endpoint. No feed is queried.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketDataStubConfig {
    #[serde(default = "default_stub_stock_price")]
    pub stock_price: f64,
    /// Percent, e.g. 25.5
    #[serde(default = "default_stub_implied_volatility")]
    pub implied_volatility: f64,
}

impl Default for MarketDataStubConfig {
    fn default() -> Self {
        Self {
            stock_price: default_stub_stock_price(),
            implied_volatility: default_stub_implied_volatility(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// pretty, json or compact
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_aliases() {
        assert_eq!(ModelKind::parse("LATTICE"), Some(ModelKind::Lattice));
        assert_eq!(ModelKind::parse("binomial"), Some(ModelKind::Lattice));
        assert_eq!(ModelKind::parse("black_scholes"), Some(ModelKind::Analytic));
        assert_eq!(ModelKind::parse("monte_carlo"), None);
        assert!("heston".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_model_kind_yaml() {
        let config: PricingConfig = serde_yaml::from_str("model: Analytic").unwrap();
        assert_eq!(config.model, ModelKind::Analytic);
        assert_eq!(config.lattice_steps, 100);

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("model: analytic"));

        let bad: Result<PricingConfig, _> = serde_yaml::from_str("model: heston");
        assert!(bad.is_err());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: MasterConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.grid.time_columns, 13);
        assert_eq!(config.calendar.market_open, "09:30");
        assert_eq!(config.pricing.candidate_rates.len(), 5);
        assert_eq!(config.server.port, 5001);
        assert!(config.metrics.is_none());
    }

    #[test]
    fn test_partial_calendar_section() {
        let yaml = "calendar:\n  holidays: [\"2030-01-01\"]\n";
        let config: MasterConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.calendar.holidays.len(), 1);
        assert_eq!(config.calendar.market_close, "16:00");
    }
}
