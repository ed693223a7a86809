use crate::*;
use chrono::{Datelike, NaiveTime, Weekday};
use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid time format '{time}' for {field}: {message}")]
    InvalidTimeFormat {
        field: String,
        time: String,
        message: String,
    },

    #[error("Market open {open} must be before market close {close}")]
    InvalidMarketHours { open: String, close: String },

    #[error("{field} must be a UTC offset between -12 and 14 hours, got {value}")]
    InvalidUtcOffset { field: String, value: i32 },

    #[error("DST months must satisfy 1 <= start <= end <= 12, got {start}..={end}")]
    InvalidDstMonths { start: u32, end: u32 },

    #[error("lattice_steps must be at least 1")]
    InvalidLatticeSteps,

    #[error("At least one candidate rate is required")]
    NoCandidateRates,

    #[error("Candidate rate {0} is not a finite number")]
    InvalidCandidateRate(f64),

    #[error("time_columns must be at least 2, got {0}")]
    InvalidTimeColumns(usize),

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("{field} must be a positive float")]
    InvalidPositiveFloat { field: String },

    #[error("Server host is required")]
    MissingServerHost,

    #[error("Invalid log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("Metrics port {0} collides with the HTTP port")]
    MetricsPortCollision(u16),

    #[error("Environment variable '{var}' is missing or invalid: {message}")]
    InvalidEnvVar { var: String, message: String },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub defaults_applied: Vec<DefaultApplied>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            defaults_applied: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_default(&mut self, field: &str, value: &str) {
        self.defaults_applied.push(DefaultApplied {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &MasterConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_calendar(&config.calendar, &mut report);
    validate_pricing(&config.pricing, &mut report);
    validate_grid(&config.grid, &mut report);
    validate_server(&config.server, &mut report);
    validate_observability(config, &mut report);

    report
}

/// Parse an `HH:MM` wall-clock time.
pub fn parse_hh_mm(value: &str) -> Option<NaiveTime> {
    let re = Regex::new(r"^\d{2}:\d{2}$").ok()?;
    if !re.is_match(value) {
        return None;
    }
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

fn validate_calendar(calendar: &CalendarConfig, report: &mut ValidationReport) {
    let open = check_time(&calendar.market_open, "calendar.market_open", report);
    let close = check_time(&calendar.market_close, "calendar.market_close", report);

    if let (Some(open), Some(close)) = (open, close) {
        if open >= close {
            report.add_error(ValidationError::InvalidMarketHours {
                open: calendar.market_open.clone(),
                close: calendar.market_close.clone(),
            });
        }
    }

    for (field, value) in [
        ("calendar.standard_utc_offset_hours", calendar.standard_utc_offset_hours),
        ("calendar.dst_utc_offset_hours", calendar.dst_utc_offset_hours),
    ] {
        if !(-12..=14).contains(&value) {
            report.add_error(ValidationError::InvalidUtcOffset {
                field: field.to_string(),
                value,
            });
        }
    }

    let (start, end) = (calendar.dst_start_month, calendar.dst_end_month);
    if start < 1 || end > 12 || start > end {
        report.add_error(ValidationError::InvalidDstMonths { start, end });
    }

    if calendar.holidays.is_empty() {
        report.add_warning(
            "calendar.holidays",
            "No holidays configured; every weekday is treated as a trading day",
        );
    }

    if !calendar.holidays.windows(2).all(|w| w[0] <= w[1]) {
        report.add_warning("calendar.holidays", "Holidays are not listed in ascending order");
    }

    let mut seen = HashSet::new();
    for day in &calendar.holidays {
        if !seen.insert(*day) {
            report.add_warning("calendar.holidays", &format!("Holiday {} is listed twice", day));
        }
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            report.add_warning(
                "calendar.holidays",
                &format!("Holiday {} falls on a weekend and has no effect", day),
            );
        }
    }
}

fn check_time(value: &str, field: &str, report: &mut ValidationReport) -> Option<NaiveTime> {
    let parsed = parse_hh_mm(value);
    if parsed.is_none() {
        report.add_error(ValidationError::InvalidTimeFormat {
            field: field.to_string(),
            time: value.to_string(),
            message: "expected HH:MM (24-hour)".to_string(),
        });
    }
    parsed
}

fn validate_pricing(pricing: &PricingConfig, report: &mut ValidationReport) {
    if pricing.lattice_steps == 0 {
        report.add_error(ValidationError::InvalidLatticeSteps);
    } else if pricing.lattice_steps > 2000 {
        report.add_warning(
            "pricing.lattice_steps",
            "More than 2000 steps makes every grid cell quadratically slower",
        );
    }

    if pricing.candidate_rates.is_empty() {
        report.add_error(ValidationError::NoCandidateRates);
    }

    for rate in &pricing.candidate_rates {
        if !rate.is_finite() {
            report.add_error(ValidationError::InvalidCandidateRate(*rate));
        }
    }

    if !(pricing.days_per_year.is_finite() && pricing.days_per_year > 0.0) {
        report.add_error(ValidationError::InvalidPositiveFloat {
            field: "pricing.days_per_year".to_string(),
        });
    }
}

fn validate_grid(grid: &GridConfig, report: &mut ValidationReport) {
    if grid.time_columns < 2 {
        report.add_error(ValidationError::InvalidTimeColumns(grid.time_columns));
    }

    if grid.max_walk_iterations == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "grid.max_walk_iterations".to_string(),
        });
    }

    if grid.max_price_rows == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "grid.max_price_rows".to_string(),
        });
    }
}

fn validate_server(server: &ServerSettings, report: &mut ValidationReport) {
    if server.host.trim().is_empty() {
        report.add_error(ValidationError::MissingServerHost);
    } else if has_unresolved_env_vars(&server.host) {
        report.add_error(ValidationError::InvalidEnvVar {
            var: server.host.clone(),
            message: "server.host references an unset environment variable".to_string(),
        });
    }

    if server.allowed_origins.is_empty() {
        report.add_warning(
            "server.allowed_origins",
            "No CORS origins configured; browsers on other origins will be rejected",
        );
    }

    for origin in &server.allowed_origins {
        if has_unresolved_env_vars(origin) {
            report.add_error(ValidationError::InvalidEnvVar {
                var: origin.clone(),
                message: "server.allowed_origins references an unset environment variable"
                    .to_string(),
            });
        }
    }
}

fn validate_observability(config: &MasterConfig, report: &mut ValidationReport) {
    let valid_formats = ["pretty", "json", "compact"];
    if !valid_formats.contains(&config.logging.format.to_lowercase().as_str()) {
        report.add_error(ValidationError::InvalidLogFormat(config.logging.format.clone()));
    }

    match &config.metrics {
        None => report.add_default("metrics.enabled", "false"),
        Some(metrics) if metrics.enabled && metrics.port == config.server.port => {
            report.add_error(ValidationError::MetricsPortCollision(metrics.port));
        }
        Some(_) => {}
    }

    if config.market_data.stock_price <= 0.0 {
        report.add_error(ValidationError::InvalidPositiveFloat {
            field: "market_data.stock_price".to_string(),
        });
    }

    if config.market_data.implied_volatility < 0.0 {
        report.add_warning(
            "market_data.implied_volatility",
            "Negative volatility is priced at intrinsic value",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_default_config_is_valid() {
        let report = validate_config(&generate_default_config());
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_parse_hh_mm() {
        assert_eq!(parse_hh_mm("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert!(parse_hh_mm("9:30").is_none());
        assert!(parse_hh_mm("25:00").is_none());
        assert!(parse_hh_mm("16:00:00").is_none());
    }

    #[test]
    fn test_market_hours_inverted() {
        let mut config = generate_default_config();
        config.calendar.market_open = "16:00".to_string();
        config.calendar.market_close = "09:30".to_string();

        let report = validate_config(&config);
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidMarketHours { .. })));
    }

    #[test]
    fn test_pricing_errors() {
        let mut config = generate_default_config();
        config.pricing.lattice_steps = 0;
        config.pricing.candidate_rates = vec![];
        config.pricing.days_per_year = 0.0;

        let report = validate_config(&config);
        assert!(report.errors.contains(&ValidationError::InvalidLatticeSteps));
        assert!(report.errors.contains(&ValidationError::NoCandidateRates));
        assert!(report.errors.contains(&ValidationError::InvalidPositiveFloat {
            field: "pricing.days_per_year".to_string()
        }));
    }

    #[test]
    fn test_grid_errors() {
        let mut config = generate_default_config();
        config.grid.time_columns = 1;
        config.grid.max_walk_iterations = 0;

        let report = validate_config(&config);
        assert!(report.errors.contains(&ValidationError::InvalidTimeColumns(1)));
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_dst_months_out_of_range() {
        let mut config = generate_default_config();
        config.calendar.dst_start_month = 11;
        config.calendar.dst_end_month = 3;

        let report = validate_config(&config);
        assert!(report
            .errors
            .contains(&ValidationError::InvalidDstMonths { start: 11, end: 3 }));
    }

    #[test]
    fn test_weekend_and_duplicate_holidays_warn() {
        let mut config = generate_default_config();
        let saturday = NaiveDate::from_ymd_opt(2027, 1, 2).unwrap();
        config.calendar.holidays = vec![saturday, saturday];

        let report = validate_config(&config);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 3);
    }

    #[test]
    fn test_metrics_port_collision() {
        let mut config = generate_default_config();
        config.metrics = Some(MetricsConfig {
            enabled: true,
            port: config.server.port,
        });

        let report = validate_config(&config);
        assert!(report
            .errors
            .contains(&ValidationError::MetricsPortCollision(config.server.port)));
    }

    #[test]
    fn test_missing_metrics_section_records_default() {
        let mut config = generate_default_config();
        config.metrics = None;

        let report = validate_config(&config);
        assert!(report.is_valid());
        assert_eq!(report.defaults_applied.len(), 1);
        assert_eq!(report.defaults_applied[0].field, "metrics.enabled");
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = generate_default_config();
        config.logging.format = "xml".to_string();

        let report = validate_config(&config);
        assert!(report
            .errors
            .contains(&ValidationError::InvalidLogFormat("xml".to_string())));
    }

    #[test]
    fn test_unresolved_host() {
        let mut config = generate_default_config();
        config.server.host = "${OPTCALC_SURELY_UNSET_HOST}".to_string();

        let report = validate_config(&config);
        assert!(!report.is_valid());
    }
}
