use chrono::NaiveDate;

pub fn default_enabled() -> bool {
    true
}

pub fn default_market_open() -> String {
    "09:30".to_string()
}

pub fn default_market_close() -> String {
    "16:00".to_string()
}

pub fn default_standard_utc_offset_hours() -> i32 {
    -5
}

pub fn default_dst_utc_offset_hours() -> i32 {
    -4
}

pub fn default_dst_start_month() -> u32 {
    3
}

pub fn default_dst_end_month() -> u32 {
    10
}

/// US equity exchange full-day closures for 2024 through 2026.
pub fn default_us_holidays() -> Vec<NaiveDate> {
    const HOLIDAYS: [(i32, u32, u32); 30] = [
        // 2024
        (2024, 1, 1), (2024, 1, 15), (2024, 2, 19), (2024, 3, 29), (2024, 5, 27),
        (2024, 6, 19), (2024, 7, 4), (2024, 9, 2), (2024, 11, 28), (2024, 12, 25),
        // 2025
        (2025, 1, 1), (2025, 1, 20), (2025, 2, 17), (2025, 4, 18), (2025, 5, 26),
        (2025, 6, 19), (2025, 7, 4), (2025, 9, 1), (2025, 11, 27), (2025, 12, 25),
        // 2026
        (2026, 1, 1), (2026, 1, 19), (2026, 2, 16), (2026, 4, 3), (2026, 5, 25),
        (2026, 6, 19), (2026, 7, 3), (2026, 9, 7), (2026, 11, 26), (2026, 12, 25),
    ];

    HOLIDAYS
        .iter()
        .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        .collect()
}

pub fn default_lattice_steps() -> u32 {
    100
}

pub fn default_candidate_rates() -> Vec<f64> {
    vec![-0.0062, -0.0030, 0.0000, 0.10, 0.30]
}

pub fn default_days_per_year() -> f64 {
    365.25
}

pub fn default_time_columns() -> usize {
    13
}

pub fn default_price_padding_steps() -> u32 {
    5
}

pub fn default_max_walk_iterations() -> u32 {
    1000
}

pub fn default_max_price_rows() -> usize {
    2000
}

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_http_port() -> u16 {
    5001
}

pub fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

pub fn default_stub_stock_price() -> f64 {
    150.00
}

pub fn default_stub_implied_volatility() -> f64 {
    25.5
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    #[test]
    fn test_default_holidays_are_weekdays() {
        let holidays = default_us_holidays();
        assert_eq!(holidays.len(), 30);
        for day in &holidays {
            assert!(
                !matches!(day.weekday(), Weekday::Sat | Weekday::Sun),
                "{} falls on a weekend",
                day
            );
        }
    }

    #[test]
    fn test_default_holidays_sorted() {
        let holidays = default_us_holidays();
        assert!(holidays.windows(2).all(|w| w[0] < w[1]));
    }
}
