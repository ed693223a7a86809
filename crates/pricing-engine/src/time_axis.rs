//! Time columns of the pricing matrix.
//!
//! Columns are spaced evenly in trading minutes rather than wall-clock time,
//! so nights, weekends and holidays take up no width. The first column is the
//! start instant and the last column is the expiration instant.

use crate::calendar::TradingCalendar;
use crate::error::PricingError;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct TimeAxisBuilder {
    columns: usize,
    max_iterations: u32,
}

impl TimeAxisBuilder {
    /// `columns` counts both end points and is raised to at least two.
    pub fn new(columns: usize, max_iterations: u32) -> Self {
        Self {
            columns: columns.max(2),
            max_iterations,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn build(
        &self,
        calendar: &TradingCalendar,
        start: DateTime<Utc>,
        expiration: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        if expiration <= start {
            return Err(PricingError::InvalidExpiration { start, expiration });
        }

        let total_millis = calendar.trading_millis_between(start, expiration);
        let segments = self.columns - 1;
        let step_millis = total_millis as f64 / segments as f64;

        debug!(
            total_minutes = total_millis as f64 / 60_000.0,
            step_minutes = step_millis / 60_000.0,
            "Trading time between start and expiration"
        );

        let mut axis = Vec::with_capacity(self.columns);
        for slot in 0..segments {
            let target = (step_millis * slot as f64).round() as i64;
            axis.push(self.advance(calendar, start, target)?);
        }
        axis.push(expiration);

        Ok(axis)
    }

    /// Move `millis` trading milliseconds forward from `from`.
    fn advance(
        &self,
        calendar: &TradingCalendar,
        from: DateTime<Utc>,
        millis: i64,
    ) -> Result<DateTime<Utc>> {
        let mut cursor = from;
        let mut remaining = millis;
        let mut budget = self.max_iterations;

        while remaining > 0 {
            if budget == 0 {
                warn!(
                    %from,
                    remaining_ms = remaining,
                    "Trading-minute walk did not converge"
                );
                return Err(PricingError::ComputationBoundExceeded {
                    iterations: self.max_iterations,
                });
            }
            budget -= 1;

            let day = calendar.eastern_date(cursor);
            if calendar.is_trading_day(day) {
                let (open, close) = calendar.session(day);
                if cursor < open {
                    cursor = open;
                    continue;
                }
                if cursor < close {
                    let left_today = (close - cursor).num_milliseconds();
                    if remaining <= left_today {
                        cursor += Duration::milliseconds(remaining);
                        remaining = 0;
                    } else {
                        cursor = close;
                        remaining -= left_today;
                    }
                    continue;
                }
            }

            let next = calendar.next_trading_day(day)?;
            cursor = calendar.session(next).0;
        }

        Ok(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use config::CalendarConfig;

    fn calendar() -> TradingCalendar {
        TradingCalendar::from_config(&CalendarConfig::default()).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn assert_non_decreasing(axis: &[DateTime<Utc>]) {
        assert!(axis.windows(2).all(|w| w[0] <= w[1]), "{:?}", axis);
    }

    #[test]
    fn test_friday_to_following_friday() {
        let cal = calendar();
        let start = utc(2025, 6, 6, 14, 0, 0); // Friday 10:00 ET
        let expiration = utc(2025, 6, 13, 20, 0, 0); // next Friday 16:00 ET

        let axis = TimeAxisBuilder::new(13, 1000).build(&cal, start, expiration).unwrap();

        assert_eq!(axis.len(), 13);
        assert_eq!(axis[0], start);
        assert_eq!(axis[12], expiration);
        assert_non_decreasing(&axis);

        // 2310 trading minutes / 12 = 192.5 per column
        assert_eq!(axis[1], utc(2025, 6, 6, 17, 12, 30));
        // 360 minutes left on Friday, the remaining 25 land on Monday
        assert_eq!(axis[2], utc(2025, 6, 9, 13, 55, 0));
        assert!(axis.iter().all(|t| cal.is_open_at(*t) || *t == expiration));
    }

    #[test]
    fn test_start_before_open_begins_at_open() {
        let cal = calendar();
        let start = utc(2025, 6, 9, 12, 0, 0); // Monday 08:00 ET
        let expiration = utc(2025, 6, 9, 20, 0, 0); // Monday 16:00 ET

        let axis = TimeAxisBuilder::new(13, 1000).build(&cal, start, expiration).unwrap();
        assert_eq!(axis[0], start);
        // 390 minutes / 12 = 32.5 minutes past the 09:30 open
        assert_eq!(axis[1], utc(2025, 6, 9, 14, 2, 30));
        assert_non_decreasing(&axis);
    }

    #[test]
    fn test_skips_holiday() {
        let cal = calendar();
        let start = utc(2024, 12, 24, 20, 0, 0); // Tuesday 15:00 ET
        let expiration = utc(2024, 12, 26, 21, 0, 0); // Thursday 16:00 ET

        let axis = TimeAxisBuilder::new(3, 1000).build(&cal, start, expiration).unwrap();
        // 60 + 390 minutes, midpoint 225 minutes: 60 on Tuesday, 165 on Thursday
        assert_eq!(axis[1], utc(2024, 12, 26, 17, 15, 0));
    }

    #[test]
    fn test_no_trading_time_between_points() {
        let cal = calendar();
        let start = utc(2025, 6, 7, 15, 0, 0); // Saturday
        let expiration = utc(2025, 6, 8, 15, 0, 0); // Sunday

        let axis = TimeAxisBuilder::new(13, 1000).build(&cal, start, expiration).unwrap();
        assert_eq!(axis.len(), 13);
        assert!(axis[..12].iter().all(|t| *t == start));
        assert_eq!(axis[12], expiration);
    }

    #[test]
    fn test_expiration_not_after_start() {
        let cal = calendar();
        let start = utc(2025, 6, 6, 14, 0, 0);
        assert_matches!(
            TimeAxisBuilder::new(13, 1000).build(&cal, start, start),
            Err(PricingError::InvalidExpiration { .. })
        );
    }

    #[test]
    fn test_walk_bound_is_reported() {
        let cal = calendar();
        let start = utc(2025, 6, 2, 14, 0, 0);
        let expiration = utc(2025, 8, 29, 20, 0, 0);

        let result = TimeAxisBuilder::new(13, 5).build(&cal, start, expiration);
        assert_matches!(
            result,
            Err(PricingError::ComputationBoundExceeded { iterations: 5 })
        );
    }

    #[test]
    fn test_long_dated_axis_within_default_bound() {
        let cal = calendar();
        let start = utc(2025, 1, 2, 15, 0, 0);
        let expiration = utc(2026, 1, 16, 21, 0, 0);

        let axis = TimeAxisBuilder::new(13, 1000).build(&cal, start, expiration).unwrap();
        assert_eq!(axis.len(), 13);
        assert_non_decreasing(&axis);
        assert!(axis[11] < expiration);
    }

    #[test]
    fn test_minimum_two_columns() {
        let builder = TimeAxisBuilder::new(0, 1000);
        assert_eq!(builder.columns(), 2);

        let cal = calendar();
        let start = utc(2025, 6, 6, 14, 0, 0);
        let expiration = utc(2025, 6, 13, 20, 0, 0);
        assert_eq!(builder.build(&cal, start, expiration).unwrap(), vec![start, expiration]);
    }
}
