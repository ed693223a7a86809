//! US equity trading calendar.
//!
//! All session logic runs on Eastern wall-clock time. The UTC offset is chosen
//! by calendar month (daylight-saving months use the DST offset) instead of the
//! exact cutover dates, so instants in the first days of March and the first
//! days of November can be off by an hour. Holidays are plain configuration
//! data: years without listed holidays trade every weekday.

use crate::error::PricingError;
use crate::types::MarketInstant;
use crate::Result;
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
    Weekday,
};
use config::CalendarConfig;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use tracing::debug;

/// Longest run of consecutive non-trading days the calendar will scan through
const MAX_SCAN_DAYS: u32 = 3660;

/// Source of "now" for the engine
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct TradingCalendar {
    open: NaiveTime,
    close: NaiveTime,
    standard_offset: FixedOffset,
    dst_offset: FixedOffset,
    dst_months: RangeInclusive<u32>,
    holidays: BTreeSet<NaiveDate>,
}

impl TradingCalendar {
    pub fn from_config(config: &CalendarConfig) -> Result<Self> {
        let open = parse_session_time(&config.market_open, "market_open")?;
        let close = parse_session_time(&config.market_close, "market_close")?;
        if open >= close {
            return Err(PricingError::InvalidInput(format!(
                "market open {} must be before market close {}",
                open, close
            )));
        }

        let standard_offset = hours_offset(config.standard_utc_offset_hours)?;
        let dst_offset = hours_offset(config.dst_utc_offset_hours)?;

        let (dst_start, dst_end) = (config.dst_start_month, config.dst_end_month);
        if !(1..=12).contains(&dst_start) || !(1..=12).contains(&dst_end) || dst_start > dst_end {
            return Err(PricingError::InvalidInput(format!(
                "daylight saving months {}..={} must be an ascending range within 1..=12",
                dst_start, dst_end
            )));
        }

        debug!(
            holidays = config.holidays.len(),
            %open,
            %close,
            "Trading calendar built"
        );

        Ok(Self {
            open,
            close,
            standard_offset,
            dst_offset,
            dst_months: dst_start..=dst_end,
            holidays: config.holidays.iter().copied().collect(),
        })
    }

    pub fn market_open(&self) -> NaiveTime {
        self.open
    }

    pub fn market_close(&self) -> NaiveTime {
        self.close
    }

    /// Session length of a full trading day in milliseconds
    pub fn session_millis(&self) -> i64 {
        (self.close - self.open).num_milliseconds()
    }

    /// Eastern UTC offset in effect on `date`.
    pub fn offset_for_date(&self, date: NaiveDate) -> FixedOffset {
        if self.dst_months.contains(&date.month()) {
            self.dst_offset
        } else {
            self.standard_offset
        }
    }

    /// Eastern wall-clock time of an absolute instant.
    pub fn to_eastern(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        let daylight = instant.with_timezone(&self.dst_offset).naive_local();
        if self.dst_months.contains(&daylight.month()) {
            daylight
        } else {
            instant.with_timezone(&self.standard_offset).naive_local()
        }
    }

    pub fn eastern_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.to_eastern(instant).date()
    }

    /// Absolute instant of an Eastern wall-clock time on `date`.
    pub fn at_eastern(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let offset = self.offset_for_date(date);
        let local = date.and_time(time);
        Utc.from_utc_datetime(&(local - Duration::seconds(i64::from(offset.local_minus_utc()))))
    }

    /// Weekday that is not a listed holiday.
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }

    /// `(open, close)` of `date` as absolute instants, whether or not it trades.
    pub fn session(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.at_eastern(date, self.open),
            self.at_eastern(date, self.close),
        )
    }

    /// The market close of `date`; expiration dates resolve to this instant.
    pub fn close_on(&self, date: NaiveDate) -> DateTime<Utc> {
        self.at_eastern(date, self.close)
    }

    pub fn is_open_at(&self, instant: DateTime<Utc>) -> bool {
        let local = self.to_eastern(instant);
        self.is_trading_day(local.date()) && self.within_hours(local.time())
    }

    fn within_hours(&self, time: NaiveTime) -> bool {
        time >= self.open && time < self.close
    }

    /// The instant a calculation should be anchored to.
    ///
    /// During market hours this is `now`. Otherwise it is the close of the
    /// most recent trading day that has already closed.
    pub fn market_instant(&self, now: DateTime<Utc>) -> Result<MarketInstant> {
        let local = self.to_eastern(now);
        let today = local.date();

        if self.is_trading_day(today) && self.within_hours(local.time()) {
            return Ok(MarketInstant {
                time: now,
                is_open: true,
            });
        }

        let mut day = today;
        if self.is_trading_day(today) && local.time() < self.open {
            day = day.pred_opt().ok_or_else(|| out_of_range(today))?;
        }
        let last_session = self.trading_day_on_or_before(day)?;

        Ok(MarketInstant {
            time: self.close_on(last_session),
            is_open: false,
        })
    }

    pub fn trading_day_on_or_before(&self, date: NaiveDate) -> Result<NaiveDate> {
        let mut day = date;
        for _ in 0..MAX_SCAN_DAYS {
            if self.is_trading_day(day) {
                return Ok(day);
            }
            day = day.pred_opt().ok_or_else(|| out_of_range(date))?;
        }
        Err(PricingError::ComputationBoundExceeded {
            iterations: MAX_SCAN_DAYS,
        })
    }

    /// First trading day strictly after `date`.
    pub fn next_trading_day(&self, date: NaiveDate) -> Result<NaiveDate> {
        let mut day = date;
        for _ in 0..MAX_SCAN_DAYS {
            day = day.succ_opt().ok_or_else(|| out_of_range(date))?;
            if self.is_trading_day(day) {
                return Ok(day);
            }
        }
        Err(PricingError::ComputationBoundExceeded {
            iterations: MAX_SCAN_DAYS,
        })
    }

    /// Milliseconds of market hours inside `[start, end]`.
    pub fn trading_millis_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
        if end <= start {
            return 0;
        }

        let last = self.eastern_date(end);
        self.eastern_date(start)
            .iter_days()
            .take_while(|day| *day <= last)
            .filter(|day| self.is_trading_day(*day))
            .map(|day| {
                let (open, close) = self.session(day);
                let from = open.max(start);
                let to = close.min(end);
                if from < to {
                    (to - from).num_milliseconds()
                } else {
                    0
                }
            })
            .sum()
    }
}

fn parse_session_time(value: &str, field: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| PricingError::InvalidInput(format!("{} must be HH:MM, got '{}'", field, value)))
}

fn hours_offset(hours: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(hours * 3600)
        .ok_or_else(|| PricingError::InvalidInput(format!("UTC offset out of range: {}h", hours)))
}

fn out_of_range(date: NaiveDate) -> PricingError {
    PricingError::InvalidInput(format!("date {} is outside the supported range", date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn calendar() -> TradingCalendar {
        TradingCalendar::from_config(&CalendarConfig::default()).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_holidays_and_weekends() {
        let cal = calendar();
        assert!(!cal.is_trading_day(date(2024, 12, 25)));
        assert!(cal.is_trading_day(date(2024, 12, 24)));
        assert!(!cal.is_trading_day(date(2024, 12, 28))); // Saturday
        assert!(!cal.is_trading_day(date(2024, 12, 29))); // Sunday
        assert!(!cal.is_trading_day(date(2026, 7, 3)));
    }

    #[test]
    fn test_years_past_holiday_table_trade_every_weekday() {
        let cal = calendar();
        assert!(cal.is_trading_day(date(2027, 12, 24)));
        // 2027-12-25 is a Saturday, 2027-12-27 the following Monday
        assert!(cal.is_trading_day(date(2027, 12, 27)));
        assert!(cal.is_trading_day(date(2030, 1, 1)));
    }

    #[test]
    fn test_offsets_follow_month() {
        let cal = calendar();
        assert_eq!(cal.offset_for_date(date(2025, 1, 15)).local_minus_utc(), -5 * 3600);
        assert_eq!(cal.offset_for_date(date(2025, 3, 1)).local_minus_utc(), -4 * 3600);
        assert_eq!(cal.offset_for_date(date(2025, 10, 31)).local_minus_utc(), -4 * 3600);
        assert_eq!(cal.offset_for_date(date(2025, 11, 3)).local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_session_instants() {
        let cal = calendar();
        let (open, close) = cal.session(date(2025, 6, 6));
        assert_eq!(open, utc(2025, 6, 6, 13, 30));
        assert_eq!(close, utc(2025, 6, 6, 20, 0));

        let (open, close) = cal.session(date(2025, 1, 10));
        assert_eq!(open, utc(2025, 1, 10, 14, 30));
        assert_eq!(close, utc(2025, 1, 10, 21, 0));
        assert_eq!(cal.session_millis(), 390 * 60 * 1000);
    }

    #[test]
    fn test_eastern_date_across_midnight() {
        let cal = calendar();
        // 02:00 UTC on Saturday is still Friday evening in New York
        assert_eq!(cal.eastern_date(utc(2025, 6, 7, 2, 0)), date(2025, 6, 6));
        assert_eq!(cal.eastern_date(utc(2025, 1, 11, 4, 59)), date(2025, 1, 10));
        assert_eq!(cal.eastern_date(utc(2025, 1, 11, 5, 0)), date(2025, 1, 11));
    }

    #[test]
    fn test_market_instant_during_hours() {
        let cal = calendar();
        let now = utc(2025, 6, 6, 15, 0);
        let instant = cal.market_instant(now).unwrap();
        assert!(instant.is_open);
        assert_eq!(instant.time, now);
        assert!(cal.is_open_at(now));
    }

    #[test]
    fn test_market_instant_at_close_is_closed() {
        let cal = calendar();
        let instant = cal.market_instant(utc(2025, 6, 6, 20, 0)).unwrap();
        assert!(!instant.is_open);
        assert_eq!(instant.time, utc(2025, 6, 6, 20, 0));
    }

    #[test]
    fn test_market_instant_before_open_uses_previous_close() {
        let cal = calendar();
        // Tuesday 08:00 ET -> Monday close
        let instant = cal.market_instant(utc(2025, 6, 10, 12, 0)).unwrap();
        assert!(!instant.is_open);
        assert_eq!(instant.time, utc(2025, 6, 9, 20, 0));
    }

    #[test]
    fn test_market_instant_on_weekend() {
        let cal = calendar();
        // Sunday -> Friday close
        let instant = cal.market_instant(utc(2025, 6, 8, 18, 0)).unwrap();
        assert_eq!(instant.time, utc(2025, 6, 6, 20, 0));
    }

    #[test]
    fn test_market_instant_skips_holiday() {
        let cal = calendar();
        // Monday 2025-01-20 is a holiday; Tuesday pre-open rolls back to Friday 01-17
        let instant = cal.market_instant(utc(2025, 1, 21, 13, 0)).unwrap();
        assert_eq!(instant.time, utc(2025, 1, 17, 21, 0));
    }

    #[test]
    fn test_market_instant_with_mock_clock() {
        let cal = calendar();
        let mut clock = MockClock::new();
        clock.expect_now().return_const(utc(2024, 12, 25, 16, 0));

        let instant = cal.market_instant(clock.now()).unwrap();
        assert!(!instant.is_open);
        assert_eq!(instant.time, utc(2024, 12, 24, 21, 0));
    }

    #[test]
    fn test_next_trading_day() {
        let cal = calendar();
        assert_eq!(cal.next_trading_day(date(2025, 6, 6)).unwrap(), date(2025, 6, 9));
        assert_eq!(cal.next_trading_day(date(2024, 12, 24)).unwrap(), date(2024, 12, 26));
    }

    #[test]
    fn test_trading_millis_between() {
        let cal = calendar();
        let minute = 60_000;

        // Friday 10:00 ET to Friday 16:00 ET
        assert_eq!(
            cal.trading_millis_between(utc(2025, 6, 6, 14, 0), utc(2025, 6, 6, 20, 0)),
            360 * minute
        );
        // Friday 10:00 ET across the weekend to Monday 10:00 ET
        assert_eq!(
            cal.trading_millis_between(utc(2025, 6, 6, 14, 0), utc(2025, 6, 9, 14, 0)),
            (360 + 30) * minute
        );
        // Overnight only
        assert_eq!(
            cal.trading_millis_between(utc(2025, 6, 6, 21, 0), utc(2025, 6, 7, 12, 0)),
            0
        );
        assert_eq!(
            cal.trading_millis_between(utc(2025, 6, 9, 14, 0), utc(2025, 6, 6, 14, 0)),
            0
        );
    }

    #[test]
    fn test_rejects_bad_session_times() {
        let config = CalendarConfig {
            market_open: "16:00".to_string(),
            market_close: "09:30".to_string(),
            ..CalendarConfig::default()
        };
        assert_matches!(
            TradingCalendar::from_config(&config),
            Err(PricingError::InvalidInput(_))
        );

        let config = CalendarConfig {
            market_open: "nine".to_string(),
            ..CalendarConfig::default()
        };
        assert!(TradingCalendar::from_config(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_dst_months() {
        for (start, end) in [(11, 3), (0, 10), (3, 13)] {
            let config = CalendarConfig {
                dst_start_month: start,
                dst_end_month: end,
                ..CalendarConfig::default()
            };
            assert_matches!(
                TradingCalendar::from_config(&config),
                Err(PricingError::InvalidInput(_)),
                "{start}..={end}"
            );
        }

        let single_month = CalendarConfig {
            dst_start_month: 7,
            dst_end_month: 7,
            ..CalendarConfig::default()
        };
        assert!(TradingCalendar::from_config(&single_month).is_ok());
    }

    #[test]
    fn test_alternate_holiday_set() {
        let config = CalendarConfig {
            holidays: vec![date(2025, 6, 6)],
            ..CalendarConfig::default()
        };
        let cal = TradingCalendar::from_config(&config).unwrap();
        assert!(!cal.is_trading_day(date(2025, 6, 6)));
        assert!(cal.is_trading_day(date(2024, 12, 25)));
    }
}
