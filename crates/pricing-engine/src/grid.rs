//! Pricing-matrix assembly.
//!
//! Combines a price axis and a time axis with the valuation layer. Single
//! options get a rate band per cell; strategies get profit/loss against the
//! net premium paid at the first column.

use crate::models::ValuationModel;
use crate::range::PriceRangeEstimator;
use crate::strategy::Strategy;
use crate::types::{round2, InitialCost, OptionType, PriceRange};
use chrono::{DateTime, Utc};
use serde::Serialize;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Year fraction between two instants. Negative when `later` precedes `earlier`.
pub fn years_between(later: DateTime<Utc>, earlier: DateTime<Utc>, days_per_year: f64) -> f64 {
    (later - earlier).num_milliseconds() as f64 / (days_per_year * MILLIS_PER_DAY)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumRow {
    pub stock_price: f64,
    pub premiums: Vec<PriceRange>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleOptionTable {
    pub price_axis: Vec<f64>,
    pub time_axis: Vec<DateTime<Utc>>,
    pub rows: Vec<PremiumRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlRow {
    pub stock_price: f64,
    pub pnl: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyTable {
    pub price_axis: Vec<f64>,
    pub time_axis: Vec<DateTime<Utc>>,
    pub rows: Vec<PnlRow>,
    pub initial_cost: InitialCost,
}

impl SingleOptionTable {
    pub fn cell_count(&self) -> usize {
        self.price_axis.len() * self.time_axis.len()
    }
}

impl StrategyTable {
    pub fn cell_count(&self) -> usize {
        self.price_axis.len() * self.time_axis.len()
    }
}

/// Fills a matrix for fixed axes, model and rate set.
pub struct GridGenerator<'a> {
    estimator: &'a PriceRangeEstimator,
    model: &'a dyn ValuationModel,
    days_per_year: f64,
}

impl<'a> GridGenerator<'a> {
    pub fn new(
        estimator: &'a PriceRangeEstimator,
        model: &'a dyn ValuationModel,
        days_per_year: f64,
    ) -> Self {
        Self {
            estimator,
            model,
            days_per_year,
        }
    }

    fn years_to(&self, expiration: DateTime<Utc>, time: DateTime<Utc>) -> f64 {
        years_between(expiration, time, self.days_per_year)
    }

    pub fn single_option(
        &self,
        price_axis: Vec<f64>,
        time_axis: Vec<DateTime<Utc>>,
        expiration: DateTime<Utc>,
        strike: f64,
        option_type: OptionType,
        vol: f64,
    ) -> SingleOptionTable {
        let years: Vec<f64> = time_axis
            .iter()
            .map(|time| self.years_to(expiration, *time))
            .collect();

        let rows = price_axis
            .iter()
            .map(|&stock_price| PremiumRow {
                stock_price,
                premiums: years
                    .iter()
                    .map(|&t| {
                        self.estimator
                            .range_for(self.model, option_type, stock_price, strike, t, vol)
                    })
                    .collect(),
            })
            .collect();

        SingleOptionTable {
            price_axis,
            time_axis,
            rows,
        }
    }

    /// P&L of `strategy` at every cell, relative to its value at `spot` and
    /// the first column.
    pub fn strategy(
        &self,
        price_axis: Vec<f64>,
        time_axis: Vec<DateTime<Utc>>,
        expiration: DateTime<Utc>,
        strategy: &Strategy,
        spot: f64,
        vol: f64,
    ) -> StrategyTable {
        let years: Vec<f64> = time_axis
            .iter()
            .map(|time| self.years_to(expiration, *time))
            .collect();

        let initial_years = years.first().copied().unwrap_or(0.0);
        let net_premium = strategy.value(self.estimator, self.model, spot, initial_years, vol);

        let rows = price_axis
            .iter()
            .map(|&stock_price| PnlRow {
                stock_price,
                pnl: years
                    .iter()
                    .map(|&t| {
                        let value = strategy.value(self.estimator, self.model, stock_price, t, vol);
                        round2(value - net_premium)
                    })
                    .collect(),
            })
            .collect();

        StrategyTable {
            price_axis,
            time_axis,
            rows,
            initial_cost: InitialCost::from_net(net_premium),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalyticModel, LatticeModel};
    use crate::strategy::OptionLeg;
    use crate::types::{CostSign, LegAction};
    use chrono::{Duration, TimeZone};
    use config::default_candidate_rates;

    fn estimator() -> PriceRangeEstimator {
        PriceRangeEstimator::new(default_candidate_rates()).unwrap()
    }

    fn axes() -> (Vec<f64>, Vec<DateTime<Utc>>, DateTime<Utc>) {
        let start = Utc.with_ymd_and_hms(2025, 6, 6, 14, 0, 0).unwrap();
        let expiration = start + Duration::days(30);
        let times = (0..5).map(|i| start + Duration::days(i * 7)).chain([expiration]).collect();
        (vec![140.0, 145.0, 150.0, 155.0, 160.0], times, expiration)
    }

    #[test]
    fn test_years_between() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let later = start + Duration::milliseconds((365.25 * MILLIS_PER_DAY) as i64);
        assert!((years_between(later, start, 365.25) - 1.0).abs() < 1e-12);
        assert!(years_between(start, later, 365.25) < 0.0);
    }

    #[test]
    fn test_single_option_shape_and_expiry_column() {
        let (prices, times, expiration) = axes();
        let estimator = estimator();
        let table = GridGenerator::new(&estimator, &AnalyticModel, 365.25).single_option(
            prices.clone(),
            times,
            expiration,
            150.0,
            OptionType::Call,
            0.25,
        );

        assert_eq!(table.rows.len(), prices.len());
        assert_eq!(table.cell_count(), 30);
        for row in &table.rows {
            assert_eq!(row.premiums.len(), 6);
            // Last column is at expiration: intrinsic only
            let last = row.premiums[5];
            let intrinsic = (row.stock_price - 150.0).max(0.0);
            assert_eq!(last, PriceRange { low: intrinsic, high: intrinsic });
        }
    }

    #[test]
    fn test_call_premiums_decay_toward_expiry() {
        let (prices, times, expiration) = axes();
        let estimator = estimator();
        let table = GridGenerator::new(&estimator, &AnalyticModel, 365.25).single_option(
            prices,
            times,
            expiration,
            150.0,
            OptionType::Call,
            0.25,
        );

        let atm = &table.rows[2];
        assert_eq!(atm.stock_price, 150.0);
        assert!(atm.premiums.windows(2).all(|w| w[0].high >= w[1].high));
    }

    #[test]
    fn test_strategy_pnl_zero_at_spot_and_start() {
        let (prices, times, expiration) = axes();
        let estimator = estimator();
        let lattice = LatticeModel::new(60);
        let strategy = Strategy::new(vec![
            OptionLeg::new(LegAction::Buy, OptionType::Call, 150.0),
            OptionLeg::new(LegAction::Sell, OptionType::Call, 160.0),
        ])
        .unwrap();

        let table = GridGenerator::new(&estimator, &lattice, 365.25).strategy(
            prices, times, expiration, &strategy, 150.0, 0.25,
        );

        let spot_row = table.rows.iter().find(|r| r.stock_price == 150.0).unwrap();
        assert_eq!(spot_row.pnl[0], 0.0);
        assert_eq!(table.initial_cost.sign, CostSign::Debit);
        assert!(table.initial_cost.value > 0.0);

        // At expiration the spread pays between 0 and 10 less the premium
        let top = table.rows.last().unwrap();
        assert!((top.pnl[5] - (10.0 - table.initial_cost.value)).abs() < 0.011);
    }

    #[test]
    fn test_short_put_is_credit() {
        let (prices, times, expiration) = axes();
        let estimator = estimator();
        let strategy =
            Strategy::new(vec![OptionLeg::new(LegAction::Sell, OptionType::Put, 145.0)]).unwrap();

        let table = GridGenerator::new(&estimator, &AnalyticModel, 365.25).strategy(
            prices, times, expiration, &strategy, 150.0, 0.3,
        );
        assert_eq!(table.initial_cost.sign, CostSign::Credit);

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["initialCost"]["sign"], "Credit");
        assert!(json["rows"][0]["pnl"].is_array());
        assert!(json["priceAxis"].is_array());
    }
}
