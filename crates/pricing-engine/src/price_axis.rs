//! Stock-price rows of the pricing matrix.
//!
//! The grid runs from a few increments below the lowest of spot and strikes to
//! a few increments above the highest, snapped to the increment. Grid points
//! are generated from integer step counts so the axis does not drift through
//! floating-point accumulation.

use crate::error::PricingError;
use crate::Result;
use ordered_float::OrderedFloat;
use std::collections::BTreeSet;
use tracing::debug;

/// Decimal places kept for increments outside the preference table
const NORMALIZE_DECIMALS: i32 = 10;

#[derive(Debug, Clone, Copy)]
pub struct PriceAxisBuilder {
    padding_steps: u32,
    max_rows: usize,
}

impl PriceAxisBuilder {
    pub fn new(padding_steps: u32, max_rows: usize) -> Self {
        Self {
            padding_steps,
            max_rows,
        }
    }

    /// Sorted, distinct, positive prices containing `spot` and every strike.
    pub fn build(&self, spot: f64, strikes: &[f64], increment: f64) -> Result<Vec<f64>> {
        if !(increment.is_finite() && increment > 0.0) {
            return Err(PricingError::InvalidInput(format!(
                "price increment must be positive, got {}",
                increment
            )));
        }

        let anchors: Vec<f64> = std::iter::once(spot).chain(strikes.iter().copied()).collect();
        if let Some(bad) = anchors.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
            return Err(PricingError::InvalidInput(format!(
                "prices must be positive, got {}",
                bad
            )));
        }

        let min = anchors.iter().copied().fold(f64::INFINITY, f64::min);
        let max = anchors.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let padding = increment * f64::from(self.padding_steps);

        let first_step = ((min - padding) / increment).floor();
        let last_step = ((max + padding) / increment).ceil();
        let steps = last_step - first_step + 1.0;
        if steps > self.max_rows as f64 {
            return Err(PricingError::GridTooLarge {
                rows: steps as usize,
                max: self.max_rows,
            });
        }

        let (first_step, last_step) = (first_step as i64, last_step as i64);
        let mut axis: BTreeSet<OrderedFloat<f64>> = (first_step..=last_step)
            .map(|step| round_to_preference(step as f64 * increment, increment))
            .filter(|price| *price > 0.0)
            .map(OrderedFloat)
            .collect();

        axis.extend(anchors.iter().copied().map(OrderedFloat));

        if axis.len() > self.max_rows {
            return Err(PricingError::GridTooLarge {
                rows: axis.len(),
                max: self.max_rows,
            });
        }

        debug!(
            rows = axis.len(),
            low = first_step as f64 * increment,
            high = last_step as f64 * increment,
            "Price axis built"
        );

        Ok(axis.into_iter().map(|p| p.into_inner()).collect())
    }
}

/// Snap `price` to the nearest "nice" denomination for the common increments.
pub fn round_to_preference(price: f64, preference: f64) -> f64 {
    if preference == 0.5 {
        (price * 2.0).round() / 2.0
    } else if preference == 1.0 {
        price.round()
    } else if preference == 2.5 || preference == 5.0 || preference == 10.0 {
        (price / preference).round() * preference
    } else {
        let scale = 10f64.powi(NORMALIZE_DECIMALS);
        (price * scale).round() / scale
    }
}
