//! Price-range estimator.
//!
//! Rate uncertainty is expressed as a band: the model is evaluated once per
//! candidate risk-free rate and the band spans the cheapest and the richest
//! result.

use crate::error::PricingError;
use crate::models::ValuationModel;
use crate::types::{OptionType, PriceRange, ValuationRequest};
use crate::Result;

#[derive(Debug, Clone)]
pub struct PriceRangeEstimator {
    rates: Vec<f64>,
}

impl PriceRangeEstimator {
    pub fn new(rates: Vec<f64>) -> Result<Self> {
        if rates.is_empty() {
            return Err(PricingError::InvalidInput(
                "at least one candidate rate is required".to_string(),
            ));
        }
        if let Some(rate) = rates.iter().find(|r| !r.is_finite()) {
            return Err(PricingError::InvalidInput(format!(
                "candidate rate {} is not finite",
                rate
            )));
        }
        Ok(Self { rates })
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// Min/max premium across the candidate rates, each clamped at zero.
    pub fn range_for(
        &self,
        model: &dyn ValuationModel,
        option_type: OptionType,
        spot: f64,
        strike: f64,
        time: f64,
        vol: f64,
    ) -> PriceRange {
        let (low, high) = self
            .rates
            .iter()
            .map(|&rate| {
                let request = ValuationRequest {
                    option_type,
                    spot,
                    strike,
                    time,
                    vol,
                    rate,
                };
                model.valuate(&request).max(0.0)
            })
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), price| {
                (low.min(price), high.max(price))
            });

        PriceRange { low, high }
    }
}
