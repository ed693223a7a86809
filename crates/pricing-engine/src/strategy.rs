//! Multi-leg strategies and their valuation.

use crate::error::PricingError;
use crate::models::ValuationModel;
use crate::range::PriceRangeEstimator;
use crate::types::{LegAction, OptionType};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One directional position within a strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    pub action: LegAction,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub strike: f64,
}

impl OptionLeg {
    pub fn new(action: LegAction, option_type: OptionType, strike: f64) -> Self {
        Self {
            action,
            option_type,
            strike,
        }
    }
}

impl fmt::Display for OptionLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.action, self.option_type, self.strike)
    }
}

/// Parses `action:type:strike`, e.g. `buy:call:150`.
impl FromStr for OptionLeg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [action, option_type, strike] = parts.as_slice() else {
            return Err(format!("expected action:type:strike, got '{}'", s));
        };

        let strike: f64 = strike
            .trim()
            .parse()
            .map_err(|_| format!("invalid strike '{}'", strike))?;

        Ok(Self::new(action.parse()?, option_type.parse()?, strike))
    }
}

/// Ordered, non-empty collection of legs. Order only matters for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strategy {
    legs: Vec<OptionLeg>,
}

impl Strategy {
    pub fn new(legs: Vec<OptionLeg>) -> Result<Self> {
        if legs.is_empty() {
            return Err(PricingError::InvalidInput(
                "a strategy needs at least one leg".to_string(),
            ));
        }
        if let Some(leg) = legs.iter().find(|l| !(l.strike.is_finite() && l.strike > 0.0)) {
            return Err(PricingError::InvalidInput(format!(
                "strike must be positive in leg {}",
                leg
            )));
        }
        Ok(Self { legs })
    }

    pub fn legs(&self) -> &[OptionLeg] {
        &self.legs
    }

    pub fn strikes(&self) -> Vec<f64> {
        self.legs.iter().map(|leg| leg.strike).collect()
    }

    /// Net premium of the position: bought legs add, sold legs subtract.
    ///
    /// Each leg is priced at the midpoint of its rate band.
    pub fn value(
        &self,
        estimator: &PriceRangeEstimator,
        model: &dyn ValuationModel,
        spot: f64,
        time: f64,
        vol: f64,
    ) -> f64 {
        self.legs
            .iter()
            .map(|leg| {
                let range = estimator.range_for(model, leg.option_type, spot, leg.strike, time, vol);
                leg.action.sign() * range.midpoint()
            })
            .sum()
    }
}

impl<'de> Deserialize<'de> for Strategy {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let legs = Vec::<OptionLeg>::deserialize(deserializer)?;
        Strategy::new(legs).map_err(serde::de::Error::custom)
    }
}
