//! Shared value types for the pricing engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn is_call(&self) -> bool {
        matches!(self, OptionType::Call)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }

    /// Payoff if exercised immediately.
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "call" | "c" => Ok(OptionType::Call),
            "put" | "p" => Ok(OptionType::Put),
            other => Err(format!("unknown option type: {}", other)),
        }
    }
}

/// Direction of a strategy leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegAction {
    Buy,
    Sell,
}

impl LegAction {
    /// +1 for a long leg, -1 for a short leg
    pub fn sign(&self) -> f64 {
        match self {
            LegAction::Buy => 1.0,
            LegAction::Sell => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LegAction::Buy => "buy",
            LegAction::Sell => "sell",
        }
    }
}

impl fmt::Display for LegAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LegAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" | "long" => Ok(LegAction::Buy),
            "sell" | "short" => Ok(LegAction::Sell),
            other => Err(format!("unknown leg action: {}", other)),
        }
    }
}

/// Inputs for a single model valuation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationRequest {
    pub option_type: OptionType,
    /// Spot price of the underlying
    pub spot: f64,
    pub strike: f64,
    /// Time to expiry in years; zero or negative means at or past expiry
    pub time: f64,
    /// Volatility as a decimal (0.25 = 25%)
    pub vol: f64,
    /// Continuously compounded risk-free rate
    pub rate: f64,
}

impl ValuationRequest {
    /// Whether the closed-form and lattice formulas are undefined here.
    pub fn is_degenerate(&self) -> bool {
        self.time <= 0.0 || self.vol <= 0.0
    }

    pub fn intrinsic(&self) -> f64 {
        self.option_type.intrinsic(self.spot, self.strike)
    }
}

/// Band of theoretical prices across the candidate rates.
///
/// Displayed (and serialized) as `"low-high"` with two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub low: f64,
    pub high: f64,
}

impl PriceRange {
    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}-{:.2}", self.low, self.high)
    }
}

impl Serialize for PriceRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The timestamp a calculation is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInstant {
    pub time: DateTime<Utc>,
    pub is_open: bool,
}

/// Whether opening a strategy costs money or brings it in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostSign {
    Debit,
    Credit,
}

/// Net premium of a strategy at the start time
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InitialCost {
    /// Absolute value, rounded to cents
    pub value: f64,
    pub sign: CostSign,
}

impl InitialCost {
    /// A strictly positive net premium is a debit; zero counts as a credit.
    pub fn from_net(net: f64) -> Self {
        let sign = if net > 0.0 {
            CostSign::Debit
        } else {
            CostSign::Credit
        };
        Self {
            value: round2(net.abs()),
            sign,
        }
    }
}

/// Round to two decimals without producing negative zero.
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
