//! Pricing engine error types

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur while generating a pricing table.
///
/// A request either succeeds completely or reports exactly one of these.
/// Degenerate valuation inputs (no time left, zero volatility) are not errors;
/// the models return intrinsic value for them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    /// Expiration is at or before the effective start time
    #[error("Expiration must be in the future (start {start}, expiration {expiration})")]
    InvalidExpiration {
        start: DateTime<Utc>,
        expiration: DateTime<Utc>,
    },

    /// The trading-minute walk ran out of iterations
    #[error("Time axis computation exceeded {iterations} iterations")]
    ComputationBoundExceeded { iterations: u32 },

    /// A numeric or structural input is out of range
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The price axis would have more rows than allowed
    #[error("Price axis would have {rows} rows, more than the limit of {max}")]
    GridTooLarge { rows: usize, max: usize },
}

impl PricingError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PricingError::InvalidExpiration { .. } => "invalid_expiration",
            PricingError::ComputationBoundExceeded { .. } => "computation_bound",
            PricingError::InvalidInput(_) => "invalid_input",
            PricingError::GridTooLarge { .. } => "grid_too_large",
        }
    }
}
