//! Option pricing matrix engine
//!
//! Computes theoretical option prices and multi-leg strategy P&L across a
//! grid of future stock prices and trading-time points.
//!
//! # Core Components
//!
//! - [`calendar`] - Trading days, market hours and the calculation instant
//! - [`models`] - Closed-form and binomial-lattice valuation
//! - [`range`] - Price band across candidate risk-free rates
//! - [`price_axis`] - Stock-price rows around spot and strikes
//! - [`time_axis`] - Columns spaced evenly in trading minutes
//! - [`strategy`] - Option legs and strategy valuation
//! - [`grid`] - Matrix assembly for single options and strategies
//! - [`engine`] - Facade owning the configuration
//! - `api` - Axum routes over the engine (feature `api`)
//!
//! # Key Invariants
//!
//! - The engine is pure computation: same inputs and clock, same table
//! - Price axis always contains spot and every strike exactly once
//! - Time axis starts at the calculation time and ends exactly at expiration
//! - Strategy P&L is zero at spot in the first column

#[cfg(feature = "api")]
pub mod api;
pub mod calendar;
pub mod engine;
pub mod error;
pub mod grid;
pub mod models;
pub mod price_axis;
pub mod range;
pub mod strategy;
pub mod time_axis;
pub mod types;

pub use calendar::{Clock, FixedClock, SystemClock, TradingCalendar};
pub use config::ModelKind;
pub use engine::{PricingEngine, SingleOptionRequest, StrategyRequest};
pub use error::PricingError;
pub use grid::{PnlRow, PremiumRow, SingleOptionTable, StrategyTable};
pub use models::{AnalyticModel, LatticeModel, ModelSet, ValuationModel};
pub use strategy::{OptionLeg, Strategy};
pub use types::{
    CostSign, InitialCost, LegAction, MarketInstant, OptionType, PriceRange, ValuationRequest,
};

pub type Result<T> = std::result::Result<T, PricingError>;
