//! Engine facade.
//!
//! [`PricingEngine`] owns the immutable configuration (calendar, rate set,
//! models, grid limits) and exposes the four operations callers use. It holds
//! no mutable state, so one instance can serve concurrent requests.

use crate::calendar::{Clock, SystemClock, TradingCalendar};
use crate::error::PricingError;
use crate::grid::{years_between, GridGenerator, SingleOptionTable, StrategyTable};
use crate::models::{ModelSet, ValuationModel};
use crate::price_axis::PriceAxisBuilder;
use crate::range::PriceRangeEstimator;
use crate::strategy::Strategy;
use crate::time_axis::TimeAxisBuilder;
use crate::types::{MarketInstant, OptionType, PriceRange};
use crate::Result;
use chrono::{DateTime, Utc};
use config::{MasterConfig, ModelKind};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Inputs for a single-option matrix
#[derive(Debug, Clone)]
pub struct SingleOptionRequest {
    pub spot: f64,
    pub strike: f64,
    /// Decimal volatility (0.25 = 25%)
    pub volatility: f64,
    /// Calculation time; the current market instant when `None`
    pub start: Option<DateTime<Utc>>,
    pub expiration: DateTime<Utc>,
    pub price_increment: f64,
    pub option_type: OptionType,
    pub model: Option<ModelKind>,
}

/// Inputs for a strategy P&L matrix
#[derive(Debug, Clone)]
pub struct StrategyRequest {
    pub spot: f64,
    pub volatility: f64,
    pub start: Option<DateTime<Utc>>,
    pub expiration: DateTime<Utc>,
    pub price_increment: f64,
    pub strategy: Strategy,
    pub model: Option<ModelKind>,
}

pub struct PricingEngine {
    calendar: TradingCalendar,
    estimator: PriceRangeEstimator,
    models: ModelSet,
    default_model: ModelKind,
    price_axis: PriceAxisBuilder,
    time_axis: TimeAxisBuilder,
    days_per_year: f64,
    clock: Arc<dyn Clock>,
}

impl PricingEngine {
    /// Build an engine reading the system clock.
    pub fn from_config(config: &MasterConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &MasterConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let pricing = &config.pricing;
        if !(pricing.days_per_year.is_finite() && pricing.days_per_year > 0.0) {
            return Err(PricingError::InvalidInput(format!(
                "days_per_year must be positive, got {}",
                pricing.days_per_year
            )));
        }

        let engine = Self {
            calendar: TradingCalendar::from_config(&config.calendar)?,
            estimator: PriceRangeEstimator::new(pricing.candidate_rates.clone())?,
            models: ModelSet::new(pricing.lattice_steps),
            default_model: pricing.model,
            price_axis: PriceAxisBuilder::new(
                config.grid.price_padding_steps,
                config.grid.max_price_rows,
            ),
            time_axis: TimeAxisBuilder::new(config.grid.time_columns, config.grid.max_walk_iterations),
            days_per_year: pricing.days_per_year,
            clock,
        };

        info!(
            model = %engine.default_model,
            lattice_steps = pricing.lattice_steps,
            rates = engine.estimator.rates().len(),
            columns = engine.time_axis.columns(),
            "Pricing engine ready"
        );

        Ok(engine)
    }

    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    pub fn default_model(&self) -> ModelKind {
        self.default_model
    }

    fn model(&self, kind: Option<ModelKind>) -> &dyn ValuationModel {
        self.models.get(kind.unwrap_or(self.default_model))
    }

    /// Market instant for the engine's clock.
    pub fn market_instant(&self) -> Result<MarketInstant> {
        self.calendar.market_instant(self.clock.now())
    }

    /// Year fraction from `from` until `expiration`.
    pub fn years_until(&self, expiration: DateTime<Utc>, from: DateTime<Utc>) -> f64 {
        years_between(expiration, from, self.days_per_year)
    }

    pub fn price_range(
        &self,
        option_type: OptionType,
        spot: f64,
        strike: f64,
        time: f64,
        volatility: f64,
        model: Option<ModelKind>,
    ) -> Result<PriceRange> {
        check_positive("spot", spot)?;
        check_positive("strike", strike)?;
        check_volatility(volatility)?;
        if !time.is_finite() {
            return Err(PricingError::InvalidInput(format!("time must be finite, got {}", time)));
        }

        Ok(self
            .estimator
            .range_for(self.model(model), option_type, spot, strike, time, volatility))
    }

    pub fn generate_single_option_table(
        &self,
        request: &SingleOptionRequest,
    ) -> Result<SingleOptionTable> {
        let started = Instant::now();
        check_positive("spot", request.spot)?;
        check_positive("strike", request.strike)?;
        check_volatility(request.volatility)?;

        let start = self.resolve_start(request.start, request.expiration)?;
        let price_axis = self
            .price_axis
            .build(request.spot, &[request.strike], request.price_increment)?;
        let time_axis = self.time_axis.build(&self.calendar, start, request.expiration)?;

        let model = self.model(request.model);
        let table = GridGenerator::new(&self.estimator, model, self.days_per_year).single_option(
            price_axis,
            time_axis,
            request.expiration,
            request.strike,
            request.option_type,
            request.volatility,
        );

        info!(
            option_type = %request.option_type,
            model = %model.kind(),
            rows = table.rows.len(),
            cells = table.cell_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated single-option table"
        );

        Ok(table)
    }

    pub fn generate_strategy_table(&self, request: &StrategyRequest) -> Result<StrategyTable> {
        let started = Instant::now();
        check_positive("spot", request.spot)?;
        check_volatility(request.volatility)?;

        let start = self.resolve_start(request.start, request.expiration)?;
        let price_axis = self.price_axis.build(
            request.spot,
            &request.strategy.strikes(),
            request.price_increment,
        )?;
        let time_axis = self.time_axis.build(&self.calendar, start, request.expiration)?;

        let model = self.model(request.model);
        let table = GridGenerator::new(&self.estimator, model, self.days_per_year).strategy(
            price_axis,
            time_axis,
            request.expiration,
            &request.strategy,
            request.spot,
            request.volatility,
        );

        info!(
            legs = request.strategy.legs().len(),
            model = %model.kind(),
            rows = table.rows.len(),
            initial_cost = table.initial_cost.value,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated strategy table"
        );

        Ok(table)
    }

    fn resolve_start(
        &self,
        start: Option<DateTime<Utc>>,
        expiration: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let start = match start {
            Some(start) => start,
            None => self.market_instant()?.time,
        };

        if expiration <= start {
            debug!(%start, %expiration, "Rejecting expiration not after start");
            return Err(PricingError::InvalidExpiration { start, expiration });
        }
        Ok(start)
    }
}

fn check_positive(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PricingError::InvalidInput(format!(
            "{} must be positive, got {}",
            field, value
        )))
    }
}

fn check_volatility(volatility: f64) -> Result<()> {
    if volatility.is_finite() && volatility >= 0.0 {
        Ok(())
    } else {
        Err(PricingError::InvalidInput(format!(
            "volatility must be non-negative, got {}",
            volatility
        )))
    }
}
