use axum::{
    extract::{rejection::JsonRejection, FromRequest, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use config::{MarketDataStubConfig, ModelKind};
use observability::{EngineMetrics, TableKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::engine::{PricingEngine, SingleOptionRequest, StrategyRequest};
use crate::error::PricingError;
use crate::grid::{SingleOptionTable, StrategyTable};
use crate::strategy::{OptionLeg, Strategy};
use crate::types::{LegAction, OptionType, PriceRange};

pub const DEFAULT_PRICE_INCREMENT: f64 = 1.0;

const MISSING_PARAMETERS: &str = "Missing required parameters.";
const CALCULATION_FAILED: &str = "An error occurred during calculation.";

pub struct PricingApiState {
    pub engine: Arc<PricingEngine>,
    pub market_data: MarketDataStubConfig,
    single_option_metrics: EngineMetrics,
    strategy_metrics: EngineMetrics,
}

impl PricingApiState {
    pub fn new(engine: Arc<PricingEngine>, market_data: MarketDataStubConfig) -> Self {
        Self {
            engine,
            market_data,
            single_option_metrics: EngineMetrics::new(TableKind::SingleOption),
            strategy_metrics: EngineMetrics::new(TableKind::Strategy),
        }
    }

    /// Record the outcome of a generation. An expiration that is not after
    /// the calculation time is reported inside the table payload.
    fn table_data<T>(
        &self,
        kind: TableKind,
        started: Instant,
        result: crate::Result<T>,
        cells: fn(&T) -> usize,
    ) -> Result<TableData<T>, ApiError> {
        let metrics = match kind {
            TableKind::SingleOption => &self.single_option_metrics,
            TableKind::Strategy => &self.strategy_metrics,
        };

        match result {
            Ok(table) => {
                metrics.record_table(started.elapsed(), cells(&table));
                Ok(TableData::Table(table))
            }
            Err(err) => {
                metrics.record_error(err.kind());
                if matches!(err, PricingError::InvalidExpiration { .. }) {
                    Ok(TableData::Unavailable {
                        error: err.to_string(),
                    })
                } else {
                    Err(err.into())
                }
            }
        }
    }
}

// ==================================================================================
// Errors
// ==================================================================================

#[derive(Debug)]
pub enum ApiError {
    MissingParameters,
    BadRequest(String),
    Pricing(PricingError),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameters | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Pricing(PricingError::InvalidInput(_))
            | ApiError::Pricing(PricingError::InvalidExpiration { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Pricing(PricingError::GridTooLarge { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Pricing(PricingError::ComputationBoundExceeded { .. })
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        ApiError::Pricing(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::MissingParameters => MISSING_PARAMETERS.to_string(),
            ApiError::BadRequest(message) => message,
            ApiError::Pricing(err) if !status.is_server_error() => err.to_string(),
            ApiError::Pricing(err) => {
                error!(%err, "Calculation failed");
                CALCULATION_FAILED.to_string()
            }
            ApiError::Internal(err) => {
                error!(%err, "Calculation task failed");
                CALCULATION_FAILED.to_string()
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

// ==================================================================================
// Request and response bodies
// ==================================================================================

/// `Json` whose body errors come back as a `{message}` 400
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// A JSON number or a string holding one
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// `None` for an empty string
    fn resolve(&self, field: &str) -> Result<Option<f64>, ApiError> {
        match self {
            Numeric::Number(value) => Ok(Some(*value)),
            Numeric::Text(text) if text.trim().is_empty() => Ok(None),
            Numeric::Text(text) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ApiError::BadRequest(format!("{} must be a number", field))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    pub stock_price: Option<Numeric>,
    pub strike_price: Option<Numeric>,
    /// YYYY-MM-DD; the option expires at that day's close
    pub expiration_date: Option<String>,
    /// Percent, e.g. 25.5
    pub volatility: Option<Numeric>,
    pub option_type: Option<String>,
    pub price_increment: Option<Numeric>,
    pub model: Option<ModelKind>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyCalculateRequest {
    pub stock_price: Option<Numeric>,
    pub expiration_date: Option<String>,
    pub volatility: Option<Numeric>,
    pub price_increment: Option<Numeric>,
    pub legs: Option<Vec<LegRequest>>,
    pub model: Option<ModelKind>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegRequest {
    pub action: LegAction,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub strike: Option<Numeric>,
}

impl LegRequest {
    fn into_leg(self) -> Result<OptionLeg, ApiError> {
        let strike = required(self.strike.as_ref(), "strike")?;
        Ok(OptionLeg::new(self.action, self.option_type, strike))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MarketDataRequest {
    pub ticker: Option<String>,
}

/// Either a generated table or the reason none could be built
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TableData<T> {
    Table(T),
    Unavailable { error: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    pub call_price_range: PriceRange,
    pub put_price_range: PriceRange,
    pub table_data: TableData<SingleOptionTable>,
    pub calculation_time: DateTime<Utc>,
    pub is_market_open: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyResponse {
    pub table_data: TableData<StrategyTable>,
    pub calculation_time: DateTime<Utc>,
    pub is_market_open: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatusResponse {
    pub calculation_time: DateTime<Utc>,
    pub is_market_open: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDataResponse {
    pub current_stock_price: f64,
    pub implied_volatility: f64,
}

fn required(value: Option<&Numeric>, field: &str) -> Result<f64, ApiError> {
    match value {
        Some(numeric) => numeric.resolve(field)?.ok_or(ApiError::MissingParameters),
        None => Err(ApiError::MissingParameters),
    }
}

fn optional(value: Option<&Numeric>, field: &str) -> Result<Option<f64>, ApiError> {
    match value {
        Some(numeric) => numeric.resolve(field),
        None => Ok(None),
    }
}

fn required_date(value: Option<&str>) -> Result<NaiveDate, ApiError> {
    let text = value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or(ApiError::MissingParameters)?;

    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest(format!("expirationDate must be YYYY-MM-DD, got {}", text))
    })
}

// ==================================================================================
// Handlers
// ==================================================================================

pub async fn market_status(
    State(state): State<Arc<PricingApiState>>,
) -> Result<Json<MarketStatusResponse>, ApiError> {
    let instant = state.engine.market_instant()?;
    Ok(Json(MarketStatusResponse {
        calculation_time: instant.time,
        is_market_open: instant.is_open,
    }))
}

/// Canned quote; no market data provider is contacted.
pub async fn fetch_market_data(
    State(state): State<Arc<PricingApiState>>,
    ApiJson(req): ApiJson<MarketDataRequest>,
) -> Json<MarketDataResponse> {
    info!(ticker = req.ticker.as_deref().unwrap_or(""), "Serving stub market data");
    Json(MarketDataResponse {
        current_stock_price: state.market_data.stock_price,
        implied_volatility: state.market_data.implied_volatility,
    })
}

pub async fn calculate(
    State(state): State<Arc<PricingApiState>>,
    ApiJson(req): ApiJson<CalculateRequest>,
) -> Result<Json<CalculateResponse>, ApiError> {
    let spot = required(req.stock_price.as_ref(), "stockPrice")?;
    let strike = required(req.strike_price.as_ref(), "strikePrice")?;
    let volatility = required(req.volatility.as_ref(), "volatility")? / 100.0;
    let expiration_date = required_date(req.expiration_date.as_deref())?;
    let price_increment = optional(req.price_increment.as_ref(), "priceIncrement")?
        .unwrap_or(DEFAULT_PRICE_INCREMENT);
    let option_type = match req.option_type.as_deref().map(str::trim) {
        None | Some("") => OptionType::Call,
        Some(text) => text.parse().map_err(ApiError::BadRequest)?,
    };
    let model = req.model;

    let response = tokio::task::spawn_blocking(move || {
        let engine = &state.engine;
        let instant = engine.market_instant()?;
        let expiration = engine.calendar().close_on(expiration_date);
        let years = engine.years_until(expiration, instant.time);

        let call_price_range =
            engine.price_range(OptionType::Call, spot, strike, years, volatility, model)?;
        let put_price_range =
            engine.price_range(OptionType::Put, spot, strike, years, volatility, model)?;

        let started = Instant::now();
        let table = engine.generate_single_option_table(&SingleOptionRequest {
            spot,
            strike,
            volatility,
            start: Some(instant.time),
            expiration,
            price_increment,
            option_type,
            model,
        });
        let table_data = state.table_data(
            TableKind::SingleOption,
            started,
            table,
            SingleOptionTable::cell_count,
        )?;

        Ok::<_, ApiError>(CalculateResponse {
            call_price_range,
            put_price_range,
            table_data,
            calculation_time: instant.time,
            is_market_open: instant.is_open,
        })
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(response))
}

pub async fn calculate_strategy(
    State(state): State<Arc<PricingApiState>>,
    ApiJson(req): ApiJson<StrategyCalculateRequest>,
) -> Result<Json<StrategyResponse>, ApiError> {
    let spot = required(req.stock_price.as_ref(), "stockPrice")?;
    let volatility = required(req.volatility.as_ref(), "volatility")? / 100.0;
    let expiration_date = required_date(req.expiration_date.as_deref())?;
    let price_increment = optional(req.price_increment.as_ref(), "priceIncrement")?
        .unwrap_or(DEFAULT_PRICE_INCREMENT);
    let legs = req
        .legs
        .ok_or(ApiError::MissingParameters)?
        .into_iter()
        .map(LegRequest::into_leg)
        .collect::<Result<Vec<_>, _>>()?;
    let strategy = Strategy::new(legs)?;
    let model = req.model;

    let response = tokio::task::spawn_blocking(move || {
        let engine = &state.engine;
        let instant = engine.market_instant()?;

        let started = Instant::now();
        let table = engine.generate_strategy_table(&StrategyRequest {
            spot,
            volatility,
            start: Some(instant.time),
            expiration: engine.calendar().close_on(expiration_date),
            price_increment,
            strategy,
            model,
        });
        let table_data =
            state.table_data(TableKind::Strategy, started, table, StrategyTable::cell_count)?;

        Ok::<_, ApiError>(StrategyResponse {
            table_data,
            calculation_time: instant.time,
            is_market_open: instant.is_open,
        })
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(response))
}
