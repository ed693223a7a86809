use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers::*;

pub fn create_router(state: Arc<PricingApiState>) -> Router {
    Router::new()
        .route("/api/market-status", get(market_status))
        .route("/api/fetch-market-data", post(fetch_market_data))
        .route("/api/calculate", post(calculate))
        .route("/api/calculate/strategy", post(calculate_strategy))
        .with_state(state)
}
