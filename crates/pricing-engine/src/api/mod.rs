//! HTTP routes for the calculator (feature `api`)

pub mod handlers;
pub mod routes;

pub use handlers::{ApiError, PricingApiState, TableData};
pub use routes::create_router;
