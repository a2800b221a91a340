//! HTTP boundary for the parking ledger

pub mod error;
pub mod routes;
pub mod types;

pub use error::{ApiError, ApiResult};

use crate::domain::ParkingOperations;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn ParkingOperations>,
}

impl AppState {
    pub fn new(ledger: Arc<dyn ParkingOperations>) -> Self {
        Self { ledger }
    }
}

/// Build the full router with middleware applied
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/entries", post(routes::parking::enter_car))
        .route("/exits", post(routes::parking::exit_car))
        .route("/cars", get(routes::parking::list_active_cars))
        .route("/cars/:plate_number", get(routes::parking::get_car))
        .route("/slots/:slot_number", get(routes::parking::get_slot))
        .route("/stats", get(routes::parking::get_stats))
        .route("/receipts", get(routes::parking::list_receipts));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(routes::health::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
                .layer(TimeoutLayer::new(request_timeout))
                .layer(cors),
        )
        .with_state(state)
}
