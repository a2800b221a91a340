//! Health check route

use crate::api::{types::HealthResponse, AppState};
use axum::{extract::State, Json};
use tracing::warn;

/// Reports `degraded` when the store cannot answer an occupancy query
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    match state.ledger.available_count().await {
        Ok(available_slots) => Json(HealthResponse {
            status: "healthy".to_string(),
            available_slots,
        }),
        Err(e) => {
            warn!("Health check failed: {}", e);
            Json(HealthResponse {
                status: "degraded".to_string(),
                available_slots: 0,
            })
        }
    }
}
