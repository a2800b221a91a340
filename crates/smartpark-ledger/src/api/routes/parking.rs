//! Parking lot routes

use crate::api::{
    error::{ApiError, ApiResult},
    types::{
        EnterCarRequest, ExitCarRequest, ReceiptsQuery, SlotResponse, DEFAULT_RECEIPT_LIMIT,
        MAX_RECEIPT_LIMIT,
    },
    AppState,
};
use crate::domain::types::{EntryTicket, OccupancyStats, ParkedCar, PlateNumber, Receipt};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info};

pub async fn enter_car(
    State(state): State<AppState>,
    Json(request): Json<EnterCarRequest>,
) -> ApiResult<(StatusCode, Json<EntryTicket>)> {
    info!("Entry requested for {}", request.plate_number);
    let ticket = state
        .ledger
        .enter(&request.plate_number, &request.owner_name)
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn exit_car(
    State(state): State<AppState>,
    Json(request): Json<ExitCarRequest>,
) -> ApiResult<Json<Receipt>> {
    info!("Exit requested for {}", request.plate_number);
    let receipt = state.ledger.exit(&request.plate_number).await?;
    Ok(Json(receipt))
}

pub async fn list_active_cars(State(state): State<AppState>) -> ApiResult<Json<Vec<ParkedCar>>> {
    let cars = state.ledger.list_active().await?;
    Ok(Json(cars))
}

pub async fn get_car(
    State(state): State<AppState>,
    Path(plate_number): Path<String>,
) -> ApiResult<Json<ParkedCar>> {
    debug!("Looking up car {}", plate_number);
    state
        .ledger
        .find_by_plate(&plate_number)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound {
            resource: format!("car {}", PlateNumber::normalize(&plate_number)),
        })
}

pub async fn get_slot(
    State(state): State<AppState>,
    Path(slot_number): Path<u32>,
) -> ApiResult<Json<SlotResponse>> {
    let car = state.ledger.slot_info(slot_number).await?;
    Ok(Json(SlotResponse {
        slot_number,
        occupied: car.is_some(),
        car,
    }))
}

pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<OccupancyStats>> {
    let stats = state.ledger.stats().await?;
    Ok(Json(stats))
}

pub async fn list_receipts(
    State(state): State<AppState>,
    Query(query): Query<ReceiptsQuery>,
) -> ApiResult<Json<Vec<Receipt>>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECEIPT_LIMIT);
    if limit == 0 || limit > MAX_RECEIPT_LIMIT {
        return Err(ApiError::BadRequest {
            message: format!("limit must be between 1 and {MAX_RECEIPT_LIMIT}"),
        });
    }

    let receipts = state.ledger.recent_receipts(limit).await?;
    Ok(Json(receipts))
}
