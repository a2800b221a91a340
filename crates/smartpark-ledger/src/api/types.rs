//! Request and response bodies for the HTTP API

use crate::domain::types::ParkedCar;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RECEIPT_LIMIT: usize = 10;
pub const MAX_RECEIPT_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnterCarRequest {
    pub plate_number: String,
    pub owner_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitCarRequest {
    pub plate_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotResponse {
    pub slot_number: u32,
    pub occupied: bool,
    pub car: Option<ParkedCar>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub available_slots: u32,
}
