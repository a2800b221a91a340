use crate::domain::types::{PlateNumber, SlotNumber};
use thiserror::Error;

/// Outcomes a ledger operation can fail with.
///
/// All of these are expected business results. Callers branch on them; none
/// of them indicate a bug in the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Car with plate {plate} is already parked")]
    DuplicatePlate { plate: PlateNumber },

    #[error("Parking is full: all {capacity} slots are occupied")]
    LotFull { capacity: u32 },

    #[error("Car with plate {plate} not found in parking")]
    NotFound { plate: PlateNumber },

    #[error("Slot {slot} is outside the valid range 1..={capacity}")]
    InvalidSlot { slot: SlotNumber, capacity: u32 },

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Storage backend unavailable during {operation}: {reason}")]
    BackendUnavailable {
        operation: &'static str,
        reason: String,
    },
}

impl LedgerError {
    pub fn backend(operation: &'static str, source: impl std::fmt::Display) -> Self {
        Self::BackendUnavailable {
            operation,
            reason: source.to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::DuplicatePlate { .. } => "SMARTPARK_DUPLICATE_PLATE",
            LedgerError::LotFull { .. } => "SMARTPARK_LOT_FULL",
            LedgerError::NotFound { .. } => "SMARTPARK_NOT_FOUND",
            LedgerError::InvalidSlot { .. } => "SMARTPARK_INVALID_SLOT",
            LedgerError::InvalidInput { .. } => "SMARTPARK_INVALID_INPUT",
            LedgerError::BackendUnavailable { .. } => "SMARTPARK_BACKEND_UNAVAILABLE",
        }
    }

    /// Only backend failures are transient; everything else reflects lot state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::BackendUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
