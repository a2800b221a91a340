use crate::error::LedgerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Ledger(err) => match err {
                LedgerError::InvalidInput { .. } | LedgerError::InvalidSlot { .. } => {
                    StatusCode::BAD_REQUEST
                }
                LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
                LedgerError::DuplicatePlate { .. } | LedgerError::LotFull { .. } => {
                    StatusCode::CONFLICT
                }
                LedgerError::BackendUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Ledger(err) => err.error_code(),
            ApiError::BadRequest { .. } => "SMARTPARK_BAD_REQUEST",
            ApiError::NotFound { .. } => "SMARTPARK_NOT_FOUND",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Ledger(err) if err.is_retryable())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "timestamp": chrono::Utc::now(),
                "retryable": self.is_retryable(),
            }
        }));

        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::PlateNumber;

    #[test]
    fn test_status_mapping() {
        let plate = PlateNumber::normalize("RAD 123A");
        assert_eq!(
            ApiError::from(LedgerError::DuplicatePlate {
                plate: plate.clone()
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(LedgerError::LotFull { capacity: 50 }).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(LedgerError::NotFound { plate }).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(LedgerError::backend("query_active", "timeout")).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_retryable_only_for_backend() {
        assert!(ApiError::from(LedgerError::backend("persist_exit", "reset")).is_retryable());
        assert!(!ApiError::BadRequest {
            message: "limit".to_string()
        }
        .is_retryable());
    }
}
