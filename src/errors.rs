use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::stock_movement::StockMovementType;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g. "Not Found", "Unprocessable Entity")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// Closed set of failures the stock ledger can report.
///
/// Callers branch on the variant, never on message text. Structural
/// validation variants are produced before any transaction is opened;
/// `InsufficientStock` is produced inside the transaction and always rolls it
/// back.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid movement type: {0}")]
    InvalidMovementType(String),

    #[error("Movement type {0} requires a from location")]
    MissingFromLocation(StockMovementType),

    #[error("Movement type {0} requires a to location")]
    MissingToLocation(StockMovementType),

    #[error("Transfer source and destination locations must differ")]
    TransferSameLocation,

    #[error("Quantity must be a positive integer, got {0}")]
    NonPositiveQuantity(i64),

    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("Balance overflow: current {current}, requested increase {requested}")]
    BalanceOverflow { current: i64, requested: i64 },

    #[error("SKU already in use: {0}")]
    DuplicateSku(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Wraps a string-based persistence failure.
    pub fn db_message(message: impl Into<String>) -> Self {
        ServiceError::DatabaseError(DbErr::Custom(message.into()))
    }

    /// Single source of truth for error-to-status mapping.
    ///
    /// Business-rule failures (insufficient stock) are distinguished from
    /// structural validation (400) and missing resources (404).
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidMovementType(_)
            | Self::MissingFromLocation(_)
            | Self::MissingToLocation(_)
            | Self::TransferSameLocation
            | Self::NonPositiveQuantity(_)
            | Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientStock { .. } | Self::BalanceOverflow { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::DuplicateSku(_) => StatusCode::CONFLICT,
            Self::DatabaseError(_) | Self::EventError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message suitable for HTTP responses. Internal errors return a generic
    /// message; details go to the logs only.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::EventError(_) | Self::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            message: self.response_message(),
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}
