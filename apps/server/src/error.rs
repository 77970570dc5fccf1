//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Mesha POS                              │
//! │                                                                         │
//! │  Handler -> Result<Json<T>, ApiError>                                   │
//! │         │                                                               │
//! │         ├── DbError        ──┐                                          │
//! │         ├── CoreError      ──┼──► ApiError { code, message } + status   │
//! │         ├── CheckoutError  ──┤                                          │
//! │         ├── SessionError   ──┤                                          │
//! │         └── ValidationError ─┘                                          │
//! │                                                                         │
//! │  Response body:                                                         │
//! │  { "code": "INSUFFICIENT_STOCK",                                        │
//! │    "message": "Insufficient stock for Sugar 1kg: 2 available, ..." }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repository and internal failures are logged here with their details; the
//! client only sees a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mesha_core::{CoreError, ValidationError};
use mesha_db::DbError;
use serde::{Deserialize, Serialize};

use crate::services::checkout::CheckoutError;
use crate::services::reports::ReportError;
use crate::state::SessionError;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Item not found: 6f1c..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Negotiated price outside the allowed range (400)
    PriceOutOfRange,

    /// Quantity below 1 (400)
    InvalidQuantity,

    /// Not enough units on hand (422)
    InsufficientStock,

    /// Cash tendered below the total (422)
    InsufficientCash,

    /// M-Pesa selected without a transaction code (422)
    MissingTransactionCode,

    /// Checkout of an empty cart (422)
    EmptyCart,

    /// Cart line limit reached (422)
    CartTooLarge,

    /// Price, stock or total beyond what the till handles (422)
    AmountTooLarge,

    /// Open session cap reached (503)
    SessionLimit,

    /// Report period has no sales (404)
    NoSalesData,

    /// Database operation failed (500)
    DatabaseError,

    /// Sale recorded but stock not fully written (500)
    CheckoutIncomplete,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError | ErrorCode::PriceOutOfRange | ErrorCode::InvalidQuantity => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::NotFound | ErrorCode::NoSalesData => StatusCode::NOT_FOUND,
            ErrorCode::InsufficientStock
            | ErrorCode::InsufficientCash
            | ErrorCode::MissingTransactionCode
            | ErrorCode::EmptyCart
            | ErrorCode::CartTooLarge
            | ErrorCode::AmountTooLarge => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::SessionLimit => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseError | ErrorCode::CheckoutIncomplete | ErrorCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, .. } => {
                ApiError::validation(format!("{} already exists", field))
            }
            DbError::PoolExhausted => {
                tracing::warn!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let code = match err {
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::PriceOutOfRange { .. } => ErrorCode::PriceOutOfRange,
            CoreError::InvalidQuantity(_) => ErrorCode::InvalidQuantity,
            CoreError::ItemNotInCart(_) | CoreError::ItemNotFound(_) => ErrorCode::NotFound,
            CoreError::CartTooLarge { .. } => ErrorCode::CartTooLarge,
            CoreError::AmountTooLarge(_) => ErrorCode::AmountTooLarge,
            CoreError::EmptyCart => ErrorCode::EmptyCart,
            CoreError::InsufficientCash { .. } => ErrorCode::InsufficientCash,
            CoreError::MissingTransactionCode => ErrorCode::MissingTransactionCode,
            CoreError::NoSalesInPeriod => ErrorCode::NoSalesData,
            CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::Export(reason) => {
                tracing::error!(%reason, "Report export failed");
                return ApiError::internal("Report export failed");
            }
        };
        ApiError::new(code, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Rejected(core) => core.into(),
            CheckoutError::Repository(db) => db.into(),
            // already logged at error level by the orchestrator
            CheckoutError::Incomplete { sale_id, .. } => ApiError::new(
                ErrorCode::CheckoutIncomplete,
                format!(
                    "Sale {} was recorded but stock levels were not fully updated",
                    sale_id
                ),
            ),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::new(ErrorCode::SessionLimit, err.to_string())
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Core(core) => core.into(),
            ReportError::Repository(db) => db.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
