//! # API Error Type
//!
//! Unified error type for the service layer.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  CoreError (business rule) ──┐                                      │
//! │                              ├──► ApiError { code, message }        │
//! │  DbError (storage)        ───┘         │                            │
//! │                                        ▼                            │
//! │  Frontend switches on `code`, shows `message`                       │
//! │                                                                     │
//! │  Business-rule failures are final: the user changes something and   │
//! │  resubmits. STORAGE_UNAVAILABLE is the one retryable code, and the  │
//! │  retry belongs to the caller - a multi-step sale is not idempotent, │
//! │  so the services never retry internally.                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use puesto_core::CoreError;
use puesto_db::{DbError, StoreError};

/// API error returned from service operations.
///
/// ## Serialization
/// What the frontend receives when an operation fails:
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for chile-limon: available 3, requested 5"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Debit exceeds available stock
    InsufficientStock,

    /// Payment exceeds the customer's balance
    ExceedsBalance,

    /// Customer deletion blocked by a nonzero balance
    OutstandingBalance,

    /// Credit sale submitted without a customer
    MissingCustomer,

    /// Cash-out attempted twice for the same day
    AlreadyClosed,

    /// Sale or payment posted against a closed day
    DayClosed,

    /// Withdrawal exceeds counted cash
    InvalidWithdrawal,

    /// Storage unreachable; safe for the caller to retry
    StorageUnavailable,

    /// Storage failed in a non-retryable way
    StorageError,

    /// Internal error
    Internal,
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
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Whether the caller may retry the failed operation as-is.
    ///
    /// Only true when storage was unreachable: the operation never started,
    /// so retrying cannot double-apply it.
    pub fn retryable(&self) -> bool {
        self.code == ErrorCode::StorageUnavailable
    }
}

/// Converts business rule violations to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let code = match err {
            CoreError::FlavorNotFound(_) | CoreError::CustomerNotFound(_) => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::ExceedsBalance { .. } => ErrorCode::ExceedsBalance,
            CoreError::HasOutstandingBalance { .. } => ErrorCode::OutstandingBalance,
            CoreError::MissingCustomer => ErrorCode::MissingCustomer,
            CoreError::AlreadyClosed { .. } => ErrorCode::AlreadyClosed,
            CoreError::DayClosed { .. } => ErrorCode::DayClosed,
            CoreError::InvalidWithdrawal { .. } => ErrorCode::InvalidWithdrawal,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, message)
    }
}

/// Converts storage errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            e if e.is_unavailable() => {
                tracing::warn!("Storage unavailable: {}", e);
                ApiError::new(ErrorCode::StorageUnavailable, "Storage is unavailable")
            }
            e => {
                // Log the real failure but keep the surface message generic.
                tracing::error!("Storage error: {}", e);
                ApiError::new(ErrorCode::StorageError, "Storage operation failed")
            }
        }
    }
}

/// Converts combined rule/storage errors to API errors.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rule(e) => e.into(),
            StoreError::Db(e) => e.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================
