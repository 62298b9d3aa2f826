//! # Error Types
//!
//! Domain-specific error types for puesto-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  puesto-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  puesto-db errors (separate crate)                                  │
//! │  └── DbError          - Storage operation failures                  │
//! │                                                                     │
//! │  puesto-ledger errors (service layer)                               │
//! │  └── ApiError         - What the frontend sees (serialized)         │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → ApiError → Frontend            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, amounts, quantities)
//! 3. Errors are enum variants, never String
//! 4. Business-rule failures are expected outcomes, not panics

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations in the ledger core.
///
/// These are expected outcomes of normal operation (a customer trying to
/// overpay, the last unit selling out under a cashier's hands) and are
/// returned as typed results so the UI can present them, never thrown away.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Flavor cannot be found in the catalog.
    #[error("Flavor not found: {0}")]
    FlavorNotFound(String),

    /// Customer cannot be found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Debit exceeds available stock.
    ///
    /// Reports the available quantity so the caller can offer a
    /// reduced-quantity retry ("only 3 left").
    #[error("Insufficient stock for {flavor_id}: available {available}, requested {requested}")]
    InsufficientStock {
        flavor_id: String,
        available: i64,
        requested: i64,
    },

    /// Payment amount exceeds the customer's outstanding balance.
    ///
    /// Overpayments are rejected, never clamped: a balance must not go
    /// negative, and silently shrinking the payment would falsify the
    /// cash received.
    #[error("Payment of {requested_cents} cents exceeds balance of {balance_cents} cents")]
    ExceedsBalance {
        requested_cents: i64,
        balance_cents: i64,
    },

    /// Customer deletion blocked by a nonzero balance.
    #[error("Customer {customer_id} has an outstanding balance of {balance_cents} cents")]
    HasOutstandingBalance {
        customer_id: String,
        balance_cents: i64,
    },

    /// A credit sale was submitted without a customer.
    #[error("A credit sale requires a customer")]
    MissingCustomer,

    /// Cash-out attempted on a day that is already closed.
    #[error("Day {date_key} is already closed")]
    AlreadyClosed { date_key: String },

    /// A sale or payment was posted against a closed day.
    ///
    /// Once a day is reconciled its expected-cash baseline is frozen;
    /// late postings would silently invalidate the stored variance.
    #[error("Day {date_key} is closed; no further postings accepted")]
    DayClosed { date_key: String },

    /// Withdrawal exceeds the cash physically counted.
    #[error("Cannot withdraw {withdrawn_cents} cents from {counted_cents} cents counted")]
    InvalidWithdrawal {
        withdrawn_cents: i64,
        counted_cents: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller-supplied values fail a precondition. Always
/// recoverable by correcting the input; never retried automatically.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g. invalid UUID, malformed date key).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
