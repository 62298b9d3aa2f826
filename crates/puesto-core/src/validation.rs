//! # Validation Module
//!
//! Input validation for caller-supplied values. Runs before any business
//! logic; the repository layer and the database constraints behind it catch
//! what slips through, but the goal is that bad input never leaves the
//! service boundary.

use crate::error::ValidationError;
use crate::MAX_SALE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a flavor name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 100 characters
///
/// Returns the trimmed name.
pub fn validate_flavor_name(name: &str) -> ValidationResult<String> {
    validate_required_text("name", name, 100)
}

/// Validates a customer alias.
pub fn validate_customer_alias(alias: &str) -> ValidationResult<String> {
    validate_required_text("alias", alias, 100)
}

/// Validates a business name.
pub fn validate_business_name(name: &str) -> ValidationResult<String> {
    validate_required_text("business_name", name, 200)
}

fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale or debit quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_SALE_QUANTITY (guards against a typo like 1000
///   when 10 was meant)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_SALE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_SALE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (giveaways).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a payment amount in cents. Must be strictly positive; the
/// balance ceiling is checked later against the live record.
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Validates the operator-entered cash-out figures.
///
/// Counted and withdrawn must both be non-negative; the withdrawn-vs-counted
/// comparison is a business rule handled by the cash-out itself.
pub fn validate_cash_out_amounts(counted_cents: i64, withdrawn_cents: i64) -> ValidationResult<()> {
    if counted_cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "counted cash".to_string(),
        });
    }

    if withdrawn_cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "withdrawn amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
