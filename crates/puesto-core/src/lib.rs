//! # puesto-core: Pure Business Logic for Puesto POS
//!
//! This crate is the **heart** of Puesto POS. It contains the ledger and
//! accounting rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Puesto POS Architecture                        │
//! │                                                                     │
//! │  UI shell (external)                                                │
//! │       │                                                             │
//! │  ┌────▼────────────────────────────────────────────────────────┐    │
//! │  │                puesto-ledger (services)                     │    │
//! │  │    process_sale, record_payment, close_day, catalog         │    │
//! │  └────┬────────────────────────────────────────────────────────┘    │
//! │       │                                                             │
//! │  ┌────▼────────────────────────────────────────────────────────┐    │
//! │  │                puesto-db (SQLite repositories)              │    │
//! │  │    every transaction boundary lives here                    │    │
//! │  └────┬────────────────────────────────────────────────────────┘    │
//! │       │                                                             │
//! │  ┌────▼────────────────────────────────────────────────────────┐    │
//! │  │              ★ puesto-core (THIS CRATE) ★                   │    │
//! │  │                                                             │    │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌────────────┐        │    │
//! │  │   │  types  │ │  money  │ │ costing │ │ validation │        │    │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └────────────┘        │    │
//! │  │                                                             │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS        │    │
//! │  └─────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Flavor, Sale, Customer, DailyRegister, ...)
//! - [`money`] - Money type with integer-cents arithmetic (no floating point!)
//! - [`costing`] - Weighted-average costing, sale totals, reconciliation math
//! - [`dates`] - Register date keys and promise-date bookkeeping
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic, same input = same output
//! 2. **No I/O**: database, network, and clock access are FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64) to avoid float drift
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
pub mod dates;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Row id of the singleton business-configuration record.
pub const CONFIG_ID: &str = "business";

/// Default sale price per unit until the owner configures one.
pub const DEFAULT_PRICE_CENTS: i64 = 1000;

/// Default business name for a fresh installation.
pub const DEFAULT_BUSINESS_NAME: &str = "Puesto";

/// Default currency code (display metadata only).
pub const DEFAULT_CURRENCY_CODE: &str = "MXN";

/// Maximum quantity accepted by a single sale or debit.
///
/// Guards against fat-finger entries (1000 typed instead of 10); the real
/// ceiling is whatever stock is on hand.
pub const MAX_SALE_QUANTITY: i64 = 999;

/// Suggested tile colors for new flavors, offered by the catalog UI.
pub const SUGGESTED_COLORS: &[&str] = &[
    "#EF4444", "#F59E0B", "#F97316", "#EAB308", "#84CC16", "#22C55E", "#10B981", "#14B8A6",
    "#06B6D4", "#0EA5E9", "#3B82F6", "#6366F1", "#8B5CF6", "#A855F7", "#D946EF", "#EC4899",
    "#F43F5E", "#6B7280",
];

/// Suggested tile emojis for new flavors.
pub const SUGGESTED_EMOJIS: &[&str] = &[
    "🥜", "🌶️", "🧂", "🍯", "🔥", "🌿", "🍋", "🧀", "🥓", "🌽", "🥕", "🍫", "🍬", "☀️", "🌙", "⭐",
];
