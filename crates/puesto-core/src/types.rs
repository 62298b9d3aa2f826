//! # Domain Types
//!
//! Core domain types for the Puesto POS ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Catalog              Inventory                Ledger               │
//! │  ┌────────────┐       ┌─────────────────┐      ┌──────────────┐     │
//! │  │  Flavor    │◄──────│ ProductionBatch │      │    Sale      │     │
//! │  │  id, name  │       │ InventoryRecord │─────►│   Payment    │     │
//! │  │  active    │       │ qty, avg cost   │      │  (immutable) │     │
//! │  └────────────┘       └─────────────────┘      └──────┬───────┘     │
//! │                                                       │             │
//! │  ┌────────────┐       ┌─────────────────┐      ┌──────▼───────┐     │
//! │  │  Customer  │       │  DailyRegister  │─────►│   CashOut    │     │
//! │  │  balance   │       │  per-day totals │      │ (terminal)   │     │
//! │  └────────────┘       └─────────────────┘      └──────────────┘     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - Every entity id is a UUID v4 string; references are by id, never embedded.
//! - Monetary fields are stored as `*_cents: i64`; use the accessor methods
//!   to get [`Money`] values for arithmetic.
//! - `Sale` and `Payment` are immutable once created: history is append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Flavor (catalog entry)
// =============================================================================

/// A product flavor available for production and sale.
///
/// Flavors carry display attributes for the sale-entry grid and a soft-delete
/// flag; deactivating a flavor hides it from the catalog without touching the
/// historical sales that reference it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Flavor {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on the sale grid.
    pub name: String,

    /// Emoji shown on the flavor tile.
    pub emoji: String,

    /// Tile color (hex string).
    pub color: String,

    /// Whether the flavor is visible in the catalog (soft delete).
    pub is_active: bool,

    /// When the flavor was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Production Batch
// =============================================================================

/// A production run: total input cost turned into a unit count.
///
/// Immutable once created. The derived `unit_cost_cents` is frozen here so
/// batch history always shows what each unit actually cost to make, even
/// after later batches move the weighted average.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductionBatch {
    pub id: String,

    /// Flavor this batch produced.
    pub flavor_id: String,

    /// Total input cost for the whole batch.
    pub input_cost_cents: i64,

    /// Units produced by the batch.
    pub units_produced: i64,

    /// Derived per-unit cost: input cost / units, rounded to the cent.
    pub unit_cost_cents: i64,

    pub notes: Option<String>,

    #[ts(as = "String")]
    pub produced_at: DateTime<Utc>,
}

impl ProductionBatch {
    /// Returns the per-unit cost as Money.
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }

    /// Returns the total input cost as Money.
    #[inline]
    pub fn input_cost(&self) -> Money {
        Money::from_cents(self.input_cost_cents)
    }
}

// =============================================================================
// Inventory Record
// =============================================================================

/// The live stock position for one flavor.
///
/// ## Invariants
/// - `quantity` never goes negative (debits are guarded).
/// - `avg_cost_cents` is the weighted average of every batch to date,
///   recomputed on each batch registration, untouched by sales.
///
/// Upserted lazily on a flavor's first batch; mutated only by batch
/// registration (increase) and sale debits (decrease).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryRecord {
    /// Flavor this record tracks (primary key).
    pub flavor_id: String,

    /// Units on hand.
    pub quantity: i64,

    /// Weighted-average cost per unit.
    pub avg_cost_cents: i64,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    /// Returns the weighted-average unit cost as Money.
    #[inline]
    pub fn avg_cost(&self) -> Money {
        Money::from_cents(self.avg_cost_cents)
    }

    /// Value of the units on hand at the current average cost.
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.avg_cost().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer who can buy on credit.
///
/// ## Invariants
/// - `balance_cents` never goes negative (overpayments are rejected).
/// - A customer with a positive balance cannot be deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,

    /// Short display name ("Doña Mari").
    pub alias: String,

    pub phone: Option<String>,

    pub notes: Option<String>,

    /// Outstanding balance owed to the business.
    pub balance_cents: i64,

    /// Date the customer promised to settle, if one was agreed.
    #[ts(as = "Option<String>")]
    pub promised_payment_at: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Returns the outstanding balance as Money.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }

    /// Whether the customer currently owes anything.
    #[inline]
    pub fn has_debt(&self) -> bool {
        self.balance_cents > 0
    }
}

/// A customer with debt, annotated for the collections view.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Debtor {
    pub customer: Customer,

    /// Whether the promised payment date has passed.
    pub is_overdue: bool,

    /// Days past the promise (negative = still in the future), if one exists.
    pub days_overdue: Option<i64>,
}

// =============================================================================
// Payment Kind
// =============================================================================

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Cash in the register, counted at end of day.
    Cash,
    /// On credit ("fiado"): posts to the customer's balance instead.
    Credit,
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale. Immutable once created.
///
/// ## Snapshot Pattern
/// `unit_cost_cents` is the inventory record's weighted-average cost **at the
/// moment of the debit**, frozen into the sale. Later batches move the
/// average; recorded profit never shifts under history. `flavor_name_snapshot`
/// serves the same purpose for display.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,

    pub flavor_id: String,

    /// Units sold (positive).
    pub quantity: i64,

    /// Sale price per unit at time of sale.
    pub unit_price_cents: i64,

    /// Weighted-average cost per unit at time of the inventory debit (frozen).
    pub unit_cost_cents: i64,

    pub payment_kind: PaymentKind,

    /// Required when `payment_kind` is credit, absent for cash.
    pub customer_id: Option<String>,

    /// Flavor name at time of sale, for historical display.
    pub flavor_name_snapshot: Option<String>,

    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
}

impl Sale {
    /// Total revenue: unit price x quantity.
    #[inline]
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    /// Total cost at the snapshotted unit cost.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents).multiply_quantity(self.quantity)
    }

    /// Profit on the sale (informational).
    #[inline]
    pub fn profit(&self) -> Money {
        self.revenue() - self.cost()
    }
}

// =============================================================================
// Payment (abono)
// =============================================================================

/// A payment a customer made against their balance. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,

    pub customer_id: String,

    /// Amount paid (positive, at most the balance at time of payment).
    pub amount_cents: i64,

    pub notes: Option<String>,

    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Daily Cash Register
// =============================================================================

/// Running totals for one calendar day, keyed by `YYYY-MM-DD`.
///
/// Created lazily on the first sale or payment of the day; every posting is
/// purely additive. `total_cash_cents` is a derived column: it always equals
/// `cash_sales_cents + cash_payments_cents` and is recomputed by the same
/// statement that applies an increment, never updated independently.
///
/// Once `is_closed` is set by the cash-out, the day rejects further postings:
/// `OPEN → CLOSED` is terminal.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailyRegister {
    /// Calendar date key, `YYYY-MM-DD` (primary key).
    pub date_key: String,

    /// Cash received from sales.
    pub cash_sales_cents: i64,

    /// Cash received from debt payments.
    pub cash_payments_cents: i64,

    /// Derived: cash_sales + cash_payments.
    pub total_cash_cents: i64,

    /// Revenue sold on credit (not in the drawer).
    pub credit_sales_cents: i64,

    /// Cost of goods sold this day (cash and credit alike).
    pub cost_of_goods_cents: i64,

    /// Set by the cash-out; no posting or second cash-out is accepted after.
    pub is_closed: bool,
}

impl DailyRegister {
    /// An empty register row for a day with no activity yet.
    pub fn empty(date_key: impl Into<String>) -> Self {
        DailyRegister {
            date_key: date_key.into(),
            cash_sales_cents: 0,
            cash_payments_cents: 0,
            total_cash_cents: 0,
            credit_sales_cents: 0,
            cost_of_goods_cents: 0,
            is_closed: false,
        }
    }

    /// Returns the expected drawer cash as Money.
    #[inline]
    pub fn total_cash(&self) -> Money {
        Money::from_cents(self.total_cash_cents)
    }
}

// =============================================================================
// Cash-Out (end-of-day reconciliation)
// =============================================================================

/// The reconciliation record produced by closing a day. One per day, ever.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashOut {
    pub id: String,

    /// The day being closed, `YYYY-MM-DD`.
    pub date_key: String,

    /// What the register said should be in the drawer.
    pub expected_cents: i64,

    /// What the operator physically counted.
    pub counted_cents: i64,

    /// counted - expected (negative means missing cash).
    pub variance_cents: i64,

    /// Cash taken out of the drawer.
    pub withdrawn_cents: i64,

    /// Cash left to float the next day: counted - withdrawn, floored at 0.
    pub next_day_float_cents: i64,

    pub notes: Option<String>,

    #[ts(as = "String")]
    pub closed_at: DateTime<Utc>,
}

impl CashOut {
    /// Returns the variance as Money (negative = missing cash).
    #[inline]
    pub fn variance(&self) -> Money {
        Money::from_cents(self.variance_cents)
    }
}

// =============================================================================
// Business Configuration
// =============================================================================

/// Business-level settings, loaded once at startup and passed explicitly to
/// the operations that need them (never read ambiently mid-transaction).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BusinessConfig {
    /// Singleton row id (see [`crate::CONFIG_ID`]).
    pub id: String,

    pub business_name: String,

    /// Default sale price per unit when the cashier doesn't override.
    pub default_price_cents: i64,

    /// ISO 4217 code; display metadata only, no currency arithmetic.
    pub currency_code: String,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl BusinessConfig {
    /// Returns the default sale price as Money.
    #[inline]
    pub fn default_price(&self) -> Money {
        Money::from_cents(self.default_price_cents)
    }
}

// =============================================================================
// Account Statement
// =============================================================================

/// Whether a statement entry increased or decreased the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A credit sale charged to the account.
    Charge,
    /// A payment against the account.
    Payment,
}

/// One line of a customer's unified account statement.
///
/// Computed on demand by merging the customer's credit sales and payments
/// chronologically; `running_balance_cents` is re-rounded at each step so the
/// statement reproduces the stored balance exactly.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AccountEntry {
    pub id: String,

    #[ts(as = "String")]
    pub at: DateTime<Utc>,

    pub kind: EntryKind,

    /// Human-readable description ("3x Chile Limón", "Abono").
    pub description: String,

    pub amount_cents: i64,

    /// Balance after this entry.
    pub running_balance_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
