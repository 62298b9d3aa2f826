//! # puesto-ledger: Orchestration Services for Puesto POS
//!
//! The coordination layer between the UI shell and the storage layer. Each
//! service wires repositories into one user-facing flow and converts every
//! failure into the serializable [`ApiError`] the frontend displays.
//!
//! ## Services
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  SalesService    process_sale: debit → sale → charge → register,    │
//! │                  with full unwind when a downstream step fails      │
//! │  DebtService     customers, payments (+ register posting), debtor   │
//! │                  views, account statements                          │
//! │  CashOutService  end-of-day reconciliation and day summaries        │
//! │  CatalogService  flavors, production batches, read-through cache    │
//! │  SettingsService explicit business-config load/update               │
//! │                                                                     │
//! │  Cart            serializable session cart (presentation-owned)     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use puesto_db::{Database, DbConfig};
//! use puesto_ledger::{SalesService, SettingsService, SaleRequest};
//!
//! let db = Database::new(DbConfig::new("./puesto.db")).await?;
//! let config = SettingsService::new(db.clone()).load().await?;
//!
//! let sales = SalesService::new(db);
//! let outcome = sales.process_sale(&config, request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod cashout;
pub mod catalog;
pub mod debts;
pub mod error;
pub mod sales;
pub mod settings;

// =============================================================================
// Re-exports
// =============================================================================

pub use cart::{Cart, CartLine};
pub use cashout::{CashOutService, DaySummary};
pub use catalog::{CatalogService, FlavorCache, FlavorInput, FlavorSnapshot};
pub use debts::{CustomerInput, DebtService};
pub use error::{ApiError, ErrorCode};
pub use sales::{SaleOutcome, SaleRequest, SalesService};
pub use settings::SettingsService;
