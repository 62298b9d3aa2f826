//! # puesto-db: Database Layer for Puesto POS
//!
//! SQLite storage for the Puesto POS ledger, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  puesto-ledger service (process_sale, close_day, ...)               │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌─────────────────────────────────────────────────────────────┐    │
//! │  │                  puesto-db (THIS CRATE)                     │    │
//! │  │                                                             │    │
//! │  │   ┌────────────┐   ┌───────────────┐   ┌──────────────┐     │    │
//! │  │   │  Database  │   │ Repositories  │   │  Migrations  │     │    │
//! │  │   │ (pool.rs)  │◄──│ inventory.rs  │   │  (embedded)  │     │    │
//! │  │   │            │   │ customer.rs   │   │ 001_init.sql │     │    │
//! │  │   │ SqlitePool │   │ register.rs   │   │              │     │    │
//! │  │   └────────────┘   │ ...           │   └──────────────┘     │    │
//! │  │                    └───────────────┘                        │    │
//! │  └─────────────────────────────────────────────────────────────┘    │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database file (WAL mode, foreign keys on)                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and combined rule/storage error types
//! - [`repository`] - Repository implementations per aggregate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use puesto_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/puesto.db")).await?;
//! let batch = db.inventory().register_batch("flavor-id", 10000, 20, None).await?;
//! let debit = db.inventory().debit("flavor-id", 2).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, StoreError, StoreResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::config::ConfigRepository;
pub use repository::customer::CustomerRepository;
pub use repository::flavor::FlavorRepository;
pub use repository::inventory::{InventoryRepository, StockDebit};
pub use repository::register::RegisterRepository;
pub use repository::sale::SaleRepository;
