//! # Sales Service
//!
//! Orchestrates a complete sale across the inventory, sale, debt, and
//! register aggregates.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  1. validate input (quantity, credit ⇒ customer)                    │
//! │  2. resolve unit price (override or configured default)             │
//! │  3. inventory.debit()       ← the ONLY step allowed to abort        │
//! │  4. compute revenue / cost / profit from the snapshotted cost       │
//! │  5. sales.insert()                   ┐                              │
//! │  6. customers.charge()  (credit)     ├─ any failure here unwinds    │
//! │  7. register.post_sale()             ┘  everything: charge reversed,│
//! │                                         sale deleted, stock         │
//! │                                         re-credited                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is the scarce, race-prone resource, so it is reserved first; the
//! remaining writes are unwound in reverse order if any of them fails
//! (full compensation - a sale never half-exists). The register posting
//! goes last because its columns are strictly additive: unwinding must
//! never subtract from a register row.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::ApiError;
use puesto_core::costing::sale_totals;
use puesto_core::dates::date_key;
use puesto_core::validation::{validate_price_cents, validate_quantity};
use puesto_core::{BusinessConfig, CoreError, Money, PaymentKind, Sale};
use puesto_db::Database;

/// Input for one sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    pub flavor_id: String,
    pub quantity: i64,
    pub payment_kind: PaymentKind,
    /// Required when `payment_kind` is credit.
    pub customer_id: Option<String>,
    /// Overrides the configured default price when present.
    pub override_price_cents: Option<i64>,
}

/// Result of a processed sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleOutcome {
    pub sale: Sale,
    pub revenue_cents: i64,
    pub cost_cents: i64,
    pub profit_cents: i64,
    pub remaining_stock: i64,
}

/// Service coordinating sale processing.
#[derive(Debug, Clone)]
pub struct SalesService {
    db: Database,
}

impl SalesService {
    /// Creates a new SalesService.
    pub fn new(db: Database) -> Self {
        SalesService { db }
    }

    /// Processes one sale end to end.
    ///
    /// `config` is the configuration loaded at startup, passed in
    /// explicitly; the sale never reaches into ambient state for a price.
    pub async fn process_sale(
        &self,
        config: &BusinessConfig,
        request: SaleRequest,
    ) -> Result<SaleOutcome, ApiError> {
        debug!(
            flavor_id = %request.flavor_id,
            quantity = request.quantity,
            kind = ?request.payment_kind,
            "process_sale"
        );

        // -- 1. validate ------------------------------------------------------
        validate_quantity(request.quantity).map_err(CoreError::from)?;

        if let Some(price) = request.override_price_cents {
            validate_price_cents(price).map_err(CoreError::from)?;
        }

        let customer_id = match (request.payment_kind, &request.customer_id) {
            (PaymentKind::Credit, None) => return Err(CoreError::MissingCustomer.into()),
            (PaymentKind::Credit, Some(id)) => {
                // Fail before touching stock rather than compensating later.
                self.db
                    .customers()
                    .get_by_id(id)
                    .await
                    .map_err(ApiError::from)?
                    .ok_or_else(|| ApiError::from(CoreError::CustomerNotFound(id.clone())))?;
                Some(id.clone())
            }
            (PaymentKind::Cash, _) => None,
        };

        let flavor = self
            .db
            .flavors()
            .get_by_id(&request.flavor_id)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::from(CoreError::FlavorNotFound(request.flavor_id.clone())))?;

        // -- 2. resolve price -------------------------------------------------
        let unit_price_cents = request
            .override_price_cents
            .unwrap_or(config.default_price_cents);

        // -- 3. debit stock (the only aborting step) --------------------------
        let debit = self
            .db
            .inventory()
            .debit(&request.flavor_id, request.quantity)
            .await?;

        // -- 4. compute totals from the snapshotted cost ----------------------
        let totals = sale_totals(
            request.quantity,
            Money::from_cents(unit_price_cents),
            Money::from_cents(debit.unit_cost_cents),
        );

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            flavor_id: request.flavor_id.clone(),
            quantity: request.quantity,
            unit_price_cents,
            unit_cost_cents: debit.unit_cost_cents,
            payment_kind: request.payment_kind,
            customer_id: customer_id.clone(),
            flavor_name_snapshot: Some(flavor.name.clone()),
            sold_at: now,
        };

        // -- 5. persist the sale ----------------------------------------------
        if let Err(e) = self.db.sales().insert(&sale).await {
            self.unwind(&sale, Applied::Debit).await;
            return Err(e.into());
        }

        // -- 6. post the debt (credit sales) ----------------------------------
        if let Some(customer_id) = &customer_id {
            if let Err(e) = self
                .db
                .customers()
                .charge(customer_id, totals.revenue.cents())
                .await
            {
                self.unwind(&sale, Applied::Sale).await;
                return Err(e.into());
            }
        }

        // -- 7. roll into the daily register ----------------------------------
        if let Err(e) = self
            .db
            .register()
            .post_sale(
                &date_key(sale.sold_at),
                sale.payment_kind,
                totals.revenue.cents(),
                totals.cost.cents(),
            )
            .await
        {
            self.unwind(&sale, Applied::Charge).await;
            return Err(e.into());
        }

        info!(
            sale_id = %sale.id,
            flavor = %flavor.name,
            revenue = %totals.revenue,
            profit = %totals.profit,
            "Sale processed"
        );

        Ok(SaleOutcome {
            sale,
            revenue_cents: totals.revenue.cents(),
            cost_cents: totals.cost.cents(),
            profit_cents: totals.profit.cents(),
            remaining_stock: debit.remaining,
        })
    }

    /// Unwinds a partially applied sale in reverse order, undoing only the
    /// steps that actually ran. Best effort: a compensation failure is
    /// logged loudly but must not mask the original error the caller is
    /// about to receive.
    async fn unwind(&self, sale: &Sale, applied: Applied) {
        if applied >= Applied::Charge {
            if let Some(customer_id) = &sale.customer_id {
                if let Err(e) = self
                    .db
                    .customers()
                    .reverse_charge(customer_id, sale.revenue().cents())
                    .await
                {
                    error!(sale_id = %sale.id, "Compensation failed reversing charge: {e}");
                }
            }
        }

        if applied >= Applied::Sale {
            if let Err(e) = self.db.sales().delete(&sale.id).await {
                error!(sale_id = %sale.id, "Compensation failed deleting sale: {e}");
            }
        }

        if let Err(e) = self
            .db
            .inventory()
            .credit(&sale.flavor_id, sale.quantity)
            .await
        {
            error!(sale_id = %sale.id, "Compensation failed re-crediting stock: {e}");
        }

        info!(sale_id = %sale.id, "Sale unwound after downstream failure");
    }
}

/// How far a sale's downstream writes got before a step failed. Everything
/// up to and including the named step has been applied and must be undone
/// (the debit is always applied by the time unwinding starts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Applied {
    Debit,
    Sale,
    Charge,
}

// =============================================================================
// Unit Tests
// =============================================================================
