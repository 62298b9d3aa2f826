//! # Inventory Repository
//!
//! The inventory ledger: batch registration and stock debits.
//!
//! ## The One Critical Section
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  The per-flavor inventory row is the contended resource in the      │
//! │  whole system: two cashiers can sell the last unit at the same      │
//! │  moment, and a production batch can land mid-sale.                  │
//! │                                                                     │
//! │  register_batch:  read ─► blend average ─► insert batch + upsert    │
//! │                   inventory, both in ONE transaction, with the      │
//! │                   upsert guarded on the quantity observed at read   │
//! │                   (compare-and-swap; retried on interference)       │
//! │                                                                     │
//! │  debit:           read (cost snapshot + availability) ─► UPDATE     │
//! │                   ... SET quantity = quantity - n                   │
//! │                   WHERE quantity >= n  ← the no-oversell guard      │
//! │                                                                     │
//! │  Every other table tolerates plain additive updates; this one       │
//! │  never accepts a blind write.                                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult, StoreError, StoreResult};
use puesto_core::costing::{batch_unit_cost, weighted_average_cost};
use puesto_core::validation::validate_quantity;
use puesto_core::{CoreError, InventoryRecord, Money, ProductionBatch};

/// Attempts before giving up when a compare-and-swap keeps losing to
/// concurrent writers.
const MAX_CAS_RETRIES: u32 = 3;

const RECORD_COLUMNS: &str = "flavor_id, quantity, avg_cost_cents, updated_at";
const BATCH_COLUMNS: &str =
    "id, flavor_id, input_cost_cents, units_produced, unit_cost_cents, notes, produced_at";

/// Result of a successful stock debit.
///
/// `unit_cost_cents` is the weighted-average cost **before** the debit; the
/// caller snapshots it into the sale record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDebit {
    pub unit_cost_cents: i64,
    pub remaining: i64,
}

/// Repository for the inventory ledger.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Gets the inventory record for a flavor, if one exists yet.
    pub async fn get(&self, flavor_id: &str) -> DbResult<Option<InventoryRecord>> {
        let record = sqlx::query_as::<_, InventoryRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM inventory WHERE flavor_id = ?1"
        ))
        .bind(flavor_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lists every inventory record, sorted by flavor id.
    pub async fn list(&self) -> DbResult<Vec<InventoryRecord>> {
        let records = sqlx::query_as::<_, InventoryRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM inventory ORDER BY flavor_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Registers a production batch and folds it into the weighted average.
    ///
    /// ## Atomicity
    /// The batch insert and the inventory upsert happen in one transaction:
    /// a batch without its inventory effect (or vice versa) would corrupt
    /// the average-cost invariant permanently. The upsert is guarded on the
    /// quantity observed at read time and the whole transaction retries if a
    /// concurrent sale moved the stock underneath us.
    ///
    /// ## Preconditions
    /// * `units_produced > 0`, `input_cost_cents >= 0` (validation error)
    /// * the flavor exists (`FlavorNotFound`)
    pub async fn register_batch(
        &self,
        flavor_id: &str,
        input_cost_cents: i64,
        units_produced: i64,
        notes: Option<String>,
    ) -> StoreResult<ProductionBatch> {
        let unit_cost = batch_unit_cost(Money::from_cents(input_cost_cents), units_produced)
            .map_err(StoreError::Rule)?;

        for attempt in 0..MAX_CAS_RETRIES {
            match self
                .try_register_batch(flavor_id, input_cost_cents, units_produced, unit_cost, &notes)
                .await
            {
                Ok(batch) => {
                    info!(
                        flavor_id = %flavor_id,
                        units = units_produced,
                        unit_cost = %unit_cost,
                        "Batch registered"
                    );
                    return Ok(batch);
                }
                Err(StoreError::Db(DbError::TransactionFailed(_))) if attempt + 1 < MAX_CAS_RETRIES => {
                    debug!(flavor_id = %flavor_id, attempt, "Batch CAS lost, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(StoreError::Db(DbError::TransactionFailed(format!(
            "inventory for {flavor_id} kept changing during batch registration"
        ))))
    }

    async fn try_register_batch(
        &self,
        flavor_id: &str,
        input_cost_cents: i64,
        units_produced: i64,
        unit_cost: Money,
        notes: &Option<String>,
    ) -> StoreResult<ProductionBatch> {
        let mut tx = self.pool.begin().await?;

        let flavor_exists: Option<String> =
            sqlx::query_scalar("SELECT id FROM flavors WHERE id = ?1")
                .bind(flavor_id)
                .fetch_optional(&mut *tx)
                .await?;
        if flavor_exists.is_none() {
            return Err(StoreError::Rule(CoreError::FlavorNotFound(
                flavor_id.to_string(),
            )));
        }

        let existing = sqlx::query_as::<_, InventoryRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM inventory WHERE flavor_id = ?1"
        ))
        .bind(flavor_id)
        .fetch_optional(&mut *tx)
        .await?;

        let observed_qty = existing.as_ref().map_or(0, |r| r.quantity);
        let new_avg = weighted_average_cost(existing.as_ref(), units_produced, unit_cost);
        let now = Utc::now();

        let batch = ProductionBatch {
            id: Uuid::new_v4().to_string(),
            flavor_id: flavor_id.to_string(),
            input_cost_cents,
            units_produced,
            unit_cost_cents: unit_cost.cents(),
            notes: notes.clone(),
            produced_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO batches (id, flavor_id, input_cost_cents, units_produced,
                                 unit_cost_cents, notes, produced_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&batch.id)
        .bind(&batch.flavor_id)
        .bind(batch.input_cost_cents)
        .bind(batch.units_produced)
        .bind(batch.unit_cost_cents)
        .bind(&batch.notes)
        .bind(batch.produced_at)
        .execute(&mut *tx)
        .await?;

        // Insert-or-update in one statement, guarded on the quantity we read.
        // A fresh row takes the insert path; an existing row only updates if
        // nothing moved the stock since our read (compare-and-swap).
        let result = sqlx::query(
            r#"
            INSERT INTO inventory (flavor_id, quantity, avg_cost_cents, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(flavor_id) DO UPDATE SET
                quantity = inventory.quantity + ?5,
                avg_cost_cents = ?3,
                updated_at = ?4
            WHERE inventory.quantity = ?6
            "#,
        )
        .bind(flavor_id)
        .bind(observed_qty + units_produced)
        .bind(new_avg.cents())
        .bind(now)
        .bind(units_produced)
        .bind(observed_qty)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::Db(DbError::TransactionFailed(
                "concurrent inventory update".to_string(),
            )));
        }

        tx.commit().await?;
        Ok(batch)
    }

    /// Debits stock for a sale, returning the pre-debit average cost.
    ///
    /// ## No-Oversell Guard
    /// The decrement carries `WHERE quantity >= ?n`: no matter how two
    /// concurrent debits interleave, the second one past the limit affects
    /// zero rows and fails with `InsufficientStock`. Quantity can never go
    /// negative.
    pub async fn debit(&self, flavor_id: &str, quantity: i64) -> StoreResult<StockDebit> {
        validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, InventoryRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM inventory WHERE flavor_id = ?1"
        ))
        .bind(flavor_id)
        .fetch_optional(&mut *tx)
        .await?;

        let record = match record {
            Some(r) => r,
            // No record yet means nothing was ever produced: report zero
            // available rather than a missing-entity error so the UI can say
            // "out of stock" directly.
            None => {
                return Err(StoreError::Rule(CoreError::InsufficientStock {
                    flavor_id: flavor_id.to_string(),
                    available: 0,
                    requested: quantity,
                }))
            }
        };

        if record.quantity < quantity {
            return Err(StoreError::Rule(CoreError::InsufficientStock {
                flavor_id: flavor_id.to_string(),
                available: record.quantity,
                requested: quantity,
            }));
        }

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity = quantity - ?2, updated_at = ?3
            WHERE flavor_id = ?1 AND quantity >= ?2
            "#,
        )
        .bind(flavor_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // A concurrent debit won the race between our read and write.
            tx.rollback().await?;
            let available = self.get(flavor_id).await?.map_or(0, |r| r.quantity);
            return Err(StoreError::Rule(CoreError::InsufficientStock {
                flavor_id: flavor_id.to_string(),
                available,
                requested: quantity,
            }));
        }

        tx.commit().await?;

        debug!(
            flavor_id = %flavor_id,
            quantity,
            remaining = record.quantity - quantity,
            "Stock debited"
        );

        Ok(StockDebit {
            unit_cost_cents: record.avg_cost_cents,
            remaining: record.quantity - quantity,
        })
    }

    /// Re-credits stock after a downstream sale step failed.
    ///
    /// Compensation only: this restores units at the unchanged average cost
    /// and is never exposed as a user-facing operation.
    pub async fn credit(&self, flavor_id: &str, quantity: i64) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity = quantity + ?2, updated_at = ?3
            WHERE flavor_id = ?1
            "#,
        )
        .bind(flavor_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory", flavor_id));
        }

        info!(flavor_id = %flavor_id, quantity, "Stock re-credited (compensation)");
        Ok(())
    }

    /// Lists batches, most recent first.
    pub async fn list_batches(&self, limit: u32) -> DbResult<Vec<ProductionBatch>> {
        let batches = sqlx::query_as::<_, ProductionBatch>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches ORDER BY produced_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(batches)
    }

    /// Lists batches for one flavor, most recent first.
    pub async fn batches_for_flavor(&self, flavor_id: &str) -> DbResult<Vec<ProductionBatch>> {
        let batches = sqlx::query_as::<_, ProductionBatch>(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches WHERE flavor_id = ?1 ORDER BY produced_at DESC"
        ))
        .bind(flavor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(batches)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::flavor::generate_flavor_id;
    use puesto_core::Flavor;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seeded_flavor(db: &Database) -> String {
        let flavor = Flavor {
            id: generate_flavor_id(),
            name: "Chile Limón".to_string(),
            emoji: "🌶️".to_string(),
            color: "#EF4444".to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        db.flavors().insert(&flavor).await.unwrap();
        flavor.id
    }

    /// First batch: $100.00 over 20 units -> avg $5.00, qty 20.
    /// Second batch: $126.00 over 18 units -> unit $7.00, avg $5.95, qty 38.
    #[tokio::test]
    async fn test_weighted_average_across_batches() {
        let db = test_db().await;
        let flavor_id = seeded_flavor(&db).await;

        let first = db
            .inventory()
            .register_batch(&flavor_id, 10000, 20, None)
            .await
            .unwrap();
        assert_eq!(first.unit_cost_cents, 500);

        let record = db.inventory().get(&flavor_id).await.unwrap().unwrap();
        assert_eq!(record.quantity, 20);
        assert_eq!(record.avg_cost_cents, 500);

        let second = db
            .inventory()
            .register_batch(&flavor_id, 12600, 18, Some("tarde".to_string()))
            .await
            .unwrap();
        assert_eq!(second.unit_cost_cents, 700);

        let record = db.inventory().get(&flavor_id).await.unwrap().unwrap();
        assert_eq!(record.quantity, 38);
        assert_eq!(record.avg_cost_cents, 595);
    }

    #[tokio::test]
    async fn test_register_batch_rejects_zero_units() {
        let db = test_db().await;
        let flavor_id = seeded_flavor(&db).await;

        let err = db
            .inventory()
            .register_batch(&flavor_id, 10000, 0, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rule(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_register_batch_unknown_flavor() {
        let db = test_db().await;

        let err = db
            .inventory()
            .register_batch("missing", 10000, 10, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rule(CoreError::FlavorNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_history_recorded() {
        let db = test_db().await;
        let flavor_id = seeded_flavor(&db).await;

        db.inventory()
            .register_batch(&flavor_id, 10000, 20, None)
            .await
            .unwrap();
        db.inventory()
            .register_batch(&flavor_id, 12600, 18, None)
            .await
            .unwrap();

        let batches = db.inventory().batches_for_flavor(&flavor_id).await.unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(db.inventory().list_batches(10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_debit_snapshots_predebit_cost() {
        let db = test_db().await;
        let flavor_id = seeded_flavor(&db).await;
        db.inventory()
            .register_batch(&flavor_id, 10000, 20, None)
            .await
            .unwrap();

        let debit = db.inventory().debit(&flavor_id, 3).await.unwrap();
        assert_eq!(debit.unit_cost_cents, 500);
        assert_eq!(debit.remaining, 17);

        let record = db.inventory().get(&flavor_id).await.unwrap().unwrap();
        assert_eq!(record.quantity, 17);
        // the average never moves on a debit
        assert_eq!(record.avg_cost_cents, 500);
    }

    /// Scenario: 5 in stock, debit 6 -> InsufficientStock reporting 5;
    /// stock unchanged.
    #[tokio::test]
    async fn test_debit_insufficient_stock() {
        let db = test_db().await;
        let flavor_id = seeded_flavor(&db).await;
        db.inventory()
            .register_batch(&flavor_id, 2500, 5, None)
            .await
            .unwrap();

        let err = db.inventory().debit(&flavor_id, 6).await.unwrap_err();
        match err {
            StoreError::Rule(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        let record = db.inventory().get(&flavor_id).await.unwrap().unwrap();
        assert_eq!(record.quantity, 5);
    }

    #[tokio::test]
    async fn test_debit_without_record_reports_zero() {
        let db = test_db().await;
        let flavor_id = seeded_flavor(&db).await;

        let err = db.inventory().debit(&flavor_id, 1).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rule(CoreError::InsufficientStock { available: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_debit_rejects_nonpositive_quantity() {
        let db = test_db().await;
        let flavor_id = seeded_flavor(&db).await;

        assert!(db.inventory().debit(&flavor_id, 0).await.is_err());
        assert!(db.inventory().debit(&flavor_id, -2).await.is_err());
    }

    /// No oversell: ten racing single-unit debits against 5 in stock must
    /// succeed exactly 5 times and never drive the quantity negative.
    #[tokio::test]
    async fn test_concurrent_debits_never_oversell() {
        let db = test_db().await;
        let flavor_id = seeded_flavor(&db).await;
        db.inventory()
            .register_batch(&flavor_id, 2500, 5, None)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let db = db.clone();
            let flavor_id = flavor_id.clone();
            handles.push(tokio::spawn(async move {
                db.inventory().debit(&flavor_id, 1).await.is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 5);
        let record = db.inventory().get(&flavor_id).await.unwrap().unwrap();
        assert_eq!(record.quantity, 0);
    }

    #[tokio::test]
    async fn test_credit_restores_stock() {
        let db = test_db().await;
        let flavor_id = seeded_flavor(&db).await;
        db.inventory()
            .register_batch(&flavor_id, 10000, 20, None)
            .await
            .unwrap();

        db.inventory().debit(&flavor_id, 4).await.unwrap();
        db.inventory().credit(&flavor_id, 4).await.unwrap();

        let record = db.inventory().get(&flavor_id).await.unwrap().unwrap();
        assert_eq!(record.quantity, 20);
        assert_eq!(record.avg_cost_cents, 500);
    }

    #[tokio::test]
    async fn test_batch_after_sellout_adopts_new_cost() {
        let db = test_db().await;
        let flavor_id = seeded_flavor(&db).await;
        db.inventory()
            .register_batch(&flavor_id, 10000, 20, None)
            .await
            .unwrap();
        db.inventory().debit(&flavor_id, 20).await.unwrap();

        // sold out: next batch sets the average outright
        db.inventory()
            .register_batch(&flavor_id, 9000, 10, None)
            .await
            .unwrap();
        let record = db.inventory().get(&flavor_id).await.unwrap().unwrap();
        assert_eq!(record.quantity, 10);
        assert_eq!(record.avg_cost_cents, 900);
    }
}
