//! # Sale Repository
//!
//! Append-only storage for sales. A sale row is written once by the
//! orchestrator, carrying the price charged and the unit cost snapshotted by
//! the inventory debit, and is never updated afterwards.

use chrono::{NaiveTime, TimeZone, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbResult, StoreError, StoreResult};
use puesto_core::dates::parse_date_key;
use puesto_core::{Sale, ValidationError};

const SALE_COLUMNS: &str = "id, flavor_id, quantity, unit_price_cents, unit_cost_cents, \
                            payment_kind, customer_id, flavor_name_snapshot, sold_at";

/// Repository for sale records.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a sale.
    pub async fn insert(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, flavor_id = %sale.flavor_id, quantity = sale.quantity, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (id, flavor_id, quantity, unit_price_cents, unit_cost_cents,
                               payment_kind, customer_id, flavor_name_snapshot, sold_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.flavor_id)
        .bind(sale.quantity)
        .bind(sale.unit_price_cents)
        .bind(sale.unit_cost_cents)
        .bind(sale.payment_kind)
        .bind(&sale.customer_id)
        .bind(&sale.flavor_name_snapshot)
        .bind(sale.sold_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Deletes a sale row. Compensation only: used when a downstream step of
    /// the orchestrated sale failed and the whole sale is being unwound.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Lists the sales of one calendar day, most recent first.
    pub async fn list_for_day(&self, date_key: &str) -> StoreResult<Vec<Sale>> {
        let day = parse_date_key(date_key).ok_or_else(|| {
            StoreError::from(ValidationError::InvalidFormat {
                field: "date_key".to_string(),
                reason: "expected YYYY-MM-DD".to_string(),
            })
        })?;

        // Bound by [midnight, next midnight) so the comparison happens on
        // bound timestamps, not string prefixes.
        let start = Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN));
        let end = start + chrono::Duration::days(1);

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE sold_at >= ?1 AND sold_at < ?2 ORDER BY sold_at DESC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists a customer's sales, most recent first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE customer_id = ?1 ORDER BY sold_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists the most recent sales across all days.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY sold_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}

/// Helper to generate a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::flavor::generate_flavor_id;
    use puesto_core::dates::date_key;
    use puesto_core::{Flavor, PaymentKind};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seeded_flavor(db: &Database) -> String {
        let flavor = Flavor {
            id: generate_flavor_id(),
            name: "Salado".to_string(),
            emoji: "🧂".to_string(),
            color: "#6B7280".to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        db.flavors().insert(&flavor).await.unwrap();
        flavor.id
    }

    fn sample_sale(flavor_id: &str, kind: PaymentKind) -> Sale {
        Sale {
            id: generate_sale_id(),
            flavor_id: flavor_id.to_string(),
            quantity: 2,
            unit_price_cents: 1000,
            unit_cost_cents: 400,
            payment_kind: kind,
            customer_id: None,
            flavor_name_snapshot: Some("Salado".to_string()),
            sold_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let flavor_id = seeded_flavor(&db).await;
        let sale = sample_sale(&flavor_id, PaymentKind::Cash);

        db.sales().insert(&sale).await.unwrap();

        let found = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(found.quantity, 2);
        assert_eq!(found.unit_cost_cents, 400);
        assert_eq!(found.payment_kind, PaymentKind::Cash);
        assert_eq!(found.revenue().cents(), 2000);
    }

    #[tokio::test]
    async fn test_list_for_day() {
        let db = test_db().await;
        let flavor_id = seeded_flavor(&db).await;
        let sale = sample_sale(&flavor_id, PaymentKind::Cash);
        db.sales().insert(&sale).await.unwrap();

        let today = date_key(Utc::now());
        let sales = db.sales().list_for_day(&today).await.unwrap();
        assert_eq!(sales.len(), 1);

        let none = db.sales().list_for_day("2000-01-01").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_list_for_day_rejects_bad_key() {
        let db = test_db().await;
        assert!(db.sales().list_for_day("yesterday").await.is_err());
    }

    #[tokio::test]
    async fn test_recent_limit() {
        let db = test_db().await;
        let flavor_id = seeded_flavor(&db).await;
        for _ in 0..5 {
            db.sales()
                .insert(&sample_sale(&flavor_id, PaymentKind::Cash))
                .await
                .unwrap();
        }

        assert_eq!(db.sales().recent(3).await.unwrap().len(), 3);
    }
}
