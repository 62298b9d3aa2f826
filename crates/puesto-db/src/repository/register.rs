//! # Register Repository
//!
//! The daily cash register aggregate and its end-of-day close.
//!
//! ## Posting Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Every sale/payment posting is a single additive upsert:            │
//! │                                                                     │
//! │    INSERT ... ON CONFLICT(date_key) DO UPDATE SET                   │
//! │        <field>     = <field> + increment,                           │
//! │        total_cash  = cash_sales' + cash_payments'                   │
//! │    WHERE is_closed = 0                                              │
//! │                                                                     │
//! │  total_cash is recomputed by the SAME statement that applies the    │
//! │  increment, so `total_cash == cash_sales + cash_payments` holds     │
//! │  after every posting. No subtraction ever touches these columns     │
//! │  outside of nothing at all: the close only freezes, never edits.    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Closing a day writes the reconciliation row and sets `is_closed` in one
//! transaction. `OPEN → CLOSED` is terminal; there is no reopen.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbResult, StoreError, StoreResult};
use puesto_core::costing::{cash_variance, next_day_float};
use puesto_core::validation::validate_cash_out_amounts;
use puesto_core::{CashOut, CoreError, DailyRegister, Money, PaymentKind};

const REGISTER_COLUMNS: &str = "date_key, cash_sales_cents, cash_payments_cents, \
                                total_cash_cents, credit_sales_cents, cost_of_goods_cents, \
                                is_closed";
const CASH_OUT_COLUMNS: &str = "id, date_key, expected_cents, counted_cents, variance_cents, \
                                withdrawn_cents, next_day_float_cents, notes, closed_at";

/// Repository for the daily cash register.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    pool: SqlitePool,
}

impl RegisterRepository {
    /// Creates a new RegisterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegisterRepository { pool }
    }

    /// Gets a day's register row, if the day has any activity yet.
    pub async fn get_day(&self, date_key: &str) -> DbResult<Option<DailyRegister>> {
        let day = sqlx::query_as::<_, DailyRegister>(&format!(
            "SELECT {REGISTER_COLUMNS} FROM daily_register WHERE date_key = ?1"
        ))
        .bind(date_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(day)
    }

    /// Posts a sale into the day's totals.
    ///
    /// Cash revenue lands in cash_sales (and the derived total_cash); credit
    /// revenue lands in credit_sales only. Cost of goods accrues either way.
    /// Fails with `DayClosed` once the day has been reconciled.
    pub async fn post_sale(
        &self,
        date_key: &str,
        kind: PaymentKind,
        revenue_cents: i64,
        cost_cents: i64,
    ) -> StoreResult<()> {
        let (cash_cents, credit_cents) = match kind {
            PaymentKind::Cash => (revenue_cents, 0),
            PaymentKind::Credit => (0, revenue_cents),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO daily_register (date_key, cash_sales_cents, cash_payments_cents,
                                        total_cash_cents, credit_sales_cents,
                                        cost_of_goods_cents, is_closed)
            VALUES (?1, ?2, 0, ?2, ?3, ?4, 0)
            ON CONFLICT(date_key) DO UPDATE SET
                cash_sales_cents    = daily_register.cash_sales_cents + ?2,
                credit_sales_cents  = daily_register.credit_sales_cents + ?3,
                cost_of_goods_cents = daily_register.cost_of_goods_cents + ?4,
                total_cash_cents    = daily_register.cash_sales_cents + ?2
                                      + daily_register.cash_payments_cents
            WHERE daily_register.is_closed = 0
            "#,
        )
        .bind(date_key)
        .bind(cash_cents)
        .bind(credit_cents)
        .bind(cost_cents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Rule(CoreError::DayClosed {
                date_key: date_key.to_string(),
            }));
        }

        debug!(date_key, cash_cents, credit_cents, cost_cents, "Sale posted to register");
        Ok(())
    }

    /// Posts a debt payment's cash into the day's totals.
    pub async fn post_payment(&self, date_key: &str, amount_cents: i64) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO daily_register (date_key, cash_sales_cents, cash_payments_cents,
                                        total_cash_cents, credit_sales_cents,
                                        cost_of_goods_cents, is_closed)
            VALUES (?1, 0, ?2, ?2, 0, 0, 0)
            ON CONFLICT(date_key) DO UPDATE SET
                cash_payments_cents = daily_register.cash_payments_cents + ?2,
                total_cash_cents    = daily_register.cash_sales_cents
                                      + daily_register.cash_payments_cents + ?2
            WHERE daily_register.is_closed = 0
            "#,
        )
        .bind(date_key)
        .bind(amount_cents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Rule(CoreError::DayClosed {
                date_key: date_key.to_string(),
            }));
        }

        debug!(date_key, amount_cents, "Payment posted to register");
        Ok(())
    }

    /// Closes a day: writes the reconciliation and freezes the register row.
    ///
    /// ## Rules
    /// * counted and withdrawn must be non-negative (validation error)
    /// * `withdrawn <= counted`, else `InvalidWithdrawal`
    /// * a day with no register row is closeable (expected cash is 0)
    /// * an already-closed day fails with `AlreadyClosed`; the stored
    ///   reconciliation is never overwritten
    pub async fn close_day(
        &self,
        date_key: &str,
        counted_cents: i64,
        withdrawn_cents: i64,
        notes: Option<String>,
    ) -> StoreResult<CashOut> {
        validate_cash_out_amounts(counted_cents, withdrawn_cents)?;

        if withdrawn_cents > counted_cents {
            return Err(StoreError::Rule(CoreError::InvalidWithdrawal {
                withdrawn_cents,
                counted_cents,
            }));
        }

        let mut tx = self.pool.begin().await?;

        let day = sqlx::query_as::<_, DailyRegister>(&format!(
            "SELECT {REGISTER_COLUMNS} FROM daily_register WHERE date_key = ?1"
        ))
        .bind(date_key)
        .fetch_optional(&mut *tx)
        .await?;

        if day.as_ref().is_some_and(|d| d.is_closed) {
            return Err(StoreError::Rule(CoreError::AlreadyClosed {
                date_key: date_key.to_string(),
            }));
        }

        let expected_cents = day.as_ref().map_or(0, |d| d.total_cash_cents);
        let counted = Money::from_cents(counted_cents);
        let expected = Money::from_cents(expected_cents);
        let withdrawn = Money::from_cents(withdrawn_cents);

        let cash_out = CashOut {
            id: Uuid::new_v4().to_string(),
            date_key: date_key.to_string(),
            expected_cents,
            counted_cents,
            variance_cents: cash_variance(counted, expected).cents(),
            withdrawn_cents,
            next_day_float_cents: next_day_float(counted, withdrawn).cents(),
            notes,
            closed_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO cash_outs (id, date_key, expected_cents, counted_cents,
                                   variance_cents, withdrawn_cents, next_day_float_cents,
                                   notes, closed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&cash_out.id)
        .bind(&cash_out.date_key)
        .bind(cash_out.expected_cents)
        .bind(cash_out.counted_cents)
        .bind(cash_out.variance_cents)
        .bind(cash_out.withdrawn_cents)
        .bind(cash_out.next_day_float_cents)
        .bind(&cash_out.notes)
        .bind(cash_out.closed_at)
        .execute(&mut *tx)
        .await?;

        // A zero-transaction day gets its (empty, closed) row here; an
        // active day just flips the flag.
        sqlx::query(
            r#"
            INSERT INTO daily_register (date_key, is_closed)
            VALUES (?1, 1)
            ON CONFLICT(date_key) DO UPDATE SET is_closed = 1
            "#,
        )
        .bind(date_key)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            date_key,
            expected_cents,
            counted_cents,
            variance = cash_out.variance_cents,
            "Day closed"
        );

        Ok(cash_out)
    }

    /// Gets the reconciliation for a day, if it was closed.
    pub async fn get_cash_out(&self, date_key: &str) -> DbResult<Option<CashOut>> {
        let cash_out = sqlx::query_as::<_, CashOut>(&format!(
            "SELECT {CASH_OUT_COLUMNS} FROM cash_outs WHERE date_key = ?1"
        ))
        .bind(date_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(cash_out)
    }

    /// Lists reconciliations, most recent day first.
    pub async fn recent_cash_outs(&self, limit: u32) -> DbResult<Vec<CashOut>> {
        let cash_outs = sqlx::query_as::<_, CashOut>(&format!(
            "SELECT {CASH_OUT_COLUMNS} FROM cash_outs ORDER BY date_key DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(cash_outs)
    }

    /// Lists register days, most recent first.
    pub async fn recent_days(&self, limit: u32) -> DbResult<Vec<DailyRegister>> {
        let days = sqlx::query_as::<_, DailyRegister>(&format!(
            "SELECT {REGISTER_COLUMNS} FROM daily_register ORDER BY date_key DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(days)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    const DAY: &str = "2026-08-05";

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn assert_additivity(db: &Database, date_key: &str) {
        let day = db.register().get_day(date_key).await.unwrap().unwrap();
        assert_eq!(
            day.total_cash_cents,
            day.cash_sales_cents + day.cash_payments_cents,
            "total_cash must stay derived"
        );
    }

    /// Scenario: cash sale of 2 @ $10.00 with cost snapshot $4.00 posts
    /// revenue 20.00 to cash sales and total cash, cost 8.00 to COGS.
    #[tokio::test]
    async fn test_post_cash_sale() {
        let db = test_db().await;

        db.register()
            .post_sale(DAY, PaymentKind::Cash, 2000, 800)
            .await
            .unwrap();

        let day = db.register().get_day(DAY).await.unwrap().unwrap();
        assert_eq!(day.cash_sales_cents, 2000);
        assert_eq!(day.total_cash_cents, 2000);
        assert_eq!(day.credit_sales_cents, 0);
        assert_eq!(day.cost_of_goods_cents, 800);
        assert_additivity(&db, DAY).await;
    }

    #[tokio::test]
    async fn test_post_credit_sale_keeps_cash_untouched() {
        let db = test_db().await;

        db.register()
            .post_sale(DAY, PaymentKind::Credit, 3000, 1200)
            .await
            .unwrap();

        let day = db.register().get_day(DAY).await.unwrap().unwrap();
        assert_eq!(day.cash_sales_cents, 0);
        assert_eq!(day.total_cash_cents, 0);
        assert_eq!(day.credit_sales_cents, 3000);
        assert_eq!(day.cost_of_goods_cents, 1200);
        assert_additivity(&db, DAY).await;
    }

    #[tokio::test]
    async fn test_postings_accumulate_and_stay_additive() {
        let db = test_db().await;

        db.register()
            .post_sale(DAY, PaymentKind::Cash, 2000, 800)
            .await
            .unwrap();
        assert_additivity(&db, DAY).await;

        db.register().post_payment(DAY, 1500).await.unwrap();
        assert_additivity(&db, DAY).await;

        db.register()
            .post_sale(DAY, PaymentKind::Credit, 1000, 400)
            .await
            .unwrap();
        assert_additivity(&db, DAY).await;

        let day = db.register().get_day(DAY).await.unwrap().unwrap();
        assert_eq!(day.cash_sales_cents, 2000);
        assert_eq!(day.cash_payments_cents, 1500);
        assert_eq!(day.total_cash_cents, 3500);
        assert_eq!(day.credit_sales_cents, 1000);
        assert_eq!(day.cost_of_goods_cents, 1200);
    }

    /// Scenario: total cash 500.00, counted 480.00, withdrawn 400.00 ->
    /// variance -20.00, next-day float 80.00; second close AlreadyClosed.
    #[tokio::test]
    async fn test_close_day_and_reclose() {
        let db = test_db().await;

        db.register()
            .post_sale(DAY, PaymentKind::Cash, 50000, 20000)
            .await
            .unwrap();

        let cash_out = db
            .register()
            .close_day(DAY, 48000, 40000, Some("faltó morralla".to_string()))
            .await
            .unwrap();
        assert_eq!(cash_out.expected_cents, 50000);
        assert_eq!(cash_out.variance_cents, -2000);
        assert_eq!(cash_out.next_day_float_cents, 8000);

        let day = db.register().get_day(DAY).await.unwrap().unwrap();
        assert!(day.is_closed);

        let err = db
            .register()
            .close_day(DAY, 99999, 0, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rule(CoreError::AlreadyClosed { .. })
        ));

        // the stored reconciliation is untouched by the failed attempt
        let stored = db.register().get_cash_out(DAY).await.unwrap().unwrap();
        assert_eq!(stored.id, cash_out.id);
        assert_eq!(stored.counted_cents, 48000);
    }

    #[tokio::test]
    async fn test_close_day_with_no_activity() {
        let db = test_db().await;

        let cash_out = db.register().close_day(DAY, 0, 0, None).await.unwrap();
        assert_eq!(cash_out.expected_cents, 0);
        assert_eq!(cash_out.variance_cents, 0);
        assert_eq!(cash_out.next_day_float_cents, 0);

        let day = db.register().get_day(DAY).await.unwrap().unwrap();
        assert!(day.is_closed);
    }

    #[tokio::test]
    async fn test_close_day_rejects_overdraw() {
        let db = test_db().await;

        let err = db
            .register()
            .close_day(DAY, 10000, 15000, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rule(CoreError::InvalidWithdrawal { .. })
        ));
        // nothing was written
        assert!(db.register().get_cash_out(DAY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_close_day_rejects_negative_amounts() {
        let db = test_db().await;
        assert!(db.register().close_day(DAY, -1, 0, None).await.is_err());
        assert!(db.register().close_day(DAY, 100, -1, None).await.is_err());
    }

    #[tokio::test]
    async fn test_postings_rejected_after_close() {
        let db = test_db().await;

        db.register()
            .post_sale(DAY, PaymentKind::Cash, 2000, 800)
            .await
            .unwrap();
        db.register().close_day(DAY, 2000, 0, None).await.unwrap();

        let err = db
            .register()
            .post_sale(DAY, PaymentKind::Cash, 1000, 400)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rule(CoreError::DayClosed { .. })));

        let err = db.register().post_payment(DAY, 500).await.unwrap_err();
        assert!(matches!(err, StoreError::Rule(CoreError::DayClosed { .. })));

        // frozen totals unchanged
        let day = db.register().get_day(DAY).await.unwrap().unwrap();
        assert_eq!(day.total_cash_cents, 2000);
    }

    #[tokio::test]
    async fn test_recent_cash_outs_ordering() {
        let db = test_db().await;

        db.register().close_day("2026-08-03", 100, 0, None).await.unwrap();
        db.register().close_day("2026-08-04", 200, 0, None).await.unwrap();
        db.register().close_day("2026-08-05", 300, 0, None).await.unwrap();

        let recent = db.register().recent_cash_outs(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].date_key, "2026-08-05");
        assert_eq!(recent[1].date_key, "2026-08-04");
    }
}
