//! # Customer Repository
//!
//! The customer debt ledger: charges, payments, and the account statement.
//!
//! ## Balance Discipline
//! Charges are additive and commutative, so they use a relative UPDATE.
//! Payments are not: the overpayment check must read the live balance, so
//! `record_payment` runs read → verify → insert payment → guarded decrement
//! inside one transaction. The balance can never go negative.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult, StoreError, StoreResult};
use puesto_core::dates::{days_overdue, is_promise_overdue};
use puesto_core::validation::validate_payment_amount;
use puesto_core::{AccountEntry, CoreError, Customer, Debtor, EntryKind, Payment, Sale};

const CUSTOMER_COLUMNS: &str =
    "id, alias, phone, notes, balance_cents, promised_payment_at, created_at";
const PAYMENT_COLUMNS: &str = "id, customer_id, amount_cents, notes, paid_at";

/// Repository for the customer debt ledger.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a new customer.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, alias = %customer.alias, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, alias, phone, notes, balance_cents,
                                   promised_payment_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.alias)
        .bind(&customer.phone)
        .bind(&customer.notes)
        .bind(customer.balance_cents)
        .bind(customer.promised_payment_at)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists all customers, sorted by alias.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY alias"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Updates a customer's profile fields (never the balance).
    pub async fn update_profile(
        &self,
        id: &str,
        alias: &str,
        phone: Option<String>,
        notes: Option<String>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE customers SET alias = ?2, phone = ?3, notes = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(alias)
        .bind(phone)
        .bind(notes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Sets or clears the promised payment date.
    pub async fn set_promise_date(
        &self,
        id: &str,
        promise: Option<DateTime<Utc>>,
    ) -> DbResult<()> {
        let result = sqlx::query("UPDATE customers SET promised_payment_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(promise)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Adds a charge to the customer's balance (called by credit sales).
    ///
    /// Additive and commutative: two charges landing in either order produce
    /// the same balance, so a relative UPDATE is enough. The amount is
    /// validated positive by the sale orchestrator.
    pub async fn charge(&self, id: &str, amount_cents: i64) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE customers SET balance_cents = balance_cents + ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(amount_cents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Rule(CoreError::CustomerNotFound(
                id.to_string(),
            )));
        }

        info!(customer_id = %id, amount_cents, "Debt charged");
        Ok(())
    }

    /// Removes a just-applied charge. Compensation only: used when a later
    /// step of the orchestrated sale failed and the charge must not stand.
    /// Guarded so the reversal can never push the balance negative.
    pub async fn reverse_charge(&self, id: &str, amount_cents: i64) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET balance_cents = balance_cents - ?2
            WHERE id = ?1 AND balance_cents >= ?2
            "#,
        )
        .bind(id)
        .bind(amount_cents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Rule(CoreError::CustomerNotFound(
                id.to_string(),
            )));
        }

        info!(customer_id = %id, amount_cents, "Charge reversed (compensation)");
        Ok(())
    }

    /// Records a payment and decrements the balance, atomically.
    ///
    /// ## Preconditions
    /// * `amount_cents > 0` (validation error)
    /// * `amount_cents <= balance` read inside the transaction, else
    ///   `ExceedsBalance` reporting both values
    pub async fn record_payment(
        &self,
        customer_id: &str,
        amount_cents: i64,
        notes: Option<String>,
    ) -> StoreResult<Payment> {
        validate_payment_amount(amount_cents)?;

        let mut tx = self.pool.begin().await?;

        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(customer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::Rule(CoreError::CustomerNotFound(customer_id.to_string())))?;

        if amount_cents > customer.balance_cents {
            return Err(StoreError::Rule(CoreError::ExceedsBalance {
                requested_cents: amount_cents,
                balance_cents: customer.balance_cents,
            }));
        }

        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            amount_cents,
            notes,
            paid_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO payments (id, customer_id, amount_cents, notes, paid_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.customer_id)
        .bind(payment.amount_cents)
        .bind(&payment.notes)
        .bind(payment.paid_at)
        .execute(&mut *tx)
        .await?;

        // Guarded decrement: if a concurrent payment drained the balance
        // between our read and here, affect zero rows and report the fresh
        // balance instead of going negative.
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET balance_cents = balance_cents - ?2
            WHERE id = ?1 AND balance_cents >= ?2
            "#,
        )
        .bind(customer_id)
        .bind(amount_cents)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            let balance = self
                .get_by_id(customer_id)
                .await?
                .map_or(0, |c| c.balance_cents);
            return Err(StoreError::Rule(CoreError::ExceedsBalance {
                requested_cents: amount_cents,
                balance_cents: balance,
            }));
        }

        tx.commit().await?;

        info!(
            customer_id = %customer_id,
            amount_cents,
            new_balance = customer.balance_cents - amount_cents,
            "Payment recorded"
        );

        Ok(payment)
    }

    /// Deletes a payment and restores the balance. Compensation only: used
    /// when the register posting failed after the payment landed, so the
    /// payment must not enter history.
    pub async fn void_payment(&self, payment: &Payment) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM payments WHERE id = ?1")
            .bind(&payment.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Db(DbError::not_found("Payment", &payment.id)));
        }

        sqlx::query("UPDATE customers SET balance_cents = balance_cents + ?2 WHERE id = ?1")
            .bind(&payment.customer_id)
            .bind(payment.amount_cents)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(payment_id = %payment.id, "Payment voided (compensation)");
        Ok(())
    }

    /// Deletes a customer. Blocked while any balance is outstanding.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::Rule(CoreError::CustomerNotFound(id.to_string())))?;

        if customer.balance_cents > 0 {
            return Err(StoreError::Rule(CoreError::HasOutstandingBalance {
                customer_id: id.to_string(),
                balance_cents: customer.balance_cents,
            }));
        }

        sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(customer_id = %id, "Customer deleted");
        Ok(())
    }

    /// Customers with outstanding debt, overdue ones first, then by balance.
    pub async fn debtors(&self, today: DateTime<Utc>) -> DbResult<Vec<Debtor>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE balance_cents > 0"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut debtors: Vec<Debtor> = customers
            .into_iter()
            .map(|customer| Debtor {
                is_overdue: is_promise_overdue(customer.promised_payment_at, today),
                days_overdue: days_overdue(customer.promised_payment_at, today),
                customer,
            })
            .collect();

        debtors.sort_by(|a, b| {
            b.is_overdue
                .cmp(&a.is_overdue)
                .then(b.customer.balance_cents.cmp(&a.customer.balance_cents))
        });

        Ok(debtors)
    }

    /// Total debt outstanding across all customers ("dinero en la calle").
    pub async fn total_outstanding(&self) -> DbResult<i64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT SUM(balance_cents) FROM customers")
                .fetch_one(&self.pool)
                .await?;

        Ok(total.unwrap_or(0))
    }

    /// Payments for one customer, most recent first.
    pub async fn payments_for_customer(&self, customer_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE customer_id = ?1 ORDER BY paid_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Builds the unified account statement: credit sales as charges,
    /// payments as credits, chronological, with a running balance re-rounded
    /// in cents at each step. Returned most recent first for display.
    pub async fn statement(&self, customer_id: &str) -> StoreResult<Vec<AccountEntry>> {
        if self.get_by_id(customer_id).await?.is_none() {
            return Err(StoreError::Rule(CoreError::CustomerNotFound(
                customer_id.to_string(),
            )));
        }

        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, flavor_id, quantity, unit_price_cents, unit_cost_cents,
                   payment_kind, customer_id, flavor_name_snapshot, sold_at
            FROM sales
            WHERE customer_id = ?1 AND payment_kind = 'credit'
            ORDER BY sold_at
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE customer_id = ?1"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        let mut entries: Vec<AccountEntry> = Vec::with_capacity(sales.len() + payments.len());

        for sale in &sales {
            let description = match &sale.flavor_name_snapshot {
                Some(name) => format!("{}x {}", sale.quantity, name),
                None => format!("Venta fiado (x{})", sale.quantity),
            };
            entries.push(AccountEntry {
                id: sale.id.clone(),
                at: sale.sold_at,
                kind: EntryKind::Charge,
                description,
                amount_cents: sale.revenue().cents(),
                running_balance_cents: 0, // filled below
            });
        }

        for payment in &payments {
            entries.push(AccountEntry {
                id: payment.id.clone(),
                at: payment.paid_at,
                kind: EntryKind::Payment,
                description: payment
                    .notes
                    .clone()
                    .unwrap_or_else(|| "Abono".to_string()),
                amount_cents: payment.amount_cents,
                running_balance_cents: 0,
            });
        }

        entries.sort_by_key(|e| e.at);

        let mut balance = 0i64;
        for entry in &mut entries {
            balance += match entry.kind {
                EntryKind::Charge => entry.amount_cents,
                EntryKind::Payment => -entry.amount_cents,
            };
            entry.running_balance_cents = balance;
        }

        entries.reverse();
        Ok(entries)
    }
}

/// Helper to generate a new customer ID.
pub fn generate_customer_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn sample_customer(alias: &str) -> Customer {
        Customer {
            id: generate_customer_id(),
            alias: alias.to_string(),
            phone: None,
            notes: None,
            balance_cents: 0,
            promised_payment_at: None,
            created_at: Utc::now(),
        }
    }

    async fn seeded_customer(db: &Database, alias: &str) -> String {
        let customer = sample_customer(alias);
        db.customers().insert(&customer).await.unwrap();
        customer.id
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let id = seeded_customer(&db, "Doña Mari").await;

        let found = db.customers().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.alias, "Doña Mari");
        assert_eq!(found.balance_cents, 0);
    }

    #[tokio::test]
    async fn test_charge_accumulates() {
        let db = test_db().await;
        let id = seeded_customer(&db, "Don Luis").await;

        db.customers().charge(&id, 2000).await.unwrap();
        db.customers().charge(&id, 3000).await.unwrap();

        let customer = db.customers().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(customer.balance_cents, 5000);
    }

    #[tokio::test]
    async fn test_charge_unknown_customer() {
        let db = test_db().await;
        let err = db.customers().charge("missing", 1000).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rule(CoreError::CustomerNotFound(_))
        ));
    }

    /// Scenario: balance 50.00 -> pay 30.00 -> balance 20.00; a second 30.00
    /// payment is rejected with ExceedsBalance and the balance stays 20.00.
    #[tokio::test]
    async fn test_payment_and_overpayment() {
        let db = test_db().await;
        let id = seeded_customer(&db, "Paco").await;
        db.customers().charge(&id, 5000).await.unwrap();

        let payment = db
            .customers()
            .record_payment(&id, 3000, None)
            .await
            .unwrap();
        assert_eq!(payment.amount_cents, 3000);

        let customer = db.customers().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(customer.balance_cents, 2000);

        let err = db
            .customers()
            .record_payment(&id, 3000, None)
            .await
            .unwrap_err();
        match err {
            StoreError::Rule(CoreError::ExceedsBalance {
                requested_cents,
                balance_cents,
            }) => {
                assert_eq!(requested_cents, 3000);
                assert_eq!(balance_cents, 2000);
            }
            other => panic!("expected ExceedsBalance, got {other:?}"),
        }

        // balance untouched, only the first payment on file
        let customer = db.customers().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(customer.balance_cents, 2000);
        assert_eq!(
            db.customers().payments_for_customer(&id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_payment_rejects_nonpositive_amount() {
        let db = test_db().await;
        let id = seeded_customer(&db, "Paco").await;
        db.customers().charge(&id, 5000).await.unwrap();

        assert!(db.customers().record_payment(&id, 0, None).await.is_err());
        assert!(db.customers().record_payment(&id, -100, None).await.is_err());
    }

    #[tokio::test]
    async fn test_void_payment_restores_balance() {
        let db = test_db().await;
        let id = seeded_customer(&db, "Paco").await;
        db.customers().charge(&id, 5000).await.unwrap();

        let payment = db
            .customers()
            .record_payment(&id, 3000, None)
            .await
            .unwrap();
        db.customers().void_payment(&payment).await.unwrap();

        let customer = db.customers().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(customer.balance_cents, 5000);
        assert!(db
            .customers()
            .payments_for_customer(&id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_blocked_by_balance() {
        let db = test_db().await;
        let id = seeded_customer(&db, "Paco").await;
        db.customers().charge(&id, 100).await.unwrap();

        let err = db.customers().delete(&id).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rule(CoreError::HasOutstandingBalance { .. })
        ));

        // settle and delete
        db.customers().record_payment(&id, 100, None).await.unwrap();
        db.customers().delete(&id).await.unwrap();
        assert!(db.customers().get_by_id(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_debtors_sorted_overdue_first() {
        let db = test_db().await;
        let now = Utc::now();

        let overdue_id = seeded_customer(&db, "Atrasado").await;
        db.customers().charge(&overdue_id, 1000).await.unwrap();
        db.customers()
            .set_promise_date(&overdue_id, Some(now - chrono::Duration::days(3)))
            .await
            .unwrap();

        let big_id = seeded_customer(&db, "Grande").await;
        db.customers().charge(&big_id, 9000).await.unwrap();

        let paid_id = seeded_customer(&db, "Pagado").await;
        let _ = paid_id; // zero balance: must not appear

        let debtors = db.customers().debtors(now).await.unwrap();
        assert_eq!(debtors.len(), 2);
        assert_eq!(debtors[0].customer.id, overdue_id);
        assert!(debtors[0].is_overdue);
        assert_eq!(debtors[0].days_overdue, Some(3));
        assert_eq!(debtors[1].customer.id, big_id);
    }

    #[tokio::test]
    async fn test_total_outstanding() {
        let db = test_db().await;
        let a = seeded_customer(&db, "A").await;
        let b = seeded_customer(&db, "B").await;
        db.customers().charge(&a, 1500).await.unwrap();
        db.customers().charge(&b, 2500).await.unwrap();

        assert_eq!(db.customers().total_outstanding().await.unwrap(), 4000);
    }
}
