//! # Debt Service
//!
//! Customer management and the payment flow.
//!
//! A payment touches two aggregates: the customer (payment record + balance
//! decrement, atomic in the repository) and the daily register (cash
//! received). If the register posting fails after the payment landed, the
//! payment is voided and the balance restored - the same full-compensation
//! policy as the sale flow, so cash totals and payment history can never
//! disagree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::ApiError;
use puesto_core::dates::date_key;
use puesto_core::validation::validate_customer_alias;
use puesto_core::{AccountEntry, CoreError, Customer, Debtor, Payment};
use puesto_db::Database;

/// Input for creating or editing a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub alias: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

/// Service for the customer debt ledger.
#[derive(Debug, Clone)]
pub struct DebtService {
    db: Database,
}

impl DebtService {
    /// Creates a new DebtService.
    pub fn new(db: Database) -> Self {
        DebtService { db }
    }

    /// Creates a customer with a zero balance.
    pub async fn create_customer(&self, input: CustomerInput) -> Result<Customer, ApiError> {
        let alias = validate_customer_alias(&input.alias).map_err(CoreError::from)?;

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            alias,
            phone: input.phone.filter(|p| !p.trim().is_empty()),
            notes: input.notes.filter(|n| !n.trim().is_empty()),
            balance_cents: 0,
            promised_payment_at: None,
            created_at: Utc::now(),
        };

        self.db.customers().insert(&customer).await?;

        info!(customer_id = %customer.id, alias = %customer.alias, "Customer created");
        Ok(customer)
    }

    /// Updates a customer's profile fields.
    pub async fn update_customer(&self, id: &str, input: CustomerInput) -> Result<(), ApiError> {
        let alias = validate_customer_alias(&input.alias).map_err(CoreError::from)?;

        self.db
            .customers()
            .update_profile(
                id,
                &alias,
                input.phone.filter(|p| !p.trim().is_empty()),
                input.notes.filter(|n| !n.trim().is_empty()),
            )
            .await?;

        Ok(())
    }

    /// Sets or clears the promised payment date.
    pub async fn set_promise_date(
        &self,
        id: &str,
        promise: Option<DateTime<Utc>>,
    ) -> Result<(), ApiError> {
        self.db.customers().set_promise_date(id, promise).await?;
        Ok(())
    }

    /// Deletes a customer; blocked while any balance is outstanding.
    pub async fn delete_customer(&self, id: &str) -> Result<(), ApiError> {
        self.db.customers().delete(id).await?;
        Ok(())
    }

    /// Records a payment against the customer's balance and rolls the cash
    /// into today's register.
    pub async fn record_payment(
        &self,
        customer_id: &str,
        amount_cents: i64,
        notes: Option<String>,
    ) -> Result<Payment, ApiError> {
        debug!(customer_id, amount_cents, "record_payment");

        let payment = self
            .db
            .customers()
            .record_payment(customer_id, amount_cents, notes)
            .await?;

        let day = date_key(payment.paid_at);
        if let Err(e) = self.db.register().post_payment(&day, amount_cents).await {
            self.compensate(&payment).await;
            return Err(e.into());
        }

        info!(
            customer_id,
            payment_id = %payment.id,
            amount_cents,
            "Payment recorded and posted to register"
        );

        Ok(payment)
    }

    /// Voids the payment after the register refused it. Best effort: a
    /// compensation failure is logged but the original error is surfaced.
    async fn compensate(&self, payment: &Payment) {
        if let Err(e) = self.db.customers().void_payment(payment).await {
            error!(payment_id = %payment.id, "Compensation failed voiding payment: {e}");
        }
        info!(payment_id = %payment.id, "Payment unwound after register failure");
    }

    /// Lists all customers.
    pub async fn customers(&self) -> Result<Vec<Customer>, ApiError> {
        Ok(self.db.customers().list().await?)
    }

    /// Customers with debt, overdue promises first.
    pub async fn debtors(&self) -> Result<Vec<Debtor>, ApiError> {
        Ok(self.db.customers().debtors(Utc::now()).await?)
    }

    /// Total debt outstanding across all customers.
    pub async fn total_outstanding(&self) -> Result<i64, ApiError> {
        Ok(self.db.customers().total_outstanding().await?)
    }

    /// Unified account statement for one customer, most recent first.
    pub async fn statement(&self, customer_id: &str) -> Result<Vec<AccountEntry>, ApiError> {
        Ok(self.db.customers().statement(customer_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::sales::{SaleRequest, SalesService};
    use puesto_core::{EntryKind, Flavor, PaymentKind};
    use puesto_db::DbConfig;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn input(alias: &str) -> CustomerInput {
        CustomerInput {
            alias: alias.to_string(),
            phone: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_customer_validates_alias() {
        let db = test_db().await;
        let service = DebtService::new(db);

        assert!(service.create_customer(input("  ")).await.is_err());

        let customer = service.create_customer(input(" Doña Mari ")).await.unwrap();
        assert_eq!(customer.alias, "Doña Mari");
        assert_eq!(customer.balance_cents, 0);
    }

    #[tokio::test]
    async fn test_payment_posts_cash_to_register() {
        let db = test_db().await;
        let service = DebtService::new(db.clone());

        let customer = service.create_customer(input("Paco")).await.unwrap();
        db.customers().charge(&customer.id, 5000).await.unwrap();

        let payment = service
            .record_payment(&customer.id, 3000, None)
            .await
            .unwrap();

        let stored = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(stored.balance_cents, 2000);

        let day = db
            .register()
            .get_day(&date_key(payment.paid_at))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(day.cash_payments_cents, 3000);
        assert_eq!(day.total_cash_cents, 3000);
        assert_eq!(day.cash_sales_cents, 0);
    }

    #[tokio::test]
    async fn test_overpayment_surfaces_both_amounts() {
        let db = test_db().await;
        let service = DebtService::new(db.clone());

        let customer = service.create_customer(input("Paco")).await.unwrap();
        db.customers().charge(&customer.id, 2000).await.unwrap();

        let err = service
            .record_payment(&customer.id, 3000, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ExceedsBalance);
        assert!(err.message.contains("3000"));
        assert!(err.message.contains("2000"));
    }

    /// A payment against a closed day is rejected and fully unwound: the
    /// payment record disappears and the balance is restored.
    #[tokio::test]
    async fn test_payment_on_closed_day_is_unwound() {
        let db = test_db().await;
        let service = DebtService::new(db.clone());

        let customer = service.create_customer(input("Paco")).await.unwrap();
        db.customers().charge(&customer.id, 5000).await.unwrap();

        let today = date_key(Utc::now());
        db.register().close_day(&today, 0, 0, None).await.unwrap();

        let err = service
            .record_payment(&customer.id, 3000, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DayClosed);

        let stored = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(stored.balance_cents, 5000);
        assert!(db
            .customers()
            .payments_for_customer(&customer.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_blocked_until_settled() {
        let db = test_db().await;
        let service = DebtService::new(db.clone());

        let customer = service.create_customer(input("Paco")).await.unwrap();
        db.customers().charge(&customer.id, 1000).await.unwrap();

        let err = service.delete_customer(&customer.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OutstandingBalance);

        service
            .record_payment(&customer.id, 1000, None)
            .await
            .unwrap();
        service.delete_customer(&customer.id).await.unwrap();
    }

    /// Statement: charges and payments interleave chronologically and the
    /// running balance lands exactly on the stored balance.
    #[tokio::test]
    async fn test_statement_running_balance() {
        let db = test_db().await;
        let debt_service = DebtService::new(db.clone());
        let sales_service = SalesService::new(db.clone());
        let config = db.config().load_or_create().await.unwrap();

        let customer = debt_service.create_customer(input("Paco")).await.unwrap();

        let flavor = Flavor {
            id: Uuid::new_v4().to_string(),
            name: "Salado".to_string(),
            emoji: "🧂".to_string(),
            color: "#6B7280".to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        db.flavors().insert(&flavor).await.unwrap();
        db.inventory()
            .register_batch(&flavor.id, 8000, 20, None)
            .await
            .unwrap();

        // two credit sales of 2 and 1 units @ $10.00, then a $15.00 payment
        for quantity in [2, 1] {
            sales_service
                .process_sale(
                    &config,
                    SaleRequest {
                        flavor_id: flavor.id.clone(),
                        quantity,
                        payment_kind: PaymentKind::Credit,
                        customer_id: Some(customer.id.clone()),
                        override_price_cents: None,
                    },
                )
                .await
                .unwrap();
        }
        debt_service
            .record_payment(&customer.id, 1500, None)
            .await
            .unwrap();

        let statement = debt_service.statement(&customer.id).await.unwrap();
        assert_eq!(statement.len(), 3);

        // most recent first: payment on top with the final balance
        assert_eq!(statement[0].kind, EntryKind::Payment);
        assert_eq!(statement[0].running_balance_cents, 1500);
        assert_eq!(statement[1].kind, EntryKind::Charge);
        assert_eq!(statement[2].kind, EntryKind::Charge);
        assert!(statement[2].description.contains("2x"));

        let stored = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(stored.balance_cents, statement[0].running_balance_cents);
    }

    #[tokio::test]
    async fn test_total_outstanding_view() {
        let db = test_db().await;
        let service = DebtService::new(db.clone());

        let a = service.create_customer(input("A")).await.unwrap();
        let b = service.create_customer(input("B")).await.unwrap();
        db.customers().charge(&a.id, 1000).await.unwrap();
        db.customers().charge(&b.id, 2500).await.unwrap();

        assert_eq!(service.total_outstanding().await.unwrap(), 3500);
        assert_eq!(service.debtors().await.unwrap().len(), 2);
    }
}
