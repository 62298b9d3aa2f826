//! # Cash-Out Service
//!
//! End-of-day reconciliation: compare the counted drawer against the
//! register's expected total, record the variance and the float carried
//! forward, and freeze the day.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use puesto_core::dates::date_key;
use puesto_core::{CashOut, DailyRegister};
use puesto_db::Database;

/// A day's register totals with its reconciliation, if closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub register: DailyRegister,
    pub cash_out: Option<CashOut>,
}

/// Service for end-of-day reconciliation.
#[derive(Debug, Clone)]
pub struct CashOutService {
    db: Database,
}

impl CashOutService {
    /// Creates a new CashOutService.
    pub fn new(db: Database) -> Self {
        CashOutService { db }
    }

    /// Closes today.
    ///
    /// A day with zero transactions is still closeable (expected cash 0);
    /// closing twice fails with `AlreadyClosed` and leaves the stored
    /// reconciliation untouched.
    pub async fn close_today(
        &self,
        counted_cents: i64,
        withdrawn_cents: i64,
        notes: Option<String>,
    ) -> Result<CashOut, ApiError> {
        self.close_day(&date_key(Utc::now()), counted_cents, withdrawn_cents, notes)
            .await
    }

    /// Closes a specific day.
    pub async fn close_day(
        &self,
        date_key: &str,
        counted_cents: i64,
        withdrawn_cents: i64,
        notes: Option<String>,
    ) -> Result<CashOut, ApiError> {
        let cash_out = self
            .db
            .register()
            .close_day(date_key, counted_cents, withdrawn_cents, notes)
            .await?;

        info!(
            date_key,
            variance = cash_out.variance_cents,
            float = cash_out.next_day_float_cents,
            "Cash-out complete"
        );

        Ok(cash_out)
    }

    /// Today's running totals, for pre-filling the cash-out screen.
    pub async fn today_summary(&self) -> Result<DaySummary, ApiError> {
        self.day_summary(&date_key(Utc::now())).await
    }

    /// A day's totals and reconciliation. Days with no activity come back
    /// as an empty open register rather than an error.
    pub async fn day_summary(&self, date_key: &str) -> Result<DaySummary, ApiError> {
        let register = self
            .db
            .register()
            .get_day(date_key)
            .await?
            .unwrap_or_else(|| DailyRegister::empty(date_key));

        let cash_out = self.db.register().get_cash_out(date_key).await?;

        Ok(DaySummary { register, cash_out })
    }

    /// Recent reconciliations, most recent day first.
    pub async fn history(&self, limit: u32) -> Result<Vec<CashOut>, ApiError> {
        Ok(self.db.register().recent_cash_outs(limit).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
