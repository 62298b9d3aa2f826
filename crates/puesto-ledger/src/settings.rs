//! # Settings Service
//!
//! Explicit load/update of the business configuration.
//!
//! The UI shell loads the configuration once at startup and hands the value
//! to the operations that need it (notably `process_sale` for the default
//! price). Changing a setting goes through `update`, which returns the new
//! value for the shell to hold; nothing reads this table mid-transaction.

use tracing::info;

use crate::error::ApiError;
use puesto_core::validation::{validate_business_name, validate_price_cents};
use puesto_core::{BusinessConfig, CoreError};
use puesto_db::Database;

/// Service for business configuration.
#[derive(Debug, Clone)]
pub struct SettingsService {
    db: Database,
}

impl SettingsService {
    /// Creates a new SettingsService.
    pub fn new(db: Database) -> Self {
        SettingsService { db }
    }

    /// Loads the configuration, creating defaults on a fresh database.
    pub async fn load(&self) -> Result<BusinessConfig, ApiError> {
        Ok(self.db.config().load_or_create().await?)
    }

    /// Updates the configuration and returns the stored value.
    pub async fn update(
        &self,
        business_name: &str,
        default_price_cents: i64,
        currency_code: &str,
    ) -> Result<BusinessConfig, ApiError> {
        let business_name = validate_business_name(business_name).map_err(CoreError::from)?;
        validate_price_cents(default_price_cents).map_err(CoreError::from)?;

        let config = self
            .db
            .config()
            .update(&business_name, default_price_cents, currency_code)
            .await?;

        info!(
            business_name = %config.business_name,
            default_price_cents = config.default_price_cents,
            "Configuration updated"
        );

        Ok(config)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
