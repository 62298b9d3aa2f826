//! # Config Repository
//!
//! Storage for the singleton business configuration row.
//!
//! The configuration is loaded once at startup (creating defaults on a
//! fresh database) and only changes through an explicit update call. The
//! services receive the loaded value as a parameter; nothing reads this
//! table ambiently mid-operation.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use puesto_core::{
    BusinessConfig, CONFIG_ID, DEFAULT_BUSINESS_NAME, DEFAULT_CURRENCY_CODE, DEFAULT_PRICE_CENTS,
};

const CONFIG_COLUMNS: &str = "id, business_name, default_price_cents, currency_code, updated_at";

/// Repository for business configuration.
#[derive(Debug, Clone)]
pub struct ConfigRepository {
    pool: SqlitePool,
}

impl ConfigRepository {
    /// Creates a new ConfigRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ConfigRepository { pool }
    }

    /// Loads the configuration, creating the default row on first run.
    pub async fn load_or_create(&self) -> DbResult<BusinessConfig> {
        if let Some(config) = self.get().await? {
            return Ok(config);
        }

        let config = BusinessConfig {
            id: CONFIG_ID.to_string(),
            business_name: DEFAULT_BUSINESS_NAME.to_string(),
            default_price_cents: DEFAULT_PRICE_CENTS,
            currency_code: DEFAULT_CURRENCY_CODE.to_string(),
            updated_at: Utc::now(),
        };

        // A concurrent first run may have inserted already; keep theirs.
        sqlx::query(
            r#"
            INSERT INTO config (id, business_name, default_price_cents, currency_code, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&config.id)
        .bind(&config.business_name)
        .bind(config.default_price_cents)
        .bind(&config.currency_code)
        .bind(config.updated_at)
        .execute(&self.pool)
        .await?;

        info!("Created default business configuration");

        match self.get().await? {
            Some(config) => Ok(config),
            None => Ok(config),
        }
    }

    /// Gets the configuration row, if present.
    pub async fn get(&self) -> DbResult<Option<BusinessConfig>> {
        let config = sqlx::query_as::<_, BusinessConfig>(&format!(
            "SELECT {CONFIG_COLUMNS} FROM config WHERE id = ?1"
        ))
        .bind(CONFIG_ID)
        .fetch_optional(&self.pool)
        .await?;

        Ok(config)
    }

    /// Replaces the configuration. The caller validates fields first.
    pub async fn update(
        &self,
        business_name: &str,
        default_price_cents: i64,
        currency_code: &str,
    ) -> DbResult<BusinessConfig> {
        debug!(business_name, default_price_cents, "Updating configuration");

        let config = BusinessConfig {
            id: CONFIG_ID.to_string(),
            business_name: business_name.to_string(),
            default_price_cents,
            currency_code: currency_code.to_string(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO config (id, business_name, default_price_cents, currency_code, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                business_name = ?2,
                default_price_cents = ?3,
                currency_code = ?4,
                updated_at = ?5
            "#,
        )
        .bind(&config.id)
        .bind(&config.business_name)
        .bind(config.default_price_cents)
        .bind(&config.currency_code)
        .bind(config.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(config)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
