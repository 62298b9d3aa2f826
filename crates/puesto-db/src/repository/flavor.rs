//! # Flavor Repository
//!
//! Database operations for the flavor catalog.
//!
//! Deletion is always soft: historical sales and batches reference flavors,
//! so `soft_delete` flips `is_active` off and `reactivate` flips it back.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use puesto_core::Flavor;

const FLAVOR_COLUMNS: &str = "id, name, emoji, color, is_active, created_at";

/// Repository for flavor catalog operations.
#[derive(Debug, Clone)]
pub struct FlavorRepository {
    pool: SqlitePool,
}

impl FlavorRepository {
    /// Creates a new FlavorRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FlavorRepository { pool }
    }

    /// Inserts a new flavor.
    pub async fn insert(&self, flavor: &Flavor) -> DbResult<()> {
        debug!(id = %flavor.id, name = %flavor.name, "Inserting flavor");

        sqlx::query(
            r#"
            INSERT INTO flavors (id, name, emoji, color, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&flavor.id)
        .bind(&flavor.name)
        .bind(&flavor.emoji)
        .bind(&flavor.color)
        .bind(flavor.is_active)
        .bind(flavor.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a flavor by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Flavor))` - flavor found (active or not)
    /// * `Ok(None)` - no such flavor
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Flavor>> {
        let flavor = sqlx::query_as::<_, Flavor>(&format!(
            "SELECT {FLAVOR_COLUMNS} FROM flavors WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(flavor)
    }

    /// Lists active flavors, sorted by name.
    pub async fn list_active(&self) -> DbResult<Vec<Flavor>> {
        let flavors = sqlx::query_as::<_, Flavor>(&format!(
            "SELECT {FLAVOR_COLUMNS} FROM flavors WHERE is_active = 1 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(flavors)
    }

    /// Lists all flavors including deactivated ones.
    pub async fn list_all(&self) -> DbResult<Vec<Flavor>> {
        let flavors = sqlx::query_as::<_, Flavor>(&format!(
            "SELECT {FLAVOR_COLUMNS} FROM flavors ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(flavors)
    }

    /// Updates a flavor's display fields.
    pub async fn update(&self, flavor: &Flavor) -> DbResult<()> {
        debug!(id = %flavor.id, "Updating flavor");

        let result = sqlx::query(
            r#"
            UPDATE flavors SET name = ?2, emoji = ?3, color = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&flavor.id)
        .bind(&flavor.name)
        .bind(&flavor.emoji)
        .bind(&flavor.color)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Flavor", &flavor.id));
        }

        Ok(())
    }

    /// Soft-deletes a flavor by setting is_active = false.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting flavor");
        self.set_active(id, false).await
    }

    /// Reactivates a previously deactivated flavor.
    pub async fn reactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Reactivating flavor");
        self.set_active(id, true).await
    }

    async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE flavors SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Flavor", id));
        }

        Ok(())
    }

    /// Counts active flavors (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM flavors WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new flavor ID.
pub fn generate_flavor_id() -> String {
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

    fn sample_flavor(name: &str) -> Flavor {
        Flavor {
            id: generate_flavor_id(),
            name: name.to_string(),
            emoji: "🌶️".to_string(),
            color: "#EF4444".to_string(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let flavor = sample_flavor("Chile Limón");

        db.flavors().insert(&flavor).await.unwrap();

        let found = db.flavors().get_by_id(&flavor.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Chile Limón");
        assert!(found.is_active);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let db = test_db().await;
        assert!(db.flavors().get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_and_reactivate() {
        let db = test_db().await;
        let flavor = sample_flavor("Natural");
        db.flavors().insert(&flavor).await.unwrap();

        db.flavors().soft_delete(&flavor.id).await.unwrap();
        assert!(db.flavors().list_active().await.unwrap().is_empty());
        // still fetchable for historical display
        assert!(db.flavors().get_by_id(&flavor.id).await.unwrap().is_some());

        db.flavors().reactivate(&flavor.id).await.unwrap();
        assert_eq!(db.flavors().list_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_soft_delete_missing_flavor_errors() {
        let db = test_db().await;
        let err = db.flavors().soft_delete("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let db = test_db().await;
        db.flavors().insert(&sample_flavor("Salado")).await.unwrap();
        db.flavors().insert(&sample_flavor("Enchilado")).await.unwrap();

        let names: Vec<String> = db
            .flavors()
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Enchilado", "Salado"]);
    }
}
