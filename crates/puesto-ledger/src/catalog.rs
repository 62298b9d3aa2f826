//! # Catalog Service
//!
//! Flavor management, production registration, and the read-through
//! flavor+inventory cache the sale-entry grid reads from.
//!
//! ## Cache Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  snapshot(id):  cache hit? ──► return                               │
//! │                 miss?      ──► load flavor + inventory ──► store    │
//! │                                                                     │
//! │  every write (flavor edit, batch, reported sale) ──► invalidate(id) │
//! │                                                                     │
//! │  The cache feeds DISPLAY ONLY. The authoritative debit re-reads     │
//! │  the live inventory row inside its own transaction; a stale         │
//! │  snapshot can never oversell.                                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use puesto_core::validation::validate_flavor_name;
use puesto_core::{CoreError, Flavor, InventoryRecord, ProductionBatch};
use puesto_db::Database;

/// Denormalized flavor + stock view for fast sale entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlavorSnapshot {
    pub flavor: Flavor,
    /// Units on hand (0 when nothing was produced yet).
    pub quantity: i64,
    /// Current weighted-average cost (0 when nothing was produced yet).
    pub avg_cost_cents: i64,
}

impl FlavorSnapshot {
    fn assemble(flavor: Flavor, record: Option<InventoryRecord>) -> Self {
        let (quantity, avg_cost_cents) = record.map_or((0, 0), |r| (r.quantity, r.avg_cost_cents));
        FlavorSnapshot {
            flavor,
            quantity,
            avg_cost_cents,
        }
    }
}

/// Read-through cache of [`FlavorSnapshot`]s keyed by flavor id.
///
/// Shared across clones; all writes to the catalog or inventory must
/// invalidate the touched id.
#[derive(Debug, Clone, Default)]
pub struct FlavorCache {
    entries: Arc<Mutex<HashMap<String, FlavorSnapshot>>>,
}

impl FlavorCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        FlavorCache::default()
    }

    fn get(&self, flavor_id: &str) -> Option<FlavorSnapshot> {
        self.entries.lock().unwrap().get(flavor_id).cloned()
    }

    fn store(&self, snapshot: FlavorSnapshot) {
        self.entries
            .lock()
            .unwrap()
            .insert(snapshot.flavor.id.clone(), snapshot);
    }

    /// Drops one flavor's cached snapshot.
    pub fn invalidate(&self, flavor_id: &str) {
        self.entries.lock().unwrap().remove(flavor_id);
    }

    /// Drops everything (used when a bulk change lands).
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

/// Input for creating or editing a flavor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlavorInput {
    pub name: String,
    pub emoji: String,
    pub color: String,
}

/// Service for the flavor catalog and production registration.
#[derive(Debug, Clone)]
pub struct CatalogService {
    db: Database,
    cache: FlavorCache,
}

impl CatalogService {
    /// Creates a new CatalogService.
    pub fn new(db: Database) -> Self {
        CatalogService {
            db,
            cache: FlavorCache::new(),
        }
    }

    /// Creates a flavor.
    pub async fn create_flavor(&self, input: FlavorInput) -> Result<Flavor, ApiError> {
        let name = validate_flavor_name(&input.name).map_err(CoreError::from)?;

        let flavor = Flavor {
            id: Uuid::new_v4().to_string(),
            name,
            emoji: input.emoji,
            color: input.color,
            is_active: true,
            created_at: Utc::now(),
        };

        self.db.flavors().insert(&flavor).await?;

        info!(flavor_id = %flavor.id, name = %flavor.name, "Flavor created");
        Ok(flavor)
    }

    /// Updates a flavor's display fields.
    pub async fn update_flavor(&self, id: &str, input: FlavorInput) -> Result<(), ApiError> {
        let name = validate_flavor_name(&input.name).map_err(CoreError::from)?;

        let mut flavor = self
            .db
            .flavors()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::from(CoreError::FlavorNotFound(id.to_string())))?;

        flavor.name = name;
        flavor.emoji = input.emoji;
        flavor.color = input.color;

        self.db.flavors().update(&flavor).await?;
        self.cache.invalidate(id);

        Ok(())
    }

    /// Hides a flavor from the catalog. Historical sales keep working.
    pub async fn deactivate_flavor(&self, id: &str) -> Result<(), ApiError> {
        self.db.flavors().soft_delete(id).await?;
        self.cache.invalidate(id);
        Ok(())
    }

    /// Restores a hidden flavor.
    pub async fn reactivate_flavor(&self, id: &str) -> Result<(), ApiError> {
        self.db.flavors().reactivate(id).await?;
        self.cache.invalidate(id);
        Ok(())
    }

    /// Registers a production batch and refreshes the cached snapshot.
    pub async fn register_batch(
        &self,
        flavor_id: &str,
        input_cost_cents: i64,
        units_produced: i64,
        notes: Option<String>,
    ) -> Result<ProductionBatch, ApiError> {
        let batch = self
            .db
            .inventory()
            .register_batch(flavor_id, input_cost_cents, units_produced, notes)
            .await?;

        self.cache.invalidate(flavor_id);
        Ok(batch)
    }

    /// Tells the catalog a sale moved this flavor's stock.
    ///
    /// Called by the UI after a successful sale so the grid refreshes; the
    /// sale itself never consulted the cache.
    pub fn note_stock_changed(&self, flavor_id: &str) {
        self.cache.invalidate(flavor_id);
    }

    /// Flavor + stock snapshot, served read-through from the cache.
    pub async fn snapshot(&self, flavor_id: &str) -> Result<FlavorSnapshot, ApiError> {
        if let Some(hit) = self.cache.get(flavor_id) {
            debug!(flavor_id, "Snapshot served from cache");
            return Ok(hit);
        }

        let snapshot = self.load_snapshot(flavor_id).await?;
        self.cache.store(snapshot.clone());
        Ok(snapshot)
    }

    async fn load_snapshot(&self, flavor_id: &str) -> Result<FlavorSnapshot, ApiError> {
        let flavor = self
            .db
            .flavors()
            .get_by_id(flavor_id)
            .await?
            .ok_or_else(|| ApiError::from(CoreError::FlavorNotFound(flavor_id.to_string())))?;

        let record = self.db.inventory().get(flavor_id).await?;

        Ok(FlavorSnapshot::assemble(flavor, record))
    }

    /// Snapshots for every active flavor (the sale-entry grid).
    ///
    /// Loaded fresh and re-cached; the grid is the natural refresh point.
    pub async fn grid(&self) -> Result<Vec<FlavorSnapshot>, ApiError> {
        let flavors = self.db.flavors().list_active().await?;
        let records = self.db.inventory().list().await?;

        let mut by_id: HashMap<String, InventoryRecord> = records
            .into_iter()
            .map(|r| (r.flavor_id.clone(), r))
            .collect();

        let snapshots: Vec<FlavorSnapshot> = flavors
            .into_iter()
            .map(|flavor| {
                let record = by_id.remove(&flavor.id);
                FlavorSnapshot::assemble(flavor, record)
            })
            .collect();

        for snapshot in &snapshots {
            self.cache.store(snapshot.clone());
        }

        Ok(snapshots)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
