//! # Seed Data Generator
//!
//! Populates a development database with flavors, production batches, and
//! the default business configuration.
//!
//! ## Usage
//! ```bash
//! cargo run -p puesto-db --bin seed
//!
//! # Specify database path
//! cargo run -p puesto-db --bin seed -- --db ./data/puesto.db
//! ```

use chrono::Utc;
use std::env;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use puesto_core::Flavor;
use puesto_db::{Database, DbConfig};

/// Starter catalog: (name, emoji, color, batch cost in cents, batch units).
const FLAVORS: &[(&str, &str, &str, i64, i64)] = &[
    ("Natural", "🥜", "#F59E0B", 18000, 40),
    ("Chile Limón", "🌶️", "#EF4444", 21000, 38),
    ("Salado", "🧂", "#6B7280", 17500, 42),
    ("Enchilado", "🔥", "#F97316", 22000, 36),
    ("Ajo", "🌿", "#22C55E", 19000, 40),
    ("Miel", "🍯", "#EAB308", 24000, 35),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./puesto_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Puesto POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./puesto_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Puesto POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.flavors().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} flavors", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let business = db.config().load_or_create().await?;
    println!(
        "✓ Business config: {} (default price {} cents)",
        business.business_name, business.default_price_cents
    );

    println!();
    println!("Seeding flavors and batches...");

    for (name, emoji, color, batch_cost_cents, batch_units) in FLAVORS {
        let flavor = Flavor {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            emoji: emoji.to_string(),
            color: color.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        db.flavors().insert(&flavor).await?;

        let batch = db
            .inventory()
            .register_batch(&flavor.id, *batch_cost_cents, *batch_units, None)
            .await?;

        println!(
            "  {} {:12} {} units @ {} cents/unit",
            emoji, name, batch_units, batch.unit_cost_cents
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
