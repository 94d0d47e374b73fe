//! # Mock Data Seeder
//!
//! Fills a development database with buildings, rooms, tenants, readings
//! and recent invoices.
//!
//! ## Usage
//! ```bash
//! # Default database and seed
//! cargo run -p nhatro-db --bin seed
//!
//! # Different RNG seed
//! cargo run -p nhatro-db --bin seed -- --seed 7
//!
//! # Specify database path
//! cargo run -p nhatro-db --bin seed -- --db ./data/nhatro.db
//! ```

use chrono::Local;
use std::env;
use nhatro_db::{seed_if_empty, Database, DbConfig, SeedOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut rng_seed: u64 = 42;
    let mut db_path = String::from("./nhatro_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" | "-s" => {
                if i + 1 < args.len() {
                    rng_seed = args[i + 1].parse().unwrap_or(42);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Nhà Trọ Mock Data Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --seed <N>     RNG seed (default: 42)");
                println!("  -d, --db <PATH>    Database file path (default: ./nhatro_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let today = Local::now().date_naive();

    println!("🌱 Nhà Trọ Mock Data Seeder");
    println!("===========================");
    println!("Database: {}", db_path);
    println!("Seed:     {}", rng_seed);
    println!("Today:    {}", today);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let start = std::time::Instant::now();
    let Some(summary) = seed_if_empty(&db, &SeedOptions::new(rng_seed, today)).await? else {
        let rooms = db.rooms().count().await?;
        println!("⚠ Database already has {} rooms", rooms);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    };

    println!();
    println!("✓ Seeded in {:?}", start.elapsed());
    println!("  Buildings:     {}", summary.buildings);
    println!("  Rooms:         {} ({} occupied)", summary.rooms, summary.occupied);
    println!("  Invoices:      {}", summary.invoices);
    println!("  Requests:      {}", summary.requests);
    println!("  Notifications: {}", summary.notifications);

    let unpaid = db.invoices().list_unpaid().await?;
    println!();
    println!("  Unpaid invoices: {}", unpaid.len());

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
