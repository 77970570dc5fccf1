//! # Seed Data Loader
//!
//! Stocks a development database with a small Kenyan duka inventory.
//!
//! ## Usage
//! ```bash
//! # Built-in shop inventory
//! cargo run -p mesha-db --bin seed
//!
//! # Items from a JSON file (a list of {"name", "price", "stock"})
//! cargo run -p mesha-db --bin seed -- --from items.json
//!
//! # Specify database path
//! cargo run -p mesha-db --bin seed -- --db ./data/mesha.db
//! ```
//!
//! Seeding is skipped when the database already holds items.

use std::env;
use std::fs;

use mesha_core::validation::validate_new_item;
use mesha_core::{Money, NewItem};
use mesha_db::{Database, DbConfig, InventoryRepository};
use rust_decimal::Decimal;

/// Built-in inventory: (name, price in KSH, stock). Stock may be fractional.
const SHOP_ITEMS: &[(&str, &str, &str)] = &[
    ("Bread 400g", "65", "24"),
    ("Milk 500ml", "60", "40"),
    ("Sugar 1kg", "150", "30"),
    ("Maize Flour 2kg", "210", "20"),
    ("Wheat Flour 2kg", "230", "15"),
    ("Cooking Oil 1L", "320", "12"),
    ("Rice (kg)", "180", "25.5"),
    ("Beans (kg)", "160", "18.25"),
    ("Tea Leaves 250g", "140", "22"),
    ("Salt 1kg", "45", "35"),
    ("Eggs (tray)", "450", "8"),
    ("Bar Soap", "120", "16"),
    ("Toothpaste 100ml", "175", "9"),
    ("Tomatoes (kg)", "90", "6.5"),
    ("Onions (kg)", "110", "7"),
    ("Airtime 100", "100", "50"),
    ("Matchbox", "10", "100"),
    ("Candles (pack)", "80", "5"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./mesha_dev.db");
    let mut from_file: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--from" | "-f" => {
                if i + 1 < args.len() {
                    from_file = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Mesha POS Seed Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: ./mesha_dev.db)");
                println!("  -f, --from <FILE>   JSON list of items to load instead of the built-in shop");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    let items = match &from_file {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            serde_json::from_str::<Vec<NewItem>>(&raw)?
        }
        None => builtin_items()?,
    };

    println!("Mesha POS Seed Data Loader");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Items:    {}", items.len());
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let inventory = db.inventory();

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = inventory.count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to reload.");
        return Ok(());
    }

    let mut loaded = 0;
    for item in items {
        let name = item.name.clone();
        let item = match validate_new_item(item) {
            Ok(item) => item,
            Err(e) => {
                eprintln!("Skipping {}: {}", name, e);
                continue;
            }
        };

        if let Err(e) = inventory.create(item).await {
            eprintln!("Failed to insert {}: {}", name, e);
            continue;
        }
        loaded += 1;
    }

    println!();
    println!("✓ Loaded {} items", loaded);

    db.close().await;
    Ok(())
}

fn builtin_items() -> Result<Vec<NewItem>, rust_decimal::Error> {
    SHOP_ITEMS
        .iter()
        .map(|(name, price, stock)| {
            Ok(NewItem {
                name: name.to_string(),
                price: Money::new(price.parse::<Decimal>()?),
                stock: stock.parse::<Decimal>()?,
            })
        })
        .collect()
}
