//! # Seed Data Generator
//!
//! Creates the owner account and a small sample catalogue for development.
//!
//! ## Usage
//! ```bash
//! # Owner "owner" / password "changeme", database ./tally_dev.db
//! cargo run -p tally-db --bin seed
//!
//! # Custom owner credentials and database path
//! cargo run -p tally-db --bin seed -- --owner admin --password s3cret --db ./data/tally.db
//! ```
//!
//! The owner password is always (re)set. Products, customers and suppliers
//! are only generated when the catalogue is empty.

use std::env;
use tally_db::repository::party::{NewCustomer, NewSupplier};
use tally_db::repository::product::NewProduct;
use tally_db::{Database, DbConfig};
use tally_core::BalanceType;

/// (name, brand, category, unit, retail, wholesale, cost, stock)
type SampleProduct = (&'static str, &'static str, &'static str, &'static str, i64, Option<i64>, i64, i64);

const PRODUCTS: &[SampleProduct] = &[
    ("Cement 50kg", "Lucky", "Building", "bag", 145000, Some(138000), 130000, 120),
    ("Cement 50kg", "DG Khan", "Building", "bag", 142000, Some(136000), 128000, 80),
    ("Steel Bar 12mm", "Amreli", "Building", "ton", 26500000, Some(25800000), 25000000, 4),
    ("Sand", "Ravi", "Building", "cft", 9000, Some(8000), 6500, 900),
    ("PVC Pipe 1in", "Beta", "Plumbing", "pcs", 85000, Some(78000), 70000, 60),
    ("Ball Valve 1/2in", "Master", "Plumbing", "pcs", 45000, None, 32000, 40),
    ("Wire 7/29", "Fast Cables", "Electrical", "roll", 1250000, Some(1180000), 1100000, 25),
    ("LED Bulb 12W", "Philips", "Electrical", "pcs", 55000, Some(48000), 42000, 150),
    ("Emulsion Paint 4L", "Berger", "Paint", "can", 420000, Some(395000), 360000, 30),
    ("Nails 3in", "Local", "Hardware", "kg", 40000, Some(36000), 30000, 200),
];

const CUSTOMERS: &[(&str, &str, &str, i64, BalanceType)] = &[
    ("Bilal Traders", "0300-1234567", "long-term", 2500000, BalanceType::Debit),
    ("Ahmed Construction", "0321-7654321", "long-term", 0, BalanceType::Debit),
    ("Sana Interiors", "0333-1112223", "retail", 0, BalanceType::Debit),
];

const SUPPLIERS: &[(&str, &str, i64, BalanceType)] = &[
    ("Lucky Cement Distributors", "042-35761234", 15000000, BalanceType::Credit),
    ("Beta Pipes Agency", "042-36665544", 0, BalanceType::Credit),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tally_dev.db");
    let mut owner = String::from("owner");
    let mut password = String::from("changeme");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--owner" | "-o" => {
                if i + 1 < args.len() {
                    owner = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./tally_dev.db)");
                println!("  -o, --owner <NAME>       Owner username (default: owner)");
                println!("  -p, --password <PASS>    Owner password (default: changeme)");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Owner:    {}", owner);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    db.users().upsert_owner(&owner, &password).await?;
    println!("✓ Owner credentials stored");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping catalogue seed to avoid duplicates.");
        db.close().await;
        return Ok(());
    }

    println!();
    println!("Generating catalogue...");

    for &(name, brand, category, unit, retail, wholesale, cost, stock) in PRODUCTS {
        let created = db
            .products()
            .create(NewProduct {
                name: name.to_string(),
                brand: Some(brand.to_string()),
                category: Some(category.to_string()),
                unit_of_measure: Some(unit.to_string()),
                retail_price_cents: retail,
                wholesale_price_cents: wholesale,
                cost_price_cents: Some(cost),
                stock_quantity: stock,
            })
            .await;
        if let Err(e) = created {
            eprintln!("Failed to insert {} ({}): {}", name, brand, e);
        }
    }
    println!("  Products:  {}", db.products().count().await?);

    for &(name, phone, classification, opening, polarity) in CUSTOMERS {
        db.customers()
            .create(NewCustomer {
                name: name.to_string(),
                phone: Some(phone.to_string()),
                classification: Some(classification.to_string()),
                opening_balance_cents: opening,
                opening_balance_type: Some(polarity),
            })
            .await?;
    }
    println!("  Customers: {}", CUSTOMERS.len());

    for &(name, phone, opening, polarity) in SUPPLIERS {
        db.suppliers()
            .create(NewSupplier {
                name: name.to_string(),
                phone: Some(phone.to_string()),
                opening_balance_cents: opening,
                opening_balance_type: Some(polarity),
            })
            .await?;
    }
    println!("  Suppliers: {}", SUPPLIERS.len());

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
