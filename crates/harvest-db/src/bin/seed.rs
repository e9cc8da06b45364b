//! # Seed Data Generator
//!
//! Populates both stores with sample farmers, consumers and produce for
//! local development.
//!
//! ## Usage
//! ```bash
//! # Default paths (./data/documents.db, ./data/accounts.db)
//! cargo run -p harvest-db --bin seed
//!
//! # Custom paths
//! cargo run -p harvest-db --bin seed -- --documents ./tmp/docs.db --accounts ./tmp/acc.db
//! ```
//!
//! ## Generated Data
//! - 4 farmer accounts and 2 consumer accounts
//! - Every farmer lists a handful of produce; several names are shared
//!   across farmers so the "who sells this" page has variants
//! - One placeholder PNG per listing in the image store

use std::env;

use chrono::{Duration, NaiveDate, Utc};
use harvest_core::validation::ProductDraft;
use harvest_core::{Account, AccountRole, AccountSettings, DiscountRate, Money, Traceability};
use harvest_db::{
    generate_image_filename, generate_product_id, AccountStore, DbConfig, DocumentStore,
};
use tracing::{info, warn};

/// (uid, name, location, mobile)
const FARMERS: &[(&str, &str, &str, &str)] = &[
    ("farmer-nashik", "Suresh Patil", "Nashik, Maharashtra", "9822011111"),
    ("farmer-ratnagiri", "Meena Sawant", "Ratnagiri, Maharashtra", "9822022222"),
    ("farmer-kolar", "Ramesh Gowda", "Kolar, Karnataka", "9845033333"),
    ("farmer-ooty", "Lakshmi Nair", "Ooty, Tamil Nadu", "9443044444"),
];

const CONSUMERS: &[(&str, &str)] = &[
    ("consumer-pune", "Ravi Kulkarni"),
    ("consumer-blr", "Anita Rao"),
];

/// (farmer uid, name, category, price in paise, unit, discount bps, method)
const PRODUCE: &[(&str, &str, &str, i64, &str, u32, &str)] = &[
    ("farmer-nashik", "Tomato", "Vegetables", 3200, "kg", 0, "Conventional"),
    ("farmer-nashik", "Onion", "Vegetables", 2800, "kg", 500, "Conventional"),
    ("farmer-nashik", "Grapes", "Fruits", 9000, "kg", 1000, "Organic"),
    ("farmer-ratnagiri", "Alphonso Mango", "Fruits", 65000, "dozen", 0, "Organic"),
    ("farmer-ratnagiri", "Cashew", "Dry Fruits", 90000, "kg", 0, "Conventional"),
    ("farmer-kolar", "Tomato", "Vegetables", 3000, "kg", 0, "Organic"),
    ("farmer-kolar", "Carrot", "Vegetables", 4500, "kg", 0, "Conventional"),
    ("farmer-kolar", "Onion", "Vegetables", 2600, "kg", 0, "Conventional"),
    ("farmer-ooty", "Carrot", "Vegetables", 5200, "kg", 1500, "Organic"),
    ("farmer-ooty", "Tea Leaves", "Beverages", 40000, "kg", 0, "Organic"),
    ("farmer-ooty", "Tomato", "Vegetables", 3500, "kg", 0, "Hydroponic"),
];

/// 1x1 transparent PNG.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut documents_path = String::from("./data/documents.db");
    let mut accounts_path = String::from("./data/accounts.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--documents" => {
                if let Some(path) = args.get(i + 1) {
                    documents_path = path.clone();
                    i += 1;
                }
            }
            "--accounts" => {
                if let Some(path) = args.get(i + 1) {
                    accounts_path = path.clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Harvest Link Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --documents <PATH>  Document store path (default: ./data/documents.db)");
                println!("  --accounts <PATH>   Account store path (default: ./data/accounts.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let documents = DocumentStore::new(DbConfig::new(&documents_path)).await?;
    let accounts = AccountStore::new(DbConfig::new(&accounts_path)).await?;
    info!(documents = %documents_path, accounts = %accounts_path, "Connected to both stores");

    let existing = documents.products().count().await?;
    if existing > 0 {
        warn!(existing, "Document store already has products, skipping seed");
        return Ok(());
    }

    let now = Utc::now();

    // -------------------------------------------------------------------------
    // Accounts
    // -------------------------------------------------------------------------

    let people = FARMERS
        .iter()
        .map(|(uid, name, location, mobile)| {
            (*uid, *name, AccountRole::Farmer, Some(*location), Some(*mobile))
        })
        .chain(
            CONSUMERS
                .iter()
                .map(|(uid, name)| (*uid, *name, AccountRole::Consumer, None, None)),
        );

    for (idx, (uid, name, role, location, mobile)) in people.enumerate() {
        let joined = now - Duration::days(400 - 30 * idx as i64);
        let account = Account {
            uid: uid.to_string(),
            name: name.to_string(),
            email: format!("{uid}@harvest.example"),
            role,
            mobile: mobile.map(str::to_string),
            bio: None,
            location: location.map(str::to_string),
            profile_image: None,
            settings: AccountSettings::default(),
            created_at: joined,
            updated_at: joined,
        };

        if let Err(e) = accounts.accounts().insert(&account).await {
            warn!(uid = %uid, error = %e, "Failed to insert account");
        }
    }

    // -------------------------------------------------------------------------
    // Listings
    // -------------------------------------------------------------------------

    let start = std::time::Instant::now();
    let mut generated = 0;

    for (idx, (farmer_id, name, category, price, unit, discount, method)) in
        PRODUCE.iter().enumerate()
    {
        let (location, mobile) = FARMERS
            .iter()
            .find(|(uid, ..)| uid == farmer_id)
            .map(|(_, _, location, mobile)| (*location, *mobile))
            .unwrap_or_default();

        let draft = ProductDraft {
            farmer_id: farmer_id.to_string(),
            farmer_mobile: Some(mobile.to_string()),
            farmer_location: Some(location.to_string()),
            name: name.to_string(),
            description: format!("{name} from {location}, harvested this week."),
            category: category.to_string(),
            price: Money::from_paise(*price),
            discount: DiscountRate::from_bps(*discount),
            available_quantity: 20 + (idx as i64 * 7) % 60,
            unit: unit.to_string(),
            traceability: Traceability {
                farm_location: Some(location.to_string()),
                harvest_date: NaiveDate::from_ymd_opt(2026, 10, 1 + (idx as u32 % 14)),
                harvest_method: Some(method.to_string()),
                certified_by: (*method == "Organic").then(|| "NPOP".to_string()),
            },
        };

        let filename = generate_image_filename(Some("placeholder.png"), "image/png");
        documents
            .images()
            .put(&filename, "image/png", PLACEHOLDER_PNG)
            .await?;

        // stagger creation so newest-first ordering is visible
        let created = now - Duration::minutes((PRODUCE.len() - idx) as i64);
        let product = draft.into_product(generate_product_id(), filename, created);

        if let Err(e) = documents.products().insert(&product).await {
            warn!(name = %product.name, error = %e, "Failed to insert product");
            continue;
        }
        generated += 1;
    }

    info!(
        products = generated,
        images = documents.images().count().await?,
        accounts = accounts.accounts().count().await?,
        elapsed = ?start.elapsed(),
        "Seed complete"
    );

    let tomatoes = documents.products().find_by_name("tomato").await?;
    info!(listings = tomatoes.len(), "Verified variants for 'tomato'");

    documents.close().await;
    accounts.close().await;
    Ok(())
}
