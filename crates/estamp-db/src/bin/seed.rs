//! # Seed Data Generator
//!
//! Populates the database with sample templates and promo codes for
//! development.
//!
//! ## Usage
//! ```bash
//! cargo run -p estamp-db --bin seed
//! cargo run -p estamp-db --bin seed -- --db ./data/estamp.db
//! ```

use std::env;

use anyhow::Context;
use chrono::{Duration, Utc};
use estamp_core::{DiscountRule, Money, NewPromoCode, NewTemplate};
use estamp_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (state, document type, base price, convenience fee) in paise.
const TEMPLATES: &[(&str, &str, i64, i64)] = &[
    ("Karnataka", "Rental Agreement", 10100, 7697),
    ("Karnataka", "Affidavit", 2000, 4900),
    ("Karnataka", "Sale Agreement", 50000, 14900),
    ("Maharashtra", "Leave and License", 10000, 7697),
    ("Maharashtra", "Affidavit", 50000, 4900),
    ("Delhi", "Rental Agreement", 5000, 7697),
    ("Delhi", "Power of Attorney", 10000, 9900),
    ("Tamil Nadu", "Rental Agreement", 2000, 7697),
    ("Telangana", "Rental Agreement", 10000, 7697),
    ("Uttar Pradesh", "Rental Agreement", 10000, 7697),
];

fn promo_codes() -> Vec<NewPromoCode> {
    let now = Utc::now();
    let window = |days: i64| (now - Duration::days(1), now + Duration::days(days));

    let (valid_from, valid_until) = window(90);
    vec![
        NewPromoCode {
            code: "SUPER".to_string(),
            discount: DiscountRule::Fixed {
                amount: Money::from_paise(1500),
            },
            min_order_amount: Money::from_paise(10000),
            valid_from,
            valid_until,
            usage_limit: None,
        },
        NewPromoCode {
            code: "WELCOME20".to_string(),
            discount: DiscountRule::Percentage {
                percent: 20,
                cap: Some(Money::from_paise(10000)),
            },
            min_order_amount: Money::zero(),
            valid_from,
            valid_until,
            usage_limit: Some(1000),
        },
        NewPromoCode {
            code: "LAUNCH".to_string(),
            discount: DiscountRule::Fixed {
                amount: Money::from_paise(5000),
            },
            min_order_amount: Money::from_paise(20000),
            valid_from,
            valid_until: now + Duration::days(7),
            usage_limit: Some(1),
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./estamp_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if let Some(path) = args.get(i + 1) {
                    db_path = path.clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("E-Stamp Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./estamp_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening database at {}", db_path))?;

    info!(path = %db_path, "Connected, migrations applied");

    let existing = db.templates().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has templates, skipping seed");
        return Ok(());
    }

    for &(state, document_type, base_price, convenience_fee) in TEMPLATES {
        db.templates()
            .insert(&NewTemplate {
                state: state.to_string(),
                document_type: document_type.to_string(),
                base_price: Money::from_paise(base_price),
                convenience_fee: Money::from_paise(convenience_fee),
                description: None,
            })
            .await
            .with_context(|| format!("seeding template {} / {}", state, document_type))?;
    }

    for promo in promo_codes() {
        let code = promo.code.clone();
        db.promo_codes()
            .insert(&promo)
            .await
            .with_context(|| format!("seeding promo code {}", code))?;
    }

    info!(
        templates = TEMPLATES.len(),
        promo_codes = db.promo_codes().count().await?,
        "Seed complete"
    );

    db.close().await;
    Ok(())
}
