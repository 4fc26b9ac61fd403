//! # Seed Data Generator
//!
//! Populates the inventory store with a fruit and vegetable catalogue.
//!
//! ## Usage
//! ```bash
//! # Seed the default application location
//! cargo run -p pantry-db --bin seed
//!
//! # Seed a specific data directory, replacing existing rows
//! cargo run -p pantry-db --bin seed -- --db ./data --on-conflict replace
//!
//! # Use a settings file and print the resulting snapshot as JSON
//! cargo run -p pantry-db --bin seed -- --config ./pantry.toml --json
//!
//! # Also fill the cart with a few catalogue items
//! cargo run -p pantry-db --bin seed -- --db ./data --cart
//! ```
//!
//! Without `--on-conflict` or a settings file, duplicates are ignored so the
//! seed can be re-run safely.

use std::env;
use std::path::PathBuf;

use pantry_core::validation::{validate_cart_item, validate_product};
use pantry_core::{Cart, ConflictPolicy, Product};
use pantry_db::{AppContext, CartDatabase, InventoryDatabase, StorageSettings};
use tracing::{info, warn, Subscriber};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,pantry_db=debug,sqlx=warn";

/// Number of catalogue items placed in the cart by `--cart`.
const SAMPLE_CART_LINES: usize = 3;

/// (category, [(name, price)])
const CATALOGUE: &[(&str, &[(&str, f64)])] = &[
    (
        "fruit",
        &[
            ("Apples", 1.0),
            ("Bananas", 0.5),
            ("Cherries", 4.5),
            ("Grapes", 2.75),
            ("Kiwis", 0.4),
            ("Lemons", 0.35),
            ("Mangoes", 1.6),
            ("Oranges", 0.8),
            ("Pears", 0.9),
            ("Strawberries", 3.2),
        ],
    ),
    (
        "vegetable",
        &[
            ("Broccoli", 1.3),
            ("Cabbage", 1.1),
            ("Carrots", 0.25),
            ("Cucumbers", 0.7),
            ("Garlic", 0.3),
            ("Leeks", 1.2),
            ("Onions", 0.2),
            ("Peppers", 0.95),
            ("Potatoes", 0.15),
            ("Tomatoes", 0.6),
        ],
    ),
];

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
struct SeedArgs {
    data_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    on_conflict: Option<ConflictPolicy>,
    json: bool,
    cart: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(args) = parse_args(&args)? else {
        print_help();
        return Ok(());
    };

    let mut settings = match &args.config_path {
        Some(path) => StorageSettings::load(path)?,
        None => StorageSettings::new(ConflictPolicy::Ignore),
    };
    if let Some(dir) = args.data_dir {
        settings.data_dir = Some(dir);
    }
    if let Some(policy) = args.on_conflict {
        settings.on_conflict = policy;
    }

    let ctx = AppContext::from_settings(&settings)?;
    info!(data_dir = ?ctx.data_dir(), on_conflict = %ctx.on_conflict(), "Seeding inventory");

    let db = InventoryDatabase::get_database(&ctx).await?;
    let products = db.products();

    let existing = products.count().await?;
    if existing > 0 {
        info!(existing, "Inventory already has products");
    }

    let mut written = 0;
    let mut id = 1;
    for (category, items) in CATALOGUE {
        for (name, price) in items.iter() {
            let product = Product::new(id, *name, *price, *category);
            id += 1;

            if let Err(e) = validate_product(&product) {
                warn!(id = product.id, error = %e, "Skipping invalid product");
                continue;
            }

            match products.insert(&product).await {
                Ok(rows) => written += rows,
                Err(e) => warn!(id = product.id, error = %e, "Failed to insert product"),
            }
        }
    }

    let snapshot = products.get_all().first().await?;
    info!(written, total = snapshot.len(), "Seed complete");

    if args.cart {
        seed_cart(&ctx, &snapshot).await?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        for product in &snapshot {
            println!(
                "{:>3}  {:<14} {:>6.2}  {}",
                product.id, product.name, product.price, product.category
            );
        }
    }

    InventoryDatabase::registry().close().await;
    CartDatabase::registry().close().await;
    Ok(())
}

/// Puts the first few products in the cart, quantities 1, 2, 3.
async fn seed_cart(ctx: &AppContext, products: &[Product]) -> Result<(), Box<dyn std::error::Error>> {
    let db = CartDatabase::get_database(ctx).await?;
    let items = db.cart_items();

    for (quantity, product) in (1..).zip(products.iter().take(SAMPLE_CART_LINES)) {
        let line = Cart::from_product(product, quantity);

        if let Err(e) = validate_cart_item(&line) {
            warn!(id = line.id, error = %e, "Skipping invalid cart item");
            continue;
        }
        items.insert(&line).await?;
    }

    let lines = items.count().await?;
    let total = items.total().await?;
    info!(lines, total, "Cart seeded");
    Ok(())
}

/// Parses arguments (without the program name). `Ok(None)` means help was requested.
fn parse_args(args: &[String]) -> Result<Option<SeedArgs>, Box<dyn std::error::Error>> {
    let mut parsed = SeedArgs::default();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = || {
            iter.next()
                .map(String::as_str)
                .ok_or_else(|| format!("{arg} requires a value"))
        };

        match arg.as_str() {
            "--db" | "-d" => parsed.data_dir = Some(PathBuf::from(value()?)),
            "--config" | "-c" => parsed.config_path = Some(PathBuf::from(value()?)),
            "--on-conflict" => parsed.on_conflict = Some(value()?.parse()?),
            "--json" => parsed.json = true,
            "--cart" => parsed.cart = true,
            "--help" | "-h" => return Ok(None),
            other => warn!(argument = other, "Ignoring unknown argument"),
        }
    }

    Ok(Some(parsed))
}

fn print_help() {
    println!("Pantry Seed Data Generator");
    println!();
    println!("Usage: seed [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --db <DIR>            Data directory (default: platform data dir)");
    println!("  -c, --config <PATH>       Storage settings file (TOML)");
    println!("      --on-conflict <MODE>  reject | replace | ignore (default: ignore)");
    println!("      --cart                Also put a few products in the cart");
    println!("      --json                Print the final snapshot as JSON");
    println!("  -h, --help                Show this help message");
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=pantry_db=trace` - Show live query notifications
/// - Default: INFO, with debug for pantry crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    subscriber(filter).init();
}

/// The filter alone decides which events are written.
fn subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}
