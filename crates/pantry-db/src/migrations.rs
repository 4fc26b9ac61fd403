//! # Database Migrations
//!
//! Embedded SQL migrations, one set per store.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Store opens (InventoryDatabase / CartDatabase)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table (created if missing)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs applied                                │
//! │       │                                                                 │
//! │       ├── checksum differs?  → StorageInit (schema mismatch)           │
//! │       └── pending?           → run in order, record in table          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Store is Ready                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Directory Structure
//! ```text
//! migrations/
//! ├── inventory/
//! │   └── 0001_create_products.sql
//! └── cart/
//!     └── 0001_create_cart.sql
//! ```
//!
//! **NEVER** modify an existing migration - always add a new one.

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Migrations for the inventory store (`products` table).
pub static INVENTORY_MIGRATOR: Migrator = sqlx::migrate!("./migrations/inventory");

/// Migrations for the cart store (`cart` table).
pub static CART_MIGRATOR: Migrator = sqlx::migrate!("./migrations/cart");

/// Runs all pending migrations of `migrator` against `pool`.
///
/// ## Safety
/// - Idempotent: safe to run multiple times
/// - Transactional: each migration runs in a transaction
/// - Ordered: migrations run in version order (0001, 0002, ...)
pub async fn run_migrations(
    pool: &SqlitePool,
    migrator: &'static Migrator,
    store: &'static str,
) -> DbResult<()> {
    info!(store, "Checking for pending migrations");

    migrator.run(pool).await?;

    info!(store, "All migrations applied successfully");
    Ok(())
}

/// Returns information about migrations.
///
/// ## Returns
/// Tuple of (total_migrations, applied_migrations)
///
/// ## Usage
/// For diagnostics and health checks.
pub async fn migration_status(
    pool: &SqlitePool,
    migrator: &'static Migrator,
) -> DbResult<(usize, usize)> {
    let total = migrator.migrations.len();

    let applied: i64 =
        match sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
        {
            Ok(count) => count,
            // Never migrated: the bookkeeping table does not exist yet
            Err(sqlx::Error::Database(e)) if e.message().contains("no such table") => 0,
            Err(e) => return Err(e.into()),
        };

    Ok((total, applied as usize))
}

// =============================================================================
// Unit Tests
// =============================================================================
