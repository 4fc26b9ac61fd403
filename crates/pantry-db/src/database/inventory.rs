//! # Inventory Database
//!
//! Container for the product store: owns the SQLite pool for
//! `inventory_database` and the single [`ProductRepository`] handed to every
//! caller.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;
use tracing::info;

use crate::context::AppContext;
use crate::error::DbResult;
use crate::migrations::{self, INVENTORY_MIGRATOR};
use crate::pool::{self, DbConfig};
use crate::registry::{Registry, Store};
use crate::repository::product::ProductRepository;

static REGISTRY: Lazy<Registry<InventoryDatabase>> = Lazy::new(Registry::new);

/// Product store container.
///
/// ## Usage
/// ```rust,ignore
/// let ctx = AppContext::default_location(ConflictPolicy::Reject)?;
/// let db = InventoryDatabase::get_database(&ctx).await?;
///
/// db.products().insert(&Product::new(1, "Apples", 1.0, "fruit")).await?;
/// ```
#[derive(Debug)]
pub struct InventoryDatabase {
    pool: SqlitePool,
    products: ProductRepository,
}

impl InventoryDatabase {
    /// File name of the store inside the data directory.
    pub const FILE_NAME: &'static str = "inventory_database";

    /// Opens a standalone instance, bypassing the process-wide registry.
    ///
    /// Tests use this to get a fresh store per case; production code goes
    /// through [`get_database`](Self::get_database).
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let pool = pool::connect(&config, &INVENTORY_MIGRATOR, Self::NAME).await?;
        let products = ProductRepository::new(pool.clone(), config.on_conflict);

        info!(store = Self::NAME, "Inventory database opened");
        Ok(InventoryDatabase { pool, products })
    }

    /// Returns the process-wide instance, constructing it on first use.
    pub async fn get_database(ctx: &AppContext) -> DbResult<Arc<Self>> {
        REGISTRY
            .get_or_open(ctx.database_config(Self::FILE_NAME))
            .await
    }

    /// The process-wide registry behind [`get_database`](Self::get_database).
    pub fn registry() -> &'static Registry<Self> {
        &REGISTRY
    }

    /// The product data-access interface. Every caller gets the same object.
    pub fn products(&self) -> &ProductRepository {
        &self.products
    }

    /// Returns a reference to the connection pool.
    ///
    /// Prefer repository methods when available.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the pool and wakes live queries so they report the closure.
    ///
    /// After calling close, every repository operation fails with
    /// `DbError::Closed`.
    pub async fn close(&self) {
        if self.pool.is_closed() {
            return;
        }
        info!(store = Self::NAME, "Closing inventory database");
        self.pool.close().await;
        self.products.notify_subscribers();
    }

    /// True once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Checks if the database can execute queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// (total, applied) migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool, &INVENTORY_MIGRATOR).await
    }
}

#[async_trait]
impl Store for InventoryDatabase {
    const NAME: &'static str = "inventory";

    async fn open(config: DbConfig) -> DbResult<Self> {
        InventoryDatabase::new(config).await
    }

    async fn shutdown(&self) {
        self.close().await;
    }

    fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
