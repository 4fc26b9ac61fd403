//! # Cart Database
//!
//! Container for the cart store: owns the SQLite pool for `cart_database`
//! and the single [`CartRepository`] handed to every caller.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;
use tracing::info;

use crate::context::AppContext;
use crate::error::DbResult;
use crate::migrations::{self, CART_MIGRATOR};
use crate::pool::{self, DbConfig};
use crate::registry::{Registry, Store};
use crate::repository::cart::CartRepository;

static REGISTRY: Lazy<Registry<CartDatabase>> = Lazy::new(Registry::new);

/// Cart store container.
#[derive(Debug)]
pub struct CartDatabase {
    pool: SqlitePool,
    items: CartRepository,
}

impl CartDatabase {
    /// File name of the store inside the data directory.
    pub const FILE_NAME: &'static str = "cart_database";

    /// Opens a standalone instance, bypassing the process-wide registry.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let pool = pool::connect(&config, &CART_MIGRATOR, Self::NAME).await?;
        let items = CartRepository::new(pool.clone(), config.on_conflict);

        info!(store = Self::NAME, "Cart database opened");
        Ok(CartDatabase { pool, items })
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

    /// The cart data-access interface. Every caller gets the same object.
    pub fn cart_items(&self) -> &CartRepository {
        &self.items
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the pool and wakes live queries so they report the closure.
    pub async fn close(&self) {
        if self.pool.is_closed() {
            return;
        }
        info!(store = Self::NAME, "Closing cart database");
        self.pool.close().await;
        self.items.notify_subscribers();
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
        migrations::migration_status(&self.pool, &CART_MIGRATOR).await
    }
}

#[async_trait]
impl Store for CartDatabase {
    const NAME: &'static str = "cart";

    async fn open(config: DbConfig) -> DbResult<Self> {
        CartDatabase::new(config).await
    }

    async fn shutdown(&self) {
        self.close().await;
    }

    fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_core::{Cart, ConflictPolicy};

    #[tokio::test]
    async fn test_open_and_use() {
        let db = CartDatabase::new(DbConfig::in_memory(ConflictPolicy::Ignore))
            .await
            .unwrap();

        assert!(db.health_check().await);
        assert_eq!(db.migration_status().await.unwrap(), (1, 1));

        let line = Cart::new(3, "Pears", 0.8, "fruit", 5);
        db.cart_items().insert(&line).await.unwrap();
        assert_eq!(db.cart_items().get_all().first().await.unwrap(), vec![line]);

        db.close().await;
        assert!(db.is_closed());
    }

    #[tokio::test]
    async fn test_stores_use_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::new(dir.path(), ConflictPolicy::Reject);

        let db = CartDatabase::new(ctx.database_config(CartDatabase::FILE_NAME))
            .await
            .unwrap();
        db.close().await;

        assert!(dir.path().join("cart_database").exists());
        assert!(!dir.path().join("inventory_database").exists());
    }
}
