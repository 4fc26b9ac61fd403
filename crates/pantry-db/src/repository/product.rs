//! # Product Repository
//!
//! Data-access interface for the `products` table.
//!
//! ## Key Operations
//! - insert / update / delete (full-row, keyed by `id`)
//! - `get_all` / `get_by_id` live queries
//! - one-shot reads for callers that don't need a stream
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Mutation → Notification                              │
//! │                                                                         │
//! │  repo.update(&product).await                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET ... WHERE id = ?1   (committed by SQLite)         │
//! │       │                                                                 │
//! │       ├── rows_affected == 0 → return Ok(0), nobody is woken           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  notifier.notify() → every get_all()/get_by_id() stream re-queries     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use pantry_core::{ConflictPolicy, Product};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::live::{ChangeNotifier, LiveQuery};

const TABLE: &str = "products";

const SELECT_ALL: &str = "SELECT id, name, price, category FROM products ORDER BY id ASC";

const SELECT_BY_ID: &str = "SELECT id, name, price, category FROM products WHERE id = ?1";

const UPDATE: &str = "UPDATE products SET name = ?2, price = ?3, category = ?4 WHERE id = ?1";

const DELETE: &str = "DELETE FROM products WHERE id = ?1";

fn insert_sql(policy: ConflictPolicy) -> String {
    format!(
        "{} INTO products (id, name, price, category) VALUES (?1, ?2, ?3, ?4)",
        policy.insert_clause()
    )
}

/// Repository for product database operations.
///
/// Cloning is cheap; clones share the pool and the change notifier, so a
/// write through any clone wakes live queries created from any other.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// repo.insert(&Product::new(1, "Apples", 1.0, "fruit")).await?;
/// let all = repo.get_all().first().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    notifier: Arc<ChangeNotifier>,
    on_conflict: ConflictPolicy,
}

impl ProductRepository {
    /// Creates a new ProductRepository with its own change notifier.
    pub fn new(pool: SqlitePool, on_conflict: ConflictPolicy) -> Self {
        ProductRepository {
            pool,
            notifier: Arc::new(ChangeNotifier::new(TABLE)),
            on_conflict,
        }
    }

    /// The duplicate-key policy applied by [`insert`](Self::insert).
    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.on_conflict
    }

    /// Inserts a product.
    ///
    /// ## Returns
    /// * `Ok(1)` - Row written (inserted, or replaced under `Replace`)
    /// * `Ok(0)` - Duplicate key skipped under `Ignore`
    /// * `Err(DbError::ConstraintViolation)` - Duplicate key under `Reject`
    pub async fn insert(&self, product: &Product) -> DbResult<u64> {
        debug!(id = product.id, policy = %self.on_conflict, "Inserting product");

        let sql = insert_sql(self.on_conflict);
        let result = sqlx::query(&sql)
            .bind(product.id)
            .bind(&product.name)
            .bind(product.price)
            .bind(&product.category)
            .execute(&self.pool)
            .await?;

        Ok(self.changed(result.rows_affected()))
    }

    /// Replaces every non-key column of the product with the same id.
    ///
    /// A missing id affects zero rows and is not an error.
    pub async fn update(&self, product: &Product) -> DbResult<u64> {
        debug!(id = product.id, "Updating product");

        let result = sqlx::query(UPDATE)
            .bind(product.id)
            .bind(&product.name)
            .bind(product.price)
            .bind(&product.category)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            debug!(id = product.id, "Update matched no product");
        }

        Ok(self.changed(result.rows_affected()))
    }

    /// Deletes the product with the same id as `product`.
    ///
    /// Only the key is compared; a missing id is a no-op.
    pub async fn delete(&self, product: &Product) -> DbResult<u64> {
        self.delete_by_id(product.id).await
    }

    /// Deletes the product with `id`. A missing id is a no-op.
    pub async fn delete_by_id(&self, id: i64) -> DbResult<u64> {
        debug!(id, "Deleting product");

        let result = sqlx::query(DELETE).bind(id).execute(&self.pool).await?;

        Ok(self.changed(result.rows_affected()))
    }

    /// Live snapshot of all products, ordered by id ascending.
    pub fn get_all(&self) -> LiveQuery<Vec<Product>> {
        let pool = self.pool.clone();
        LiveQuery::new(TABLE, self.notifier.subscribe(), move || {
            let pool = pool.clone();
            async move { fetch_all(&pool).await }
        })
    }

    /// Live snapshot of the product with `id` (`None` while absent).
    pub fn get_by_id(&self, id: i64) -> LiveQuery<Option<Product>> {
        let pool = self.pool.clone();
        LiveQuery::new(TABLE, self.notifier.subscribe(), move || {
            let pool = pool.clone();
            async move { fetch_by_id(&pool, id).await }
        })
    }

    /// One-shot read of all products, ordered by id ascending.
    pub async fn fetch_all(&self) -> DbResult<Vec<Product>> {
        fetch_all(&self.pool).await
    }

    /// One-shot read of a single product.
    pub async fn fetch_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        fetch_by_id(&self.pool, id).await
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Wakes live queries after an external change to the table, such as a
    /// store being closed.
    pub(crate) fn notify_subscribers(&self) {
        self.notifier.notify();
    }

    fn changed(&self, rows: u64) -> u64 {
        if rows > 0 {
            self.notifier.notify();
        }
        rows
    }
}

async fn fetch_all(pool: &SqlitePool) -> DbResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(SELECT_ALL)
        .fetch_all(pool)
        .await?;
    Ok(products)
}

async fn fetch_by_id(pool: &SqlitePool, id: i64) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(SELECT_BY_ID)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(product)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::INVENTORY_MIGRATOR;
    use crate::pool::{connect, DbConfig};
    use futures_util::StreamExt;
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    async fn repo(policy: ConflictPolicy) -> ProductRepository {
        let pool = connect(&DbConfig::in_memory(policy), &INVENTORY_MIGRATOR, "inventory")
            .await
            .unwrap();
        ProductRepository::new(pool, policy)
    }

    fn apples() -> Product {
        Product::new(1, "Apples", 1.0, "fruit")
    }

    fn bananas() -> Product {
        Product::new(2, "Bananas", 0.50, "fruit")
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let repo = repo(ConflictPolicy::Reject).await;

        assert_eq!(repo.insert(&apples()).await.unwrap(), 1);

        assert_eq!(repo.fetch_all().await.unwrap(), vec![apples()]);
        assert_eq!(repo.fetch_by_id(1).await.unwrap(), Some(apples()));
        assert_eq!(repo.fetch_by_id(99).await.unwrap(), None);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let repo = repo(ConflictPolicy::Reject).await;
        repo.insert(&apples()).await.unwrap();

        let err = repo.insert(&apples().with_price(9.0)).await.unwrap_err();
        assert!(err.is_constraint_violation(), "got {err:?}");

        assert_eq!(repo.fetch_all().await.unwrap(), vec![apples()]);
    }

    #[tokio::test]
    async fn test_duplicate_replaced() {
        let repo = repo(ConflictPolicy::Replace).await;
        repo.insert(&apples()).await.unwrap();

        assert_eq!(repo.insert(&apples().with_price(9.0)).await.unwrap(), 1);
        assert_eq!(repo.fetch_all().await.unwrap(), vec![apples().with_price(9.0)]);
    }

    #[tokio::test]
    async fn test_duplicate_ignored() {
        let repo = repo(ConflictPolicy::Ignore).await;
        repo.insert(&apples()).await.unwrap();

        assert_eq!(repo.insert(&apples().with_price(9.0)).await.unwrap(), 0);
        assert_eq!(repo.fetch_all().await.unwrap(), vec![apples()]);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_are_noops() {
        let repo = repo(ConflictPolicy::Reject).await;

        assert_eq!(repo.update(&apples()).await.unwrap(), 0);
        assert_eq!(repo.delete(&apples()).await.unwrap(), 0);
        assert!(repo.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_matches_key_only() {
        let repo = repo(ConflictPolicy::Reject).await;
        repo.insert(&apples()).await.unwrap();

        // Stale field values, same key
        assert_eq!(repo.delete(&apples().with_price(42.0)).await.unwrap(), 1);
        assert!(repo.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_all_follows_changes() {
        let repo = repo(ConflictPolicy::Reject).await;
        let mut all = repo.get_all();

        assert!(all.first().await.unwrap().is_empty());

        repo.insert(&apples()).await.unwrap();
        let snapshot = timeout(WAIT, all.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(snapshot, vec![apples()]);

        repo.insert(&bananas()).await.unwrap();
        let snapshot = timeout(WAIT, all.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(snapshot, vec![apples(), bananas()]);
    }

    #[tokio::test]
    async fn test_noop_mutation_does_not_wake_subscribers() {
        let repo = repo(ConflictPolicy::Reject).await;
        let mut all = repo.get_all();
        all.first().await.unwrap();

        repo.update(&apples()).await.unwrap();
        repo.delete_by_id(7).await.unwrap();

        let pending = timeout(Duration::from_millis(50), all.next()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_get_by_id_tracks_one_row() {
        let repo = repo(ConflictPolicy::Reject).await;
        let mut one = repo.get_by_id(2);

        assert_eq!(one.first().await.unwrap(), None);

        repo.insert(&bananas()).await.unwrap();
        let snapshot = timeout(WAIT, one.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(snapshot, Some(bananas()));

        repo.delete(&bananas()).await.unwrap();
        let snapshot = timeout(WAIT, one.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(snapshot, None);
    }

    #[tokio::test]
    async fn test_clones_share_notifier() {
        let repo = repo(ConflictPolicy::Reject).await;
        let writer = repo.clone();
        let mut all = repo.get_all();
        all.first().await.unwrap();

        writer.insert(&apples()).await.unwrap();
        let snapshot = timeout(WAIT, all.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(snapshot, vec![apples()]);
    }

    #[test]
    fn test_insert_sql_follows_policy() {
        assert!(insert_sql(ConflictPolicy::Reject).starts_with("INSERT INTO products "));
        assert!(insert_sql(ConflictPolicy::Replace).starts_with("INSERT OR REPLACE INTO products "));
        assert!(insert_sql(ConflictPolicy::Ignore).starts_with("INSERT OR IGNORE INTO products "));
    }
}
