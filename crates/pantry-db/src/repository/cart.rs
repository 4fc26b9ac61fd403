//! # Cart Repository
//!
//! Data-access interface for the `cart` table. Same contract as
//! [`ProductRepository`](super::product::ProductRepository), plus cart-wide
//! helpers (`clear`, `total`).

use std::sync::Arc;

use pantry_core::{Cart, ConflictPolicy};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use crate::live::{ChangeNotifier, LiveQuery};

const TABLE: &str = "cart";

const SELECT_ALL: &str = "SELECT id, name, price, category, quantity FROM cart ORDER BY id ASC";

const SELECT_BY_ID: &str = "SELECT id, name, price, category, quantity FROM cart WHERE id = ?1";

const UPDATE: &str =
    "UPDATE cart SET name = ?2, price = ?3, category = ?4, quantity = ?5 WHERE id = ?1";

const DELETE: &str = "DELETE FROM cart WHERE id = ?1";

fn insert_sql(policy: ConflictPolicy) -> String {
    format!(
        "{} INTO cart (id, name, price, category, quantity) VALUES (?1, ?2, ?3, ?4, ?5)",
        policy.insert_clause()
    )
}

/// Repository for cart line items.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
    notifier: Arc<ChangeNotifier>,
    on_conflict: ConflictPolicy,
}

impl CartRepository {
    /// Creates a new CartRepository with its own change notifier.
    pub fn new(pool: SqlitePool, on_conflict: ConflictPolicy) -> Self {
        CartRepository {
            pool,
            notifier: Arc::new(ChangeNotifier::new(TABLE)),
            on_conflict,
        }
    }

    /// The duplicate-key policy applied by [`insert`](Self::insert).
    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.on_conflict
    }

    /// Inserts a cart line. Duplicate keys follow the configured policy.
    pub async fn insert(&self, item: &Cart) -> DbResult<u64> {
        debug!(id = item.id, quantity = item.quantity, policy = %self.on_conflict, "Inserting cart item");

        let sql = insert_sql(self.on_conflict);
        let result = sqlx::query(&sql)
            .bind(item.id)
            .bind(&item.name)
            .bind(item.price)
            .bind(&item.category)
            .bind(item.quantity)
            .execute(&self.pool)
            .await?;

        Ok(self.changed(result.rows_affected()))
    }

    /// Replaces every non-key column of the line with the same id.
    /// Zero rows affected when absent.
    pub async fn update(&self, item: &Cart) -> DbResult<u64> {
        debug!(id = item.id, quantity = item.quantity, "Updating cart item");

        let result = sqlx::query(UPDATE)
            .bind(item.id)
            .bind(&item.name)
            .bind(item.price)
            .bind(&item.category)
            .bind(item.quantity)
            .execute(&self.pool)
            .await?;

        Ok(self.changed(result.rows_affected()))
    }

    /// Deletes the line with the same id as `item`. No-op if absent.
    pub async fn delete(&self, item: &Cart) -> DbResult<u64> {
        self.delete_by_id(item.id).await
    }

    /// Deletes the line with `id`. No-op if absent.
    pub async fn delete_by_id(&self, id: i64) -> DbResult<u64> {
        debug!(id, "Deleting cart item");

        let result = sqlx::query(DELETE).bind(id).execute(&self.pool).await?;

        Ok(self.changed(result.rows_affected()))
    }

    /// Removes every line from the cart.
    pub async fn clear(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM cart").execute(&self.pool).await?;

        info!(removed = result.rows_affected(), "Cart cleared");
        Ok(self.changed(result.rows_affected()))
    }

    /// Live snapshot of all cart lines, ordered by id ascending.
    pub fn get_all(&self) -> LiveQuery<Vec<Cart>> {
        let pool = self.pool.clone();
        LiveQuery::new(TABLE, self.notifier.subscribe(), move || {
            let pool = pool.clone();
            async move { fetch_all(&pool).await }
        })
    }

    /// Live snapshot of the line with `id` (`None` while absent).
    pub fn get_by_id(&self, id: i64) -> LiveQuery<Option<Cart>> {
        let pool = self.pool.clone();
        LiveQuery::new(TABLE, self.notifier.subscribe(), move || {
            let pool = pool.clone();
            async move { fetch_by_id(&pool, id).await }
        })
    }

    /// One-shot read of all lines, ordered by id ascending.
    pub async fn fetch_all(&self) -> DbResult<Vec<Cart>> {
        fetch_all(&self.pool).await
    }

    /// One-shot read of a single line.
    pub async fn fetch_by_id(&self, id: i64) -> DbResult<Option<Cart>> {
        fetch_by_id(&self.pool, id).await
    }

    /// Number of lines in the cart.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Sum of `price * quantity` over all lines. 0.0 for an empty cart.
    pub async fn total(&self) -> DbResult<f64> {
        let total: f64 =
            sqlx::query_scalar("SELECT CAST(COALESCE(SUM(price * quantity), 0) AS REAL) FROM cart")
                .fetch_one(&self.pool)
                .await?;

        Ok(total)
    }

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

async fn fetch_all(pool: &SqlitePool) -> DbResult<Vec<Cart>> {
    let items = sqlx::query_as::<_, Cart>(SELECT_ALL)
        .fetch_all(pool)
        .await?;
    Ok(items)
}

async fn fetch_by_id(pool: &SqlitePool, id: i64) -> DbResult<Option<Cart>> {
    let item = sqlx::query_as::<_, Cart>(SELECT_BY_ID)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(item)
}
