//! # Domain Types
//!
//! Records persisted by the Pantry stores.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Cart       │   │ ConflictPolicy  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64, PK)   │   │  id (i64, PK)   │   │  Reject         │       │
//! │  │  name           │   │  name           │   │  Replace        │       │
//! │  │  price (f64)    │   │  price (f64)    │   │  Ignore         │       │
//! │  │  category       │   │  category       │   └─────────────────┘       │
//! │  └─────────────────┘   │  quantity       │                             │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Primary keys are assigned by the caller. The stores never generate ids.
//! Equality is structural: two records are equal when every field is equal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// =============================================================================
// Product
// =============================================================================

/// An inventory item (fruit, vegetable, ...) held by the inventory store.
///
/// Maps to the `products` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Caller-assigned primary key.
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Unit price. Expected to be non-negative.
    pub price: f64,

    /// Free-form tag, e.g. "fruit".
    pub category: String,
}

impl Product {
    /// Creates a product record.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        price: f64,
        category: impl Into<String>,
    ) -> Self {
        Product {
            id,
            name: name.into(),
            price,
            category: category.into(),
        }
    }

    /// Returns a copy of this product with a different price.
    pub fn with_price(&self, price: f64) -> Self {
        Product {
            price,
            ..self.clone()
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A line item in the shopping cart, held by the cart store.
///
/// Mirrors [`Product`] and adds a quantity. Maps to the `cart` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Cart {
    /// Caller-assigned primary key.
    pub id: i64,

    /// Display name of the item.
    pub name: String,

    /// Unit price at the time the item was added.
    pub price: f64,

    /// Free-form tag, e.g. "vegetable".
    pub category: String,

    /// Number of units.
    pub quantity: i64,
}

impl Cart {
    /// Creates a cart line item.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        price: f64,
        category: impl Into<String>,
        quantity: i64,
    ) -> Self {
        Cart {
            id,
            name: name.into(),
            price,
            category: category.into(),
            quantity,
        }
    }

    /// Creates a cart line from a product, reusing the product id as the key.
    ///
    /// The price is frozen at this moment; later product updates do not
    /// change the cart line.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        Cart {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            category: product.category.clone(),
            quantity,
        }
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

// =============================================================================
// Conflict Policy
// =============================================================================

/// What `insert` does when a row with the same primary key already exists.
///
/// There is deliberately no `Default`: every store is opened with an
/// explicitly chosen policy.
///
/// ```text
/// reject  → INSERT             (duplicate key is a constraint violation)
/// replace → INSERT OR REPLACE  (existing row is overwritten)
/// ignore  → INSERT OR IGNORE   (existing row is kept, 0 rows affected)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Fail the insert with a constraint violation.
    Reject,
    /// Overwrite the existing row.
    Replace,
    /// Keep the existing row and report zero rows affected.
    Ignore,
}

impl ConflictPolicy {
    /// The SQL statement prefix implementing this policy.
    pub const fn insert_clause(&self) -> &'static str {
        match self {
            ConflictPolicy::Reject => "INSERT",
            ConflictPolicy::Replace => "INSERT OR REPLACE",
            ConflictPolicy::Ignore => "INSERT OR IGNORE",
        }
    }

    /// The lowercase configuration name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::Reject => "reject",
            ConflictPolicy::Replace => "replace",
            ConflictPolicy::Ignore => "ignore",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" | "abort" => Ok(ConflictPolicy::Reject),
            "replace" => Ok(ConflictPolicy::Replace),
            "ignore" => Ok(ConflictPolicy::Ignore),
            _ => Err(ValidationError::NotAllowed {
                field: "on_conflict".to_string(),
                allowed: vec![
                    "reject".to_string(),
                    "replace".to_string(),
                    "ignore".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
