//! # Repository Module
//!
//! Data-access interfaces for the Pantry stores.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │                                                                 │
//! │       │  db.products().insert(&apples)                                 │
//! │       ▼                                                                 │
//! │  ProductRepository / CartRepository                                    │
//! │  ├── insert(&self, record)      → rows affected                        │
//! │  ├── update(&self, record)      → rows affected (0 = no-op)            │
//! │  ├── delete(&self, record)      → rows affected (0 = no-op)            │
//! │  ├── get_all(&self)             → LiveQuery<Vec<T>>                    │
//! │  └── get_by_id(&self, id)       → LiveQuery<Option<T>>                 │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - `products` table
//! - [`CartRepository`](cart::CartRepository) - `cart` table

pub mod cart;
pub mod product;
