//! # pantry-db: Database Layer for Pantry
//!
//! This crate provides the two Pantry stores (inventory and cart). It uses
//! SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pantry Data Flow                                 │
//! │                                                                         │
//! │  Caller: InventoryDatabase::get_database(&ctx)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     pantry-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────────┐  ┌───────────────┐  ┌────────────────────┐   │   │
//! │  │   │  Registry   │  │  Repositories │  │    Live queries    │   │   │
//! │  │   │ (registry)  │  │ (repository)  │  │      (live)        │   │   │
//! │  │   │             │  │               │  │                    │   │   │
//! │  │   │ one Arc per │─►│ ProductRepo   │─►│ watch counter per  │   │   │
//! │  │   │ store type  │  │ CartRepo      │  │ table → snapshots  │   │   │
//! │  │   └─────────────┘  └───────────────┘  └────────────────────┘   │   │
//! │  │          │                 │                                    │   │
//! │  │          ▼                 ▼                                    │   │
//! │  │   ┌─────────────┐  ┌───────────────┐                           │   │
//! │  │   │    pool     │  │  migrations   │                           │   │
//! │  │   │ SqlitePool  │  │  (embedded)   │                           │   │
//! │  │   └─────────────┘  └───────────────┘                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  <data_dir>/inventory_database     <data_dir>/cart_database            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`config`] - Storage settings files
//! - [`context`] - Data directory and conflict policy for the stores
//! - [`live`] - Reactive query streams
//! - [`repository`] - Data-access interfaces (product, cart)
//! - [`database`] - Store containers
//! - [`registry`] - Process-wide construct-once ownership
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pantry_core::{ConflictPolicy, Product};
//! use pantry_db::{AppContext, InventoryDatabase};
//!
//! let ctx = AppContext::default_location(ConflictPolicy::Reject)?;
//! let db = InventoryDatabase::get_database(&ctx).await?;
//!
//! db.products().insert(&Product::new(1, "Apples", 1.0, "fruit")).await?;
//!
//! let mut products = db.products().get_all();
//! let snapshot = products.first().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod context;
pub mod database;
pub mod error;
pub mod live;
pub mod migrations;
pub mod pool;
pub mod registry;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::StorageSettings;
pub use context::AppContext;
pub use database::cart::CartDatabase;
pub use database::inventory::InventoryDatabase;
pub use error::{DbError, DbResult};
pub use live::LiveQuery;
pub use pool::{DbConfig, StorageLocation};
pub use registry::{Registry, RegistryState, Store};

// Repository re-exports for convenience
pub use repository::cart::CartRepository;
pub use repository::product::ProductRepository;
