//! # pantry-core: Entity Types for Pantry
//!
//! This crate holds the records stored by the Pantry inventory and cart
//! stores, plus the application-level rules that the database schema does
//! not enforce. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pantry Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Callers (UI, services, tools)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pantry-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────────┐  ┌────────────┐            │   │
//! │  │   │   types   │  │ ConflictPolicy │  │ validation │            │   │
//! │  │   │  Product  │  │ reject/replace │  │   rules    │            │   │
//! │  │   │   Cart    │  │    /ignore     │  │   checks   │            │   │
//! │  │   └───────────┘  └────────────────┘  └────────────┘            │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • PURE FUNCTIONS                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    pantry-db (Database Layer)                   │   │
//! │  │        SQLite stores, live queries, singleton registry          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Stored records (Product, Cart) and the insert conflict policy
//! - [`error`] - Validation error types
//! - [`validation`] - Application-level field checks
//!
//! ## Example Usage
//!
//! ```rust
//! use pantry_core::{ConflictPolicy, Product};
//!
//! let apples = Product::new(1, "Apples", 1.0, "fruit");
//! assert!(pantry_core::validation::validate_product(&apples).is_ok());
//!
//! let policy: ConflictPolicy = "replace".parse().unwrap();
//! assert_eq!(policy, ConflictPolicy::Replace);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of a product or cart item name.
pub const MAX_NAME_LEN: usize = 200;
