//! # Database Containers
//!
//! One container per store. Each owns its SQLite pool and exposes one
//! repository.
//!
//! ```text
//! ┌──────────────────────────────┐     ┌──────────────────────────────┐
//! │      InventoryDatabase       │     │        CartDatabase          │
//! │  file: inventory_database    │     │  file: cart_database         │
//! │  table: products             │     │  table: cart                 │
//! │  products() → ProductRepo    │     │  cart_items() → CartRepo     │
//! └──────────────┬───────────────┘     └──────────────┬───────────────┘
//!                │                                    │
//!        Registry<InventoryDatabase>          Registry<CartDatabase>
//!        (process-wide, construct-once)       (process-wide, construct-once)
//! ```
//!
//! The two stores are independent: no ordering guarantee exists between a
//! product write and a cart write.

pub mod cart;
pub mod inventory;
