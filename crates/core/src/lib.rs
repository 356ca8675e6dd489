//! ShopEase Core - Shared types library.
//!
//! This crate provides common types used across all ShopEase components:
//! - `client` - Storefront API client, store slices, and checkout coordinator
//! - `cli` - Terminal front-end for browsing, cart, checkout, and admin
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async runtime. This keeps it lightweight and allows it to be
//! used anywhere (including the fake backend in the integration tests).
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and statuses
//! - [`models`] - Wire models for products, carts, orders, and payments
//! - [`pricing`] - Advisory tax/shipping/total computation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod pricing;
pub mod types;

pub use models::*;
pub use pricing::PriceBreakdown;
pub use types::*;
