//! Tienda Core - Shared domain types.
//!
//! This crate provides the types used across all Tienda components:
//! - `storefront` - Public catalog, cart, favorites and WhatsApp checkout
//! - `admin` - Product management and price-drop notifications
//! - `cli` - Terminal shopper and catalog tooling
//!
//! # Architecture
//!
//! The core crate contains only types and pure normalization logic - no I/O,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, and contact details
//! - [`product`] - Product records as served by the backend, normalized once on ingestion

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod product;
pub mod types;

pub use product::{ColorGallery, Product, ProductRecord, SizeOption};
pub use types::*;
