//! Tienda Admin library.
//!
//! Product management for the shop: sign-in, product CRUD with image
//! upload, and price-drop emails to the leads who favorited a product.
//!
//! # Security
//!
//! This crate holds the backend service key. Only deploy it where shoppers
//! cannot reach it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod middleware;
pub mod notifications;
pub mod products;
pub mod routes;
pub mod state;
