//! Tienda storefront library.
//!
//! Client-side shopping state (cart, favorites, contact) over a pluggable
//! [`storage::ClientStorage`], the catalog filter and variant resolver, the
//! backend REST client, and the axum JSON API that ties them together.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod favorites;
pub mod leads;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod storage;
pub mod variants;
