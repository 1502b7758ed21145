//! Core types for Tienda.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod contact;
pub mod id;
pub mod price;

pub use contact::{ContactError, Email, Phone};
pub use id::*;
pub use price::Price;
