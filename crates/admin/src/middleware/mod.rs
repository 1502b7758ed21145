//! HTTP middleware for admin.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (added by the binary)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (in-memory tower-sessions store)
//! 4. [`RequireAdmin`] extractor on every product route

pub mod auth;
pub mod session;

pub use auth::{CurrentAdmin, RequireAdmin, clear_current_admin, set_current_admin};
pub use session::create_session_layer;
