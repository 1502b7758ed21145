//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::AdminBackend;
use crate::config::AdminConfig;
use crate::notifications::EmailService;

/// Application state shared across all handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    backend: AdminBackend,
    email: Option<EmailService>,
}

impl AppState {
    /// Create a new application state. Without `email`, price-drop
    /// notifications are skipped.
    #[must_use]
    pub fn new(config: AdminConfig, backend: AdminBackend, email: Option<EmailService>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                email,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn backend(&self) -> &AdminBackend {
        &self.inner.backend
    }

    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }
}
