//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::BackendClient;
use crate::config::StorefrontConfig;
use crate::leads::LeadQueue;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: BackendClient,
    leads: LeadQueue,
}

impl AppState {
    /// Create a new application state.
    ///
    /// `leads` is usually the queue returned by
    /// [`spawn_lead_worker`](crate::leads::spawn_lead_worker) for `backend`.
    #[must_use]
    pub fn new(config: StorefrontConfig, backend: BackendClient, leads: LeadQueue) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                leads,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get the lead queue handle.
    #[must_use]
    pub fn leads(&self) -> &LeadQueue {
        &self.inner.leads
    }
}
