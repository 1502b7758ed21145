//! Command implementations.
//!
//! Every command reads and writes the same snapshots the storefront keeps
//! per visitor, here stored as JSON files under the state directory.
//! Commands return the text to print so they can be tested without a
//! terminal.

pub mod cart;
pub mod catalog;
pub mod favorites;

use std::path::PathBuf;

use thiserror::Error;
use tienda_core::{ContactError, Product, ProductId};
use tienda_storefront::backend::{BackendClient, BackendError};
use tienda_storefront::checkout::CheckoutError;
use tienda_storefront::leads::LeadQueue;
use tienda_storefront::storage::{FileStorage, StateStore, StorageError};
use tienda_storefront::variants::VariantError;

/// Errors a command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("State directory error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to read product export {path}: {source}")]
    ReadExport {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid product export: {0}")]
    Export(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("No product source: pass --products or set BACKEND_URL and BACKEND_ANON_KEY")]
    NoProductSource,

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error(transparent)]
    Variant(#[from] VariantError),

    #[error("Invalid contact: {0}")]
    Contact(#[from] ContactError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("No cart line with key {0}")]
    UnknownLine(String),

    #[error("Missing WhatsApp phone: pass --whatsapp-phone or set WHATSAPP_PHONE")]
    MissingPhone,
}

/// Where commands find products and keep state.
pub struct Context {
    storage: FileStorage,
    products: Option<PathBuf>,
    backend: Option<BackendClient>,
    leads: LeadQueue,
}

impl Context {
    /// `products` takes precedence over `backend` as the product source.
    /// Leads go to `leads`; pass [`LeadQueue::disabled`] to drop them.
    #[must_use]
    pub const fn new(
        storage: FileStorage,
        products: Option<PathBuf>,
        backend: Option<BackendClient>,
        leads: LeadQueue,
    ) -> Self {
        Self {
            storage,
            products,
            backend,
            leads,
        }
    }

    fn store(&self) -> StateStore<FileStorage> {
        StateStore::new(self.storage.clone())
    }

    fn leads(&self) -> LeadQueue {
        self.leads.clone()
    }

    /// Every product from the export file or, failing that, the backend.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::NoProductSource`] when neither is configured.
    pub async fn products(&self) -> Result<Vec<Product>, CliError> {
        if let Some(path) = &self.products {
            let raw = std::fs::read_to_string(path).map_err(|source| CliError::ReadExport {
                path: path.clone(),
                source,
            })?;
            return Ok(serde_json::from_str(&raw)?);
        }
        if let Some(backend) = &self.backend {
            return Ok(backend.list_products().await?);
        }
        Err(CliError::NoProductSource)
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::ProductNotFound`] if no product has `id`.
    pub async fn product(&self, id: &ProductId) -> Result<Product, CliError> {
        if self.products.is_none()
            && let Some(backend) = &self.backend
        {
            return backend.get_product(id).await.map_err(|e| match e {
                BackendError::NotFound(id) => CliError::ProductNotFound(id),
                other => other.into(),
            });
        }
        self.products()
            .await?
            .into_iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| CliError::ProductNotFound(id.clone()))
    }
}
