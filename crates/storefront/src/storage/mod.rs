//! Persistent client state.
//!
//! A shopper's cart and favorites survive between visits as two
//! independently keyed JSON snapshots. [`ClientStorage`] is the durable
//! key/value backend; [`StateStore`] is the serialization boundary on top of
//! it and holds no business logic.
//!
//! Snapshots carry no version field. Anything that does not parse as the
//! current shape is treated as absent rather than failing the caller.

mod file;
mod memory;
mod session;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use session::SessionStorage;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Storage key for the cart snapshot.
pub const CART_KEY: &str = "tienda.cart";

/// Storage key for the favorites snapshot (items plus optional contact).
pub const FAVORITES_KEY: &str = "tienda.favorites";

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the underlying medium failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The key cannot be used by this backend.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Synchronous string key/value storage.
///
/// Writes are expected to be durable when they return, so a crash between a
/// mutation and its write is the only window in which state is lost.
pub trait ClientStorage {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn write(&mut self, key: &str, value: String) -> Result<(), StorageError>;

    /// Delete the value stored under `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Loads and saves typed snapshots through a [`ClientStorage`].
#[derive(Debug, Clone, Default)]
pub struct StateStore<S> {
    storage: S,
}

impl<S: ClientStorage> StateStore<S> {
    /// Wrap a storage backend.
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load the snapshot under `key`.
    ///
    /// Missing, unreadable and old-shape snapshots all come back as
    /// `T::default()`.
    pub fn load<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let raw = match self.storage.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read stored state, starting empty");
                return T::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "Discarding unreadable stored state");
            T::default()
        })
    }

    /// Write `value` as the full snapshot under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn save<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.storage.write(key, raw)
    }

    /// Borrow the underlying storage.
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Give back the underlying storage, e.g. to flush it.
    pub fn into_storage(self) -> S {
        self.storage
    }
}
