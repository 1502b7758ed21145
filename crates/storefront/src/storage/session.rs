//! Storage backed by the visitor's HTTP session.

use std::collections::{HashMap, HashSet};

use tower_sessions::Session;

use super::{ClientStorage, StorageError};

/// A [`ClientStorage`] over a `tower_sessions::Session`.
///
/// Session access is async while [`ClientStorage`] is not, so the requested
/// keys are read up front with [`load`](Self::load), mutated synchronously,
/// and written back with [`flush`](Self::flush) before the response leaves.
#[derive(Debug, Clone)]
pub struct SessionStorage {
    session: Session,
    entries: HashMap<String, String>,
    dirty: HashSet<String>,
    removed: HashSet<String>,
}

impl SessionStorage {
    /// Read `keys` from the session.
    ///
    /// A value that cannot be read is treated as absent.
    pub async fn load(session: Session, keys: &[&str]) -> Self {
        let mut entries = HashMap::new();
        for key in keys {
            match session.get::<String>(key).await {
                Ok(Some(value)) => {
                    entries.insert((*key).to_owned(), value);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(key, error = %e, "Failed to read session state");
                }
            }
        }

        Self {
            session,
            entries,
            dirty: HashSet::new(),
            removed: HashSet::new(),
        }
    }

    /// Write every changed key back to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects a write.
    pub async fn flush(self) -> Result<(), tower_sessions::session::Error> {
        for key in &self.removed {
            self.session.remove_value(key).await?;
        }
        for key in &self.dirty {
            if let Some(value) = self.entries.get(key) {
                self.session.insert(key, value).await?;
            }
        }
        Ok(())
    }
}

impl ClientStorage for SessionStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.removed.remove(key);
        self.dirty.insert(key.to_owned());
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.dirty.remove(key);
        self.entries.remove(key);
        self.removed.insert(key.to_owned());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_flush_writes_back_to_session() {
        let session = session();
        let mut storage = SessionStorage::load(session.clone(), &["tienda.cart"]).await;
        assert_eq!(storage.read("tienda.cart").unwrap(), None);

        storage.write("tienda.cart", "[1]".to_string()).unwrap();
        storage.flush().await.unwrap();

        let stored: Option<String> = session.get("tienda.cart").await.unwrap();
        assert_eq!(stored.as_deref(), Some("[1]"));
    }

    #[tokio::test]
    async fn test_load_sees_previous_flush() {
        let session = session();
        session.insert("tienda.favorites", "{}").await.unwrap();

        let storage = SessionStorage::load(session, &["tienda.favorites"]).await;
        assert_eq!(
            storage.read("tienda.favorites").unwrap().as_deref(),
            Some("{}")
        );
    }

    #[tokio::test]
    async fn test_remove_deletes_from_session() {
        let session = session();
        session.insert("tienda.cart", "[]").await.unwrap();

        let mut storage = SessionStorage::load(session.clone(), &["tienda.cart"]).await;
        storage.remove("tienda.cart").unwrap();
        storage.flush().await.unwrap();

        let stored: Option<String> = session.get("tienda.cart").await.unwrap();
        assert_eq!(stored, None);
    }
}
