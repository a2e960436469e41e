//! In-memory storage backend for testing.

use crate::backend::{validate_document_name, StorageBackend};
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory storage backend.
///
/// This backend stores all documents in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral sessions that don't need persistence
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use dataport_storage::{StorageBackend, InMemoryBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.store("test", b"test data").unwrap();
/// assert_eq!(backend.names().unwrap(), vec!["test".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    documents: RwLock<BTreeMap<String, Vec<u8>>>,
    syncs: RwLock<u64>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with pre-existing documents.
    #[must_use]
    pub fn with_documents(documents: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
        Self {
            documents: RwLock::new(documents.into_iter().collect()),
            syncs: RwLock::new(0),
        }
    }

    /// Returns how many times `sync` has been called.
    #[must_use]
    pub fn sync_count(&self) -> u64 {
        *self.syncs.read()
    }

    /// Clears all documents from the backend.
    pub fn clear(&self) {
        self.documents.write().clear();
    }
}

impl StorageBackend for InMemoryBackend {
    fn load(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_document_name(name)?;
        Ok(self.documents.read().get(name).cloned())
    }

    fn store(&self, name: &str, data: &[u8]) -> StorageResult<()> {
        validate_document_name(name)?;
        self.documents.write().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn remove(&self, name: &str) -> StorageResult<bool> {
        validate_document_name(name)?;
        Ok(self.documents.write().remove(name).is_some())
    }

    fn names(&self) -> StorageResult<Vec<String>> {
        Ok(self.documents.read().keys().cloned().collect())
    }

    fn sync(&self) -> StorageResult<()> {
        // Nothing to make durable; counted so tests can observe it.
        *self.syncs.write() += 1;
        Ok(())
    }
}
