//! Storage backend trait definition.

use crate::error::{StorageError, StorageResult};

/// A named-document storage backend.
///
/// Storage backends are **opaque document stores**. Each document is a byte
/// payload addressed by a short name (one per entity collection). Dataport
/// owns all payload interpretation - backends never decode what they store.
///
/// # Invariants
///
/// - `load` returns exactly the bytes of the last successful `store`
/// - `store` replaces the whole document atomically
/// - `sync` makes every stored document durable
/// - Document names are validated with [`validate_document_name`]
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Loads the document with the given name.
    ///
    /// Returns `None` if the document has never been stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or an I/O error occurs.
    fn load(&self, name: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Stores (creates or replaces) the document with the given name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or an I/O error occurs.
    fn store(&self, name: &str, data: &[u8]) -> StorageResult<()>;

    /// Removes the document with the given name.
    ///
    /// Returns `true` if a document was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or an I/O error occurs.
    fn remove(&self, name: &str) -> StorageResult<bool>;

    /// Returns the names of all stored documents, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be listed.
    fn names(&self) -> StorageResult<Vec<String>>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&self) -> StorageResult<()>;
}

/// Checks that a document name is non-empty and made only of ASCII
/// letters, digits, `_` and `-`.
///
/// # Errors
///
/// Returns [`StorageError::InvalidName`] otherwise.
pub fn validate_document_name(name: &str) -> StorageResult<()> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}
