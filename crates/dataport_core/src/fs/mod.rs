//! File-system provider.
//!
//! A [`FileSession`] stages whole collections in memory on first access.
//! Repository writes mark a collection dirty; persisting encodes dirty
//! collections as CBOR documents in the storage backend, and discarding
//! drops staged state so the next read reloads from storage.
//!
//! Persisting is all-or-nothing across documents: if any store or the
//! final sync fails, documents already written are put back to the bytes
//! they were staged from and every collection stays dirty.

mod store;

pub use store::FileStore;

use crate::config::SessionConfig;
use crate::entity::Entity;
use crate::error::{short_type_name, CoreError, CoreResult};
use crate::provider::{FileSystem, ProviderId};
use crate::session::{OpenSession, SessionBackend};
use dataport_storage::{codec, validate_document_name, FileBackend, InMemoryBackend, StorageBackend};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

type Rows = Box<dyn Any + Send + Sync>;
type Encoder = fn(&Rows) -> CoreResult<Vec<u8>>;

fn encode_rows<T: Entity + Serialize>(rows: &Rows) -> CoreResult<Vec<u8>> {
    let rows = rows
        .downcast_ref::<Vec<T>>()
        .ok_or_else(|| CoreError::type_mismatch(short_type_name::<T>(), "staged collection"))?;
    Ok(codec::encode(rows)?)
}

struct Staged {
    rows: Rows,
    entity: &'static str,
    dirty: bool,
    encode: Encoder,
    /// Last document bytes known to be in storage.
    stored: Option<Vec<u8>>,
}

impl Staged {
    fn new<T: Entity + Serialize>(rows: Vec<T>, stored: Option<Vec<u8>>) -> Self {
        Self {
            rows: Box::new(rows),
            entity: short_type_name::<T>(),
            dirty: false,
            encode: encode_rows::<T>,
            stored,
        }
    }

    fn rows<T: Entity>(&self) -> CoreResult<&Vec<T>> {
        self.rows
            .downcast_ref::<Vec<T>>()
            .ok_or_else(|| CoreError::type_mismatch(short_type_name::<T>(), self.entity))
    }

    fn rows_mut<T: Entity>(&mut self) -> CoreResult<&mut Vec<T>> {
        let entity = self.entity;
        self.rows
            .downcast_mut::<Vec<T>>()
            .ok_or_else(|| CoreError::type_mismatch(short_type_name::<T>(), entity))
    }
}

/// Session backend for the file-system provider.
///
/// Each collection is one document named after its collection key.
pub struct FileSession {
    storage: Arc<dyn StorageBackend>,
    sync_on_commit: bool,
    staged: Mutex<HashMap<String, Staged>>,
}

impl FileSession {
    /// Creates a backend over an explicit storage backend.
    #[must_use]
    pub fn with_storage(storage: Arc<dyn StorageBackend>, sync_on_commit: bool) -> Self {
        Self {
            storage,
            sync_on_commit,
            staged: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a backend over a fresh [`InMemoryBackend`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_storage(Arc::new(InMemoryBackend::new()), true)
    }

    /// Returns the storage backend.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    /// Runs `f` over a collection, staging it from storage if needed.
    ///
    /// # Errors
    ///
    /// Returns `Argument` for an invalid collection name, a storage error
    /// if the document cannot be loaded or decoded, or `TypeMismatch` if
    /// the collection is staged with another entity type.
    pub fn read<T, R, F>(&self, name: &str, f: F) -> CoreResult<R>
    where
        T: Entity + Serialize + DeserializeOwned,
        F: FnOnce(&[T]) -> R,
    {
        let mut staged = self.staged.lock();
        let entry = self.stage::<T>(&mut staged, name)?;
        Ok(f(entry.rows::<T>()?.as_slice()))
    }

    /// Runs `f` over a mutable collection and marks it dirty on success.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read), plus the error returned by `f`.
    pub fn write<T, R, F>(&self, name: &str, f: F) -> CoreResult<R>
    where
        T: Entity + Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> CoreResult<R>,
    {
        let mut staged = self.staged.lock();
        let entry = self.stage::<T>(&mut staged, name)?;
        let result = f(entry.rows_mut::<T>()?)?;
        entry.dirty = true;
        Ok(result)
    }

    /// Returns the names of collections with unpersisted writes, sorted.
    #[must_use]
    pub fn dirty_collections(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .staged
            .lock()
            .iter()
            .filter(|(_, entry)| entry.dirty)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn stage<'a, T>(
        &self,
        staged: &'a mut HashMap<String, Staged>,
        name: &str,
    ) -> CoreResult<&'a mut Staged>
    where
        T: Entity + Serialize + DeserializeOwned,
    {
        validate_document_name(name)?;
        match staged.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let stored = self.storage.load(name)?;
                let rows: Vec<T> = match &stored {
                    Some(bytes) => codec::decode(bytes)?,
                    None => Vec::new(),
                };
                trace!(collection = name, rows = rows.len(), "collection staged");
                Ok(entry.insert(Staged::new(rows, stored)))
            }
        }
    }

    /// Puts `written` documents back to their staged-from bytes.
    fn restore(&self, staged: &HashMap<String, Staged>, written: &[(String, Vec<u8>)]) {
        for (name, _) in written {
            let result = match staged.get(name).and_then(|entry| entry.stored.as_deref()) {
                Some(bytes) => self.storage.store(name, bytes),
                None => self.storage.remove(name).map(|_| ()),
            };
            if let Err(err) = result {
                warn!(collection = %name, error = %err, "restoring document after failed persist failed");
            }
        }
    }
}

impl SessionBackend for FileSession {
    fn provider(&self) -> ProviderId {
        ProviderId::of::<FileSystem>()
    }

    fn persist(&self) -> CoreResult<()> {
        let mut staged = self.staged.lock();
        let mut pending = staged
            .iter()
            .filter(|(_, entry)| entry.dirty)
            .map(|(name, entry)| Ok((name.clone(), (entry.encode)(&entry.rows)?)))
            .collect::<CoreResult<Vec<_>>>()?;
        if pending.is_empty() {
            return Ok(());
        }
        pending.sort_by(|a, b| a.0.cmp(&b.0));

        for (index, (name, bytes)) in pending.iter().enumerate() {
            if let Err(err) = self.storage.store(name, bytes) {
                self.restore(&staged, &pending[..index]);
                return Err(err.into());
            }
        }
        if self.sync_on_commit {
            if let Err(err) = self.storage.sync() {
                self.restore(&staged, &pending);
                return Err(err.into());
            }
        }

        let written = pending.len();
        for (name, bytes) in pending {
            if let Some(entry) = staged.get_mut(&name) {
                entry.dirty = false;
                entry.stored = Some(bytes);
            }
        }
        debug!(collections = written, "file session persisted");
        Ok(())
    }

    fn discard(&self) -> CoreResult<()> {
        let mut staged = self.staged.lock();
        let dropped = staged.len();
        staged.clear();
        trace!(collections = dropped, "file session discarded staged state");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl OpenSession for FileSession {
    /// Opens a [`FileBackend`] rooted at `data_dir`.
    fn open(config: &SessionConfig) -> CoreResult<Self> {
        let dir = config
            .data_dir_path()
            .ok_or_else(|| CoreError::state("data_dir is not configured"))?;
        let backend = FileBackend::open(dir)?;
        Ok(Self::with_storage(Arc::new(backend), config.sync_on_commit))
    }
}

impl fmt::Debug for FileSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSession")
            .field("sync_on_commit", &self.sync_on_commit)
            .field("dirty", &self.dirty_collections())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use dataport_storage::{StorageError, StorageResult};
    use serde::Deserialize;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory storage whose `n`th store (1-based) fails.
    struct FailingStore {
        inner: InMemoryBackend,
        fail_on: usize,
        stores: AtomicUsize,
        fail_sync: bool,
    }

    impl FailingStore {
        fn new(inner: InMemoryBackend, fail_on: usize) -> Self {
            Self {
                inner,
                fail_on,
                stores: AtomicUsize::new(0),
                fail_sync: false,
            }
        }
    }

    impl StorageBackend for FailingStore {
        fn load(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
            self.inner.load(name)
        }

        fn store(&self, name: &str, data: &[u8]) -> StorageResult<()> {
            if self.stores.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
                return Err(StorageError::Io(io::Error::new(io::ErrorKind::Other, "disk full")));
            }
            self.inner.store(name, data)
        }

        fn remove(&self, name: &str) -> StorageResult<bool> {
            self.inner.remove(name)
        }

        fn names(&self) -> StorageResult<Vec<String>> {
            self.inner.names()
        }

        fn sync(&self) -> StorageResult<()> {
            if self.fail_sync {
                return Err(StorageError::Io(io::Error::new(io::ErrorKind::Other, "sync failed")));
            }
            self.inner.sync()
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: u32,
        text: String,
    }

    impl Entity for Note {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }

        fn set_id(&mut self, id: u32) {
            self.id = id;
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Other {
        id: u32,
    }

    impl Entity for Other {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }

        fn set_id(&mut self, id: u32) {
            self.id = id;
        }
    }

    fn note(id: u32, text: &str) -> Note {
        Note {
            id,
            text: text.to_string(),
        }
    }

    fn session() -> (FileSession, Arc<InMemoryBackend>) {
        let storage = Arc::new(InMemoryBackend::new());
        let session = FileSession::with_storage(Arc::clone(&storage) as Arc<dyn StorageBackend>, true);
        (session, storage)
    }

    #[test]
    fn missing_document_reads_empty() {
        let (session, _) = session();
        let len = session.read("notes", |rows: &[Note]| rows.len()).unwrap();
        assert_eq!(len, 0);
    }

    #[test]
    fn writes_stay_staged_until_persist() {
        let (session, storage) = session();
        session
            .write("notes", |rows: &mut Vec<Note>| {
                rows.push(note(1, "a"));
                Ok(())
            })
            .unwrap();

        assert_eq!(session.dirty_collections(), vec!["notes"]);
        assert_eq!(storage.load("notes").unwrap(), None);

        session.persist().unwrap();

        assert!(session.dirty_collections().is_empty());
        let stored: Vec<Note> = codec::decode(&storage.load("notes").unwrap().unwrap()).unwrap();
        assert_eq!(stored, vec![note(1, "a")]);
        assert_eq!(storage.sync_count(), 1);
    }

    #[test]
    fn persist_without_changes_does_not_sync() {
        let (session, storage) = session();
        session.read("notes", |rows: &[Note]| rows.len()).unwrap();
        session.persist().unwrap();
        assert_eq!(storage.sync_count(), 0);
    }

    #[test]
    fn sync_can_be_disabled() {
        let storage = Arc::new(InMemoryBackend::new());
        let session = FileSession::with_storage(Arc::clone(&storage) as Arc<dyn StorageBackend>, false);
        session
            .write("notes", |rows: &mut Vec<Note>| {
                rows.push(note(1, "a"));
                Ok(())
            })
            .unwrap();
        session.persist().unwrap();
        assert!(storage.load("notes").unwrap().is_some());
        assert_eq!(storage.sync_count(), 0);
    }

    #[test]
    fn discard_reloads_from_storage() {
        let (session, _) = session();
        session
            .write("notes", |rows: &mut Vec<Note>| {
                rows.push(note(1, "kept"));
                Ok(())
            })
            .unwrap();
        session.persist().unwrap();

        session
            .write("notes", |rows: &mut Vec<Note>| {
                rows.push(note(2, "dropped"));
                Ok(())
            })
            .unwrap();
        session.discard().unwrap();

        let texts = session
            .read("notes", |rows: &[Note]| rows.iter().map(|n| n.text.clone()).collect::<Vec<_>>())
            .unwrap();
        assert_eq!(texts, vec!["kept"]);
    }

    #[test]
    fn failed_write_does_not_mark_dirty() {
        let (session, _) = session();
        let result = session.write("notes", |_rows: &mut Vec<Note>| -> CoreResult<()> {
            Err(CoreError::state("rejected"))
        });
        assert!(result.is_err());
        assert!(session.dirty_collections().is_empty());
    }

    #[test]
    fn invalid_collection_name_is_an_argument_error() {
        let (session, _) = session();
        let err = session.read("../etc", |rows: &[Note]| rows.len()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn staged_type_is_checked() {
        let (session, _) = session();
        session.read("notes", |rows: &[Note]| rows.len()).unwrap();
        let err = session.read("notes", |rows: &[Other]| rows.len()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn corrupt_document_is_a_storage_error() {
        let storage = Arc::new(InMemoryBackend::with_documents([(
            "notes".to_string(),
            vec![0xff, 0x00],
        )]));
        let session = FileSession::with_storage(storage, true);
        let err = session.read("notes", |rows: &[Note]| rows.len()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn open_requires_data_dir() {
        let err = FileSession::open(&SessionConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn open_creates_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let session = FileSession::open(&SessionConfig::new().data_dir(&root)).unwrap();

        session
            .write("notes", |rows: &mut Vec<Note>| {
                rows.push(note(1, "on disk"));
                Ok(())
            })
            .unwrap();
        session.persist().unwrap();

        assert!(root.join("notes.cbor").exists());
    }

    fn push_note(session: &FileSession, collection: &str, id: u32, text: &str) {
        session
            .write(collection, |rows: &mut Vec<Note>| {
                rows.push(note(id, text));
                Ok(())
            })
            .unwrap();
    }

    fn stored_notes(storage: &dyn StorageBackend, collection: &str) -> Option<Vec<Note>> {
        storage
            .load(collection)
            .unwrap()
            .map(|bytes| codec::decode(&bytes).unwrap())
    }

    #[test]
    fn failed_store_restores_documents_already_written() {
        let seeded = codec::encode(&vec![note(1, "committed")]).unwrap();
        let storage = Arc::new(FailingStore::new(
            InMemoryBackend::with_documents([("beta".to_string(), seeded)]),
            3,
        ));
        let session = FileSession::with_storage(Arc::clone(&storage) as Arc<dyn StorageBackend>, true);
        push_note(&session, "alpha", 1, "new");
        push_note(&session, "beta", 2, "pending");
        push_note(&session, "gamma", 1, "fails");

        let err = session.persist().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);

        assert_eq!(stored_notes(storage.as_ref(), "alpha"), None);
        assert_eq!(
            stored_notes(storage.as_ref(), "beta"),
            Some(vec![note(1, "committed")])
        );
        assert_eq!(stored_notes(storage.as_ref(), "gamma"), None);
        assert_eq!(session.dirty_collections(), vec!["alpha", "beta", "gamma"]);

        session.discard().unwrap();
        let texts = session
            .read("beta", |rows: &[Note]| rows.iter().map(|n| n.text.clone()).collect::<Vec<_>>())
            .unwrap();
        assert_eq!(texts, vec!["committed"]);
    }

    #[test]
    fn failed_persist_can_be_retried() {
        let storage = Arc::new(FailingStore::new(InMemoryBackend::new(), 2));
        let session = FileSession::with_storage(Arc::clone(&storage) as Arc<dyn StorageBackend>, true);
        push_note(&session, "alpha", 1, "a");
        push_note(&session, "beta", 1, "b");

        assert!(session.persist().is_err());
        assert!(storage.inner.names().unwrap().is_empty());

        session.persist().unwrap();
        assert!(session.dirty_collections().is_empty());
        assert_eq!(stored_notes(storage.as_ref(), "alpha"), Some(vec![note(1, "a")]));
        assert_eq!(stored_notes(storage.as_ref(), "beta"), Some(vec![note(1, "b")]));
    }

    #[test]
    fn failed_sync_restores_every_document() {
        let mut failing = FailingStore::new(InMemoryBackend::new(), 0);
        failing.fail_sync = true;
        let storage = Arc::new(failing);
        let session = FileSession::with_storage(Arc::clone(&storage) as Arc<dyn StorageBackend>, true);
        push_note(&session, "notes", 1, "unsynced");

        assert!(session.persist().is_err());
        assert_eq!(stored_notes(storage.as_ref(), "notes"), None);
        assert_eq!(session.dirty_collections(), vec!["notes"]);
    }
}
