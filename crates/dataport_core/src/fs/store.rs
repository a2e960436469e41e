//! Repository over one staged document.

use super::FileSession;
use crate::entity::{assign_id, Entity};
use crate::error::{CoreError, CoreResult};
use crate::predicate::Predicate;
use crate::repository::{EntityStore, Repository};
use crate::scenario::CollectionKey;
use crate::session::Session;
use dataport_storage::validate_document_name;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Repository over one document of a [`FileSession`].
///
/// The collection key doubles as the document name, so it must be made of
/// ASCII letters, digits, `_` and `-`.
pub struct FileStore<T: Entity> {
    session: Session,
    key: CollectionKey<T>,
}

impl<T> FileStore<T>
where
    T: Entity + Serialize + DeserializeOwned,
{
    /// Binds to document `key` of the session's storage.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the session is not a [`FileSession`] and
    /// `Argument` if the key is not a valid document name.
    pub fn new(session: &Session, key: CollectionKey<T>) -> CoreResult<Self> {
        session.backend_as::<FileSession>()?;
        validate_document_name(key.name())?;
        Ok(Self {
            session: session.clone(),
            key,
        })
    }

    /// Returns the collection key.
    #[must_use]
    pub fn key(&self) -> CollectionKey<T> {
        self.key
    }

    fn backend(&self) -> CoreResult<&FileSession> {
        self.session.backend_as::<FileSession>()
    }
}

impl<T> EntityStore<T> for FileStore<T>
where
    T: Entity + Serialize + DeserializeOwned,
{
    fn session(&self) -> &Session {
        &self.session
    }

    fn scan(&self, filter: &Predicate<T>) -> CoreResult<Vec<T>> {
        self.backend()?.read(self.key.name(), |rows: &[T]| {
            rows.iter()
                .filter(|row| filter.matches(row))
                .cloned()
                .collect()
        })
    }

    fn contains(&self, id: &T::Id) -> CoreResult<bool> {
        self.backend()?
            .read(self.key.name(), |rows: &[T]| rows.iter().any(|row| row.id() == id))
    }

    fn insert(&self, mut entity: T) -> CoreResult<T> {
        self.backend()?.write(self.key.name(), |rows: &mut Vec<T>| {
            assign_id(&mut entity, rows.iter().map(Entity::id))?;
            rows.push(entity.clone());
            Ok(entity)
        })
    }

    fn update(&self, entity: T) -> CoreResult<T> {
        self.backend()?.write(self.key.name(), |rows: &mut Vec<T>| {
            let slot = rows
                .iter_mut()
                .find(|row| row.id() == entity.id())
                .ok_or_else(|| CoreError::not_found::<T>(format!("id {:?}", entity.id())))?;
            *slot = entity.clone();
            Ok(entity)
        })
    }

    fn remove(&self, id: &T::Id) -> CoreResult<bool> {
        let backend = self.backend()?;
        let present = backend.read(self.key.name(), |rows: &[T]| rows.iter().any(|row| row.id() == id))?;
        if !present {
            return Ok(false);
        }
        backend.write(self.key.name(), |rows: &mut Vec<T>| {
            rows.retain(|row| row.id() != id);
            Ok(true)
        })
    }
}

impl<T> Repository<T> for FileStore<T>
where
    T: Entity + Serialize + DeserializeOwned,
{
    fn store(&self) -> &dyn EntityStore<T> {
        self
    }
}

impl<T: Entity> fmt::Debug for FileStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStore")
            .field("session", &self.session.id())
            .field("key", &self.key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::error::ErrorKind;
    use crate::query::FetchOptions;
    use crate::session::testing::RecordingBackend;
    use dataport_storage::{InMemoryBackend, StorageBackend};
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Task {
        id: i64,
        title: String,
        done: bool,
    }

    impl Entity for Task {
        type Id = i64;

        fn id(&self) -> &i64 {
            &self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = id;
        }
    }

    const TASKS: CollectionKey<Task> = CollectionKey::new("tasks");

    fn task(title: &str) -> Task {
        Task {
            id: 0,
            title: title.to_string(),
            done: false,
        }
    }

    fn open(storage: &Arc<InMemoryBackend>) -> Session {
        let backend = FileSession::with_storage(Arc::clone(storage) as Arc<dyn StorageBackend>, true);
        Session::new(backend, SessionConfig::default())
    }

    #[test]
    fn requires_file_session() {
        let session = Session::new(RecordingBackend::default(), SessionConfig::default());
        let err = FileStore::new(&session, TASKS).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn rejects_invalid_document_name() {
        let storage = Arc::new(InMemoryBackend::new());
        let session = open(&storage);
        let err = FileStore::new(&session, CollectionKey::<Task>::new("my tasks")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn auto_commit_writes_through() {
        let storage = Arc::new(InMemoryBackend::new());
        let session = open(&storage);
        let store = FileStore::new(&session, TASKS).unwrap();

        let saved = store.save(task("write docs")).unwrap();
        assert_eq!(saved.id, 1);
        assert!(storage.load("tasks").unwrap().is_some());
        assert_eq!(storage.sync_count(), 1);

        let reopened = open(&storage);
        let rows = FileStore::new(&reopened, TASKS).unwrap().fetch_all().unwrap();
        assert_eq!(rows, vec![saved]);
    }

    #[test]
    fn transaction_defers_writes_until_commit() {
        let storage = Arc::new(InMemoryBackend::new());
        let session = open(&storage);
        let store = FileStore::new(&session, TASKS).unwrap();

        let mut txn = session.begin_transaction().unwrap();
        store.save(task("a")).unwrap();
        store.save(task("b")).unwrap();
        assert_eq!(storage.load("tasks").unwrap(), None);
        assert_eq!(store.count(None).unwrap(), 2);

        txn.commit().unwrap();

        let reopened = open(&storage);
        assert_eq!(FileStore::new(&reopened, TASKS).unwrap().count(None).unwrap(), 2);
        assert_eq!(storage.sync_count(), 1);
    }

    #[test]
    fn rollback_discards_staged_writes() {
        let storage = Arc::new(InMemoryBackend::new());
        let session = open(&storage);
        let store = FileStore::new(&session, TASKS).unwrap();
        store.save(task("kept")).unwrap();

        let mut txn = session.begin_transaction().unwrap();
        store.save(task("dropped")).unwrap();
        txn.rollback().unwrap();

        let titles: Vec<_> = store.fetch_all().unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["kept"]);
    }

    #[test]
    fn update_and_delete_round_through_storage() {
        let storage = Arc::new(InMemoryBackend::new());
        let session = open(&storage);
        let store = FileStore::new(&session, TASKS).unwrap();

        let mut first = store.save(task("first")).unwrap();
        store.save(task("second")).unwrap();
        first.done = true;
        store.save(first.clone()).unwrap();
        store.delete(&first).unwrap();

        let reopened = open(&storage);
        let rows = FileStore::new(&reopened, TASKS)
            .unwrap()
            .fetch(&FetchOptions::new().filter(Predicate::new(|t: &Task| !t.done)))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "second");
    }

    #[test]
    fn delete_missing_does_not_dirty_collection() {
        let storage = Arc::new(InMemoryBackend::new());
        let session = open(&storage);
        let store = FileStore::new(&session, TASKS).unwrap();

        let err = store.delete(&Task { id: 9, ..task("ghost") }).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(session
            .backend_as::<FileSession>()
            .unwrap()
            .dirty_collections()
            .is_empty());
    }

    #[test]
    fn data_dir_session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::new().data_dir(dir.path());

        {
            let backend = <FileSession as crate::session::OpenSession>::open(&config).unwrap();
            let session = Session::new(backend, config.clone());
            FileStore::new(&session, TASKS).unwrap().save(task("durable")).unwrap();
        }

        let backend = <FileSession as crate::session::OpenSession>::open(&config).unwrap();
        let session = Session::new(backend, config);
        let rows = FileStore::new(&session, TASKS).unwrap().fetch_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "durable");
    }
}
