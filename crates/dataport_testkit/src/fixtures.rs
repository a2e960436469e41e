//! Session fixtures.
//!
//! Convenience functions for opening mock and file-system sessions in
//! tests, with temporary storage that cleans up after itself.

use dataport_core::{
    CoreError, CoreResult, FileSession, MockSession, OpenSession, RepositoryRegistry, Scenario,
    ScenarioInstance, Session, SessionConfig,
};
use dataport_storage::{InMemoryBackend, StorageBackend, StorageError};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary data directory for file-system sessions.
///
/// The directory is deleted when the workspace is dropped.
#[derive(Debug)]
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    /// Creates an empty temporary directory.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be created.
    pub fn new() -> CoreResult<Self> {
        let dir = TempDir::new().map_err(|err| CoreError::from(StorageError::from(err)))?;
        Ok(Self { dir })
    }

    /// Returns the data directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns a configuration pointing at the data directory.
    #[must_use]
    pub fn config(&self) -> SessionConfig {
        SessionConfig::new().data_dir(self.dir.path())
    }

    /// Opens a file-system session over the data directory.
    ///
    /// Every session opened from the same workspace sees what earlier
    /// sessions committed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be opened.
    pub fn open_session(&self) -> CoreResult<Session> {
        let config = self.config();
        let backend = FileSession::open(&config)?;
        Ok(Session::new(backend, config))
    }
}

/// Loads `scenario` and opens a mock session over it.
///
/// The session resolves repositories from the global registry.
///
/// # Errors
///
/// Returns the first scenario initializer error.
pub fn mock_session<S: Scenario>(scenario: S) -> CoreResult<Session> {
    let instance = Arc::new(ScenarioInstance::load(scenario)?);
    Ok(Session::new(MockSession::new(instance), SessionConfig::default()))
}

/// Like [`mock_session`], resolving from an explicit registry.
///
/// # Errors
///
/// Returns the first scenario initializer error.
pub fn mock_session_with<S: Scenario>(
    scenario: S,
    registry: Arc<RepositoryRegistry>,
) -> CoreResult<Session> {
    let instance = Arc::new(ScenarioInstance::load(scenario)?);
    Ok(Session::with_registry(
        MockSession::new(instance),
        SessionConfig::default(),
        registry,
    ))
}

/// Opens a file-system session over shared in-memory storage.
///
/// Pass the returned storage to the next call to simulate reopening.
#[must_use]
pub fn memory_file_session(storage: Option<Arc<InMemoryBackend>>) -> (Session, Arc<InMemoryBackend>) {
    let storage = storage.unwrap_or_else(|| Arc::new(InMemoryBackend::new()));
    let backend = FileSession::with_storage(Arc::clone(&storage) as Arc<dyn StorageBackend>, true);
    (Session::new(backend, SessionConfig::default()), storage)
}

/// Runs `f` with a mock session over `scenario`.
///
/// # Errors
///
/// Returns the scenario error, or whatever `f` returns.
pub fn with_mock_session<S, F, R>(scenario: S, f: F) -> CoreResult<R>
where
    S: Scenario,
    F: FnOnce(&Session) -> CoreResult<R>,
{
    let session = mock_session(scenario)?;
    let result = f(&session);
    session.dispose();
    result
}

/// Runs `f` with a file-system session over a fresh temporary directory.
///
/// # Errors
///
/// Returns the setup error, or whatever `f` returns.
pub fn with_file_session<F, R>(f: F) -> CoreResult<R>
where
    F: FnOnce(&Session, &Path) -> CoreResult<R>,
{
    let workspace = TestWorkspace::new()?;
    let session = workspace.open_session()?;
    let result = f(&session, workspace.path());
    session.dispose();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PersonRepository, PERSONS};
    use crate::repositories::sample_registry;
    use crate::scenarios::CompanyScenario;
    use dataport_core::{FileStore, MockRepository, Repository};

    #[test]
    fn workspace_sessions_share_the_directory() {
        let workspace = TestWorkspace::new().unwrap();
        let first = workspace.open_session().unwrap();
        FileStore::new(&first, PERSONS)
            .unwrap()
            .save(crate::domain::Person::new("Ada", "ada@example.com", 36))
            .unwrap();

        let second = workspace.open_session().unwrap();
        assert_eq!(FileStore::new(&second, PERSONS).unwrap().count(None).unwrap(), 1);
        assert!(workspace.path().join("persons.cbor").exists());
    }

    #[test]
    fn mock_session_with_explicit_registry() {
        let session = mock_session_with(CompanyScenario, Arc::new(sample_registry())).unwrap();
        let people = session.resolve_repository::<dyn PersonRepository>().unwrap();
        assert_eq!(people.count(None).unwrap(), 5);
    }

    #[test]
    fn memory_file_session_reopens() {
        let (session, storage) = memory_file_session(None);
        FileStore::new(&session, PERSONS)
            .unwrap()
            .save(crate::domain::Person::new("Ada", "ada@example.com", 36))
            .unwrap();

        let (reopened, _) = memory_file_session(Some(storage));
        assert_eq!(FileStore::new(&reopened, PERSONS).unwrap().count(None).unwrap(), 1);
    }

    #[test]
    fn with_file_session_cleans_up() {
        let dir = with_file_session(|_, path| Ok(path.to_path_buf())).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn with_mock_session_runs_against_the_scenario() {
        let count = with_mock_session(CompanyScenario, |session| {
            assert!(!session.is_disposed());
            MockRepository::new(session, PERSONS)?.count(None)
        })
        .unwrap();
        assert_eq!(count, 5);
    }
}
