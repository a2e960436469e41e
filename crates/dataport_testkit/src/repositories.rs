//! Mock and file-system implementations of the sample repositories.
//!
//! Each implementation is declared for link-time registration, so a
//! session opened through [`SessionFactory`](dataport_core::SessionFactory)
//! resolves them from the global registry. [`register_all`] adds the same
//! set to an explicit registry.

use crate::domain::{
    Department, DepartmentRepository, Person, PersonRepository, DEPARTMENTS, PERSONS,
};
use dataport_core::{
    declare_repository, CoreResult, EntityStore, FileStore, FileSystem, Mock, MockRepository,
    ProviderId, Repository, RepositoryImplementation, RepositoryRegistry, Session,
};

/// [`PersonRepository`] over scenario data.
#[derive(Debug)]
pub struct MockPersonRepository {
    inner: MockRepository<Person>,
}

impl RepositoryImplementation for MockPersonRepository {
    type Interface = dyn PersonRepository;

    fn from_session(session: &Session) -> CoreResult<Self> {
        Ok(Self {
            inner: MockRepository::new(session, PERSONS)?,
        })
    }

    fn into_interface(self) -> Box<dyn PersonRepository> {
        Box::new(self)
    }
}

impl Repository<Person> for MockPersonRepository {
    fn store(&self) -> &dyn EntityStore<Person> {
        &self.inner
    }
}

impl PersonRepository for MockPersonRepository {}

/// [`PersonRepository`] over a `persons` document.
#[derive(Debug)]
pub struct FilePersonRepository {
    inner: FileStore<Person>,
}

impl RepositoryImplementation for FilePersonRepository {
    type Interface = dyn PersonRepository;

    fn from_session(session: &Session) -> CoreResult<Self> {
        Ok(Self {
            inner: FileStore::new(session, PERSONS)?,
        })
    }

    fn into_interface(self) -> Box<dyn PersonRepository> {
        Box::new(self)
    }
}

impl Repository<Person> for FilePersonRepository {
    fn store(&self) -> &dyn EntityStore<Person> {
        &self.inner
    }
}

impl PersonRepository for FilePersonRepository {}

/// [`DepartmentRepository`] over scenario data.
#[derive(Debug)]
pub struct MockDepartmentRepository {
    inner: MockRepository<Department>,
}

impl RepositoryImplementation for MockDepartmentRepository {
    type Interface = dyn DepartmentRepository;

    fn from_session(session: &Session) -> CoreResult<Self> {
        Ok(Self {
            inner: MockRepository::new(session, DEPARTMENTS)?,
        })
    }

    fn into_interface(self) -> Box<dyn DepartmentRepository> {
        Box::new(self)
    }
}

impl Repository<Department> for MockDepartmentRepository {
    fn store(&self) -> &dyn EntityStore<Department> {
        &self.inner
    }
}

impl DepartmentRepository for MockDepartmentRepository {}

/// [`DepartmentRepository`] over a `departments` document.
#[derive(Debug)]
pub struct FileDepartmentRepository {
    inner: FileStore<Department>,
}

impl RepositoryImplementation for FileDepartmentRepository {
    type Interface = dyn DepartmentRepository;

    fn from_session(session: &Session) -> CoreResult<Self> {
        Ok(Self {
            inner: FileStore::new(session, DEPARTMENTS)?,
        })
    }

    fn into_interface(self) -> Box<dyn DepartmentRepository> {
        Box::new(self)
    }
}

impl Repository<Department> for FileDepartmentRepository {
    fn store(&self) -> &dyn EntityStore<Department> {
        &self.inner
    }
}

impl DepartmentRepository for FileDepartmentRepository {}

declare_repository!(MockPersonRepository => dyn PersonRepository, providers: [Mock]);
declare_repository!(FilePersonRepository => dyn PersonRepository, providers: [FileSystem]);
declare_repository!(MockDepartmentRepository => dyn DepartmentRepository, providers: [Mock]);
declare_repository!(FileDepartmentRepository => dyn DepartmentRepository, providers: [FileSystem]);

/// Registers every sample implementation with `registry`.
pub fn register_all(registry: &RepositoryRegistry) {
    let mock = [ProviderId::of::<Mock>()];
    let file = [ProviderId::of::<FileSystem>()];
    registry.register::<MockPersonRepository>(&mock);
    registry.register::<FilePersonRepository>(&file);
    registry.register::<MockDepartmentRepository>(&mock);
    registry.register::<FileDepartmentRepository>(&file);
}

/// Returns a new registry holding only the sample implementations.
#[must_use]
pub fn sample_registry() -> RepositoryRegistry {
    let registry = RepositoryRegistry::new();
    register_all(&registry);
    registry
}
