//! In-memory repository over a scenario collection.

use super::MockSession;
use crate::entity::{assign_id, Entity};
use crate::error::{CoreError, CoreResult};
use crate::predicate::Predicate;
use crate::repository::{EntityStore, Repository};
use crate::scenario::{CollectionKey, ScenarioInstance};
use crate::session::Session;
use std::fmt;
use std::sync::Arc;

/// Repository over one collection of the session's scenario.
///
/// Domain mock repositories wrap this and delegate [`Repository::store`]
/// to it.
pub struct MockRepository<T: Entity> {
    session: Session,
    scenario: Arc<ScenarioInstance>,
    key: CollectionKey<T>,
}

impl<T: Entity> MockRepository<T> {
    /// Binds to collection `key` of the session's scenario.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the session is not a [`MockSession`].
    pub fn new(session: &Session, key: CollectionKey<T>) -> CoreResult<Self> {
        let scenario = Arc::clone(session.backend_as::<MockSession>()?.scenario());
        Ok(Self {
            session: session.clone(),
            scenario,
            key,
        })
    }

    /// Returns the collection key.
    #[must_use]
    pub fn key(&self) -> CollectionKey<T> {
        self.key
    }

    /// Returns the scenario instance.
    #[must_use]
    pub fn scenario(&self) -> &Arc<ScenarioInstance> {
        &self.scenario
    }
}

impl<T: Entity> EntityStore<T> for MockRepository<T> {
    fn session(&self) -> &Session {
        &self.session
    }

    fn scan(&self, filter: &Predicate<T>) -> CoreResult<Vec<T>> {
        self.scenario.data().read(self.key, |rows| {
            rows.iter()
                .filter(|row| filter.matches(row))
                .cloned()
                .collect()
        })
    }

    fn contains(&self, id: &T::Id) -> CoreResult<bool> {
        self.scenario
            .data()
            .read(self.key, |rows| rows.iter().any(|row| row.id() == id))
    }

    fn insert(&self, mut entity: T) -> CoreResult<T> {
        self.scenario.data().write(self.key, |rows| {
            assign_id(&mut entity, rows.iter().map(Entity::id))?;
            rows.push(entity.clone());
            Ok(entity)
        })
    }

    fn update(&self, entity: T) -> CoreResult<T> {
        self.scenario.data().write(self.key, |rows| {
            let slot = rows
                .iter_mut()
                .find(|row| row.id() == entity.id())
                .ok_or_else(|| CoreError::not_found::<T>(format!("id {:?}", entity.id())))?;
            *slot = entity.clone();
            Ok(entity)
        })
    }

    fn remove(&self, id: &T::Id) -> CoreResult<bool> {
        self.scenario.data().write(self.key, |rows| {
            let before = rows.len();
            rows.retain(|row| row.id() != id);
            Ok(rows.len() != before)
        })
    }
}

impl<T: Entity> Repository<T> for MockRepository<T> {
    fn store(&self) -> &dyn EntityStore<T> {
        self
    }
}

impl<T: Entity> fmt::Debug for MockRepository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockRepository")
            .field("scenario", &self.scenario.name())
            .field("key", &self.key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ValidationRules;
    use crate::error::ErrorKind;
    use crate::query::{FetchOptions, ProjectionOptions};
    use crate::repository::RepositoryExt;
    use crate::scenario::{Scenario, ScenarioData};
    use crate::session::testing::RecordingBackend;
    use crate::SessionConfig;

    #[derive(Debug, Clone, PartialEq)]
    struct Book {
        id: i64,
        title: String,
        year: u16,
    }

    impl Entity for Book {
        type Id = i64;

        fn id(&self) -> &i64 {
            &self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = id;
        }

        fn rules() -> ValidationRules<Self> {
            ValidationRules::<Self>::new()
                .required("title", |b| b.title.as_str())
                .range("year", 1450..=2100, |b| b.year)
        }
    }

    const BOOKS: CollectionKey<Book> = CollectionKey::new("books");

    fn book(title: &str, year: u16) -> Book {
        Book {
            id: 0,
            title: title.to_string(),
            year,
        }
    }

    struct Library;

    impl Scenario for Library {
        fn initialize_entities(&self, data: &ScenarioData) -> CoreResult<()> {
            data.push(
                BOOKS,
                [
                    book("Dune", 1965),
                    book("Emma", 1815),
                    book("Ulysses", 1922),
                    book("Beloved", 1987),
                    book("Dracula", 1897),
                ],
            )
        }
    }

    fn repository(config: SessionConfig) -> MockRepository<Book> {
        let instance = Arc::new(ScenarioInstance::load(Library).unwrap());
        let session = Session::new(MockSession::new(instance), config);
        MockRepository::new(&session, BOOKS).unwrap()
    }

    fn titles(rows: &[Book]) -> Vec<&str> {
        rows.iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn requires_mock_session() {
        let session = Session::new(RecordingBackend::default(), SessionConfig::default());
        let err = MockRepository::new(&session, BOOKS).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn fetch_pages_in_store_order() {
        let repo = repository(SessionConfig::default());
        let rows = repo
            .fetch(&FetchOptions::new().start_row_index(1).maximum_rows(2))
            .unwrap();
        assert_eq!(titles(&rows), vec!["Emma", "Ulysses"]);
    }

    #[test]
    fn fetch_filters_and_sorts() {
        let repo = repository(SessionConfig::default());
        let options = FetchOptions::new()
            .filter(Predicate::new(|b: &Book| b.year < 1950))
            .sort_by(|b: &Book| b.year)
            .descending(true);
        assert_eq!(
            titles(&repo.fetch(&options).unwrap()),
            vec!["Ulysses", "Dracula", "Emma"]
        );
    }

    #[test]
    fn get_single_cardinality() {
        let repo = repository(SessionConfig::default());

        let none = repo.get_single(&Predicate::new(|b: &Book| b.year > 3000));
        assert_eq!(none.unwrap_err().kind(), ErrorKind::NotFound);

        let many = repo.get_single(&Predicate::new(|b: &Book| b.title.starts_with('D')));
        assert_eq!(many.unwrap_err().kind(), ErrorKind::AmbiguousResult);

        let one = repo
            .get_single(&Predicate::new(|b: &Book| b.title == "Emma"))
            .unwrap();
        assert_eq!(one.id, 2);
    }

    #[test]
    fn count_with_and_without_filter() {
        let repo = repository(SessionConfig::default());
        assert_eq!(repo.count(None).unwrap(), 5);
        let modern = Predicate::new(|b: &Book| b.year > 1900);
        assert_eq!(repo.count(Some(&modern)).unwrap(), 3);
    }

    #[test]
    fn save_new_appends_with_generated_id() {
        let repo = repository(SessionConfig::default());
        let saved = repo.save(book("Middlemarch", 1871)).unwrap();
        assert_eq!(saved.id, 6);
        assert_eq!(repo.fetch_all().unwrap().last(), Some(&saved));
    }

    #[test]
    fn save_existing_replaces_in_place() {
        let repo = repository(SessionConfig::default());
        let mut emma = repo
            .get_single(&Predicate::new(|b: &Book| b.title == "Emma"))
            .unwrap();
        emma.year = 1816;

        repo.save(emma.clone()).unwrap();

        let rows = repo.fetch_all().unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1], emma);
    }

    #[test]
    fn save_with_unknown_id_inserts() {
        let repo = repository(SessionConfig::default());
        let mut orphan = book("Orlando", 1928);
        orphan.id = 42;

        let saved = repo.save(orphan).unwrap();
        assert_eq!(saved.id, 42);
        assert_eq!(repo.count(None).unwrap(), 6);
    }

    #[test]
    fn save_rejects_invalid_entity() {
        let repo = repository(SessionConfig::default());
        let err = repo.save(book("", 1200)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        match err {
            CoreError::Validation { failures, .. } => assert_eq!(failures.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(repo.count(None).unwrap(), 5);
    }

    #[test]
    fn validation_can_be_disabled() {
        let repo = repository(SessionConfig::new().validate_on_save(false));
        assert!(repo.save(book("", 1200)).is_ok());
    }

    #[test]
    fn is_valid_reports_without_error() {
        let repo = repository(SessionConfig::default());
        assert!(repo.is_valid(&book("Emma", 1815)));
        assert!(!repo.is_valid(&book("", 1815)));
        assert_eq!(repo.validate(&book("Emma", 3000)).len(), 1);
    }

    #[test]
    fn delete_removes_by_id() {
        let repo = repository(SessionConfig::default());
        let dune = repo
            .get_single(&Predicate::new(|b: &Book| b.title == "Dune"))
            .unwrap();

        repo.delete(&dune).unwrap();
        assert_eq!(repo.count(None).unwrap(), 4);
        assert_eq!(repo.delete(&dune).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn projection_runs_after_filter() {
        let repo = repository(SessionConfig::default());
        let options = ProjectionOptions::<Book, (String, u16)>::new()
            .filter(Predicate::new(|b: &Book| b.year > 1850))
            .projection_filter(Predicate::new(|p: &(String, u16)| p.0.len() > 4))
            .sort_by(|p: &(String, u16)| p.1)
            .maximum_rows(2);

        let projected = repo
            .fetch_with_projection(|b| (b.title.to_uppercase(), b.year), &options)
            .unwrap();
        assert_eq!(
            projected,
            vec![("DRACULA".to_string(), 1897), ("ULYSSES".to_string(), 1922)]
        );
    }

    #[tokio::test]
    async fn async_forms_match_sync() {
        let repo = repository(SessionConfig::default());
        let rows = repo.fetch_all_async().await.unwrap();
        assert_eq!(rows, repo.fetch_all().unwrap());

        let saved = repo.save_async(book("Walden", 1854)).await.unwrap();
        assert_eq!(repo.count_async(None).await.unwrap(), 6);
        repo.delete_async(&saved).await.unwrap();

        let emma = repo
            .get_single_async(&Predicate::new(|b: &Book| b.title == "Emma"))
            .await
            .unwrap();
        assert_eq!(emma.year, 1815);

        let options = FetchOptions::new().maximum_rows(1);
        assert_eq!(repo.fetch_async(&options).await.unwrap().len(), 1);

        let projected = repo
            .fetch_with_projection_async(|b: Book| b.year, &ProjectionOptions::<Book, u16>::new())
            .await
            .unwrap();
        assert_eq!(projected.len(), 5);
    }
}
