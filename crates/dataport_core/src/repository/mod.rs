//! The repository contract.
//!
//! [`Repository`] is the uniform CRUD/query surface every provider
//! exposes. Implementors supply one primitive, [`Repository::store`];
//! everything else has a default built on [`EntityStore`]. Async forms
//! share the sync semantics.

mod store;

pub use store::EntityStore;

use crate::entity::{Entity, ValidationFailure};
use crate::error::{CoreError, CoreResult};
use crate::predicate::Predicate;
use crate::query::{FetchOptions, ProjectionOptions};
use async_trait::async_trait;
use std::future::Future;
use tracing::trace;

/// Data access for entities of type `T`.
///
/// Repository interfaces for a domain extend this trait:
///
/// ```ignore
/// pub trait PersonRepository: Repository<Person> {
///     fn find_by_department(&self, department: i64) -> CoreResult<Vec<Person>>;
/// }
/// ```
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Returns the storage primitive.
    fn store(&self) -> &dyn EntityStore<T>;

    /// Returns the single row matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing matches and `AmbiguousResult` if more
    /// than one row matches.
    fn get_single(&self, filter: &Predicate<T>) -> CoreResult<T> {
        let mut rows = self.store().scan(filter)?;
        if rows.len() > 1 {
            return Err(CoreError::ambiguous_result::<T>(rows.len()));
        }
        rows.pop()
            .ok_or_else(|| CoreError::not_found::<T>("no row matches the predicate"))
    }

    /// Returns the rows selected by `options`.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the collection cannot be read.
    fn fetch(&self, options: &FetchOptions<T>) -> CoreResult<Vec<T>> {
        let rows = self.store().scan(&options.predicate())?;
        trace!(matched = rows.len(), "fetch");
        Ok(options.window.apply(rows))
    }

    /// Returns every row in store order.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the collection cannot be read.
    fn fetch_all(&self) -> CoreResult<Vec<T>> {
        self.store().scan(&Predicate::always())
    }

    /// Counts rows matching `filter`, or all rows.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the collection cannot be read.
    fn count(&self, filter: Option<&Predicate<T>>) -> CoreResult<usize> {
        match filter {
            Some(filter) => Ok(self.store().scan(filter)?.len()),
            None => Ok(self.fetch_all()?.len()),
        }
    }

    /// Inserts or updates a row and returns it as stored.
    ///
    /// A row with an unset identifier is inserted with a generated one.
    /// A row with an identifier is updated if present and inserted
    /// otherwise. Without an active transaction the write is persisted
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the session validates on save and the row
    /// breaks its rules, or the provider's error.
    fn save(&self, entity: T) -> CoreResult<T> {
        let store = self.store();
        let session = store.session();

        if session.config().validate_on_save {
            let failures = self.validate(&entity);
            if !failures.is_empty() {
                return Err(CoreError::validation::<T>(failures));
            }
        }

        let saved = if !entity.is_new() && store.contains(entity.id())? {
            trace!(id = ?entity.id(), "update");
            store.update(entity)?
        } else {
            let saved = store.insert(entity)?;
            trace!(id = ?saved.id(), "insert");
            saved
        };
        session.auto_commit()?;
        Ok(saved)
    }

    /// Returns every validation failure of `entity`.
    fn validate(&self, entity: &T) -> Vec<ValidationFailure> {
        T::rules().validate(entity)
    }

    /// Returns true if `entity` passes its validation rules.
    fn is_valid(&self, entity: &T) -> bool {
        self.validate(entity).is_empty()
    }

    /// Removes the row with `entity`'s identifier.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such row exists.
    fn delete(&self, entity: &T) -> CoreResult<()> {
        let store = self.store();
        if !store.remove(entity.id())? {
            return Err(CoreError::not_found::<T>(format!("id {:?}", entity.id())));
        }
        trace!(id = ?entity.id(), "delete");
        store.session().auto_commit()
    }

    /// Async form of [`get_single`](Self::get_single).
    ///
    /// # Errors
    ///
    /// Same as [`get_single`](Self::get_single).
    async fn get_single_async(&self, filter: &Predicate<T>) -> CoreResult<T> {
        self.get_single(filter)
    }

    /// Async form of [`fetch`](Self::fetch).
    ///
    /// # Errors
    ///
    /// Same as [`fetch`](Self::fetch).
    async fn fetch_async(&self, options: &FetchOptions<T>) -> CoreResult<Vec<T>> {
        self.fetch(options)
    }

    /// Async form of [`fetch_all`](Self::fetch_all).
    ///
    /// # Errors
    ///
    /// Same as [`fetch_all`](Self::fetch_all).
    async fn fetch_all_async(&self) -> CoreResult<Vec<T>> {
        self.fetch_all()
    }

    /// Async form of [`count`](Self::count).
    ///
    /// # Errors
    ///
    /// Same as [`count`](Self::count).
    async fn count_async(&self, filter: Option<&Predicate<T>>) -> CoreResult<usize> {
        self.count(filter)
    }

    /// Async form of [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Same as [`save`](Self::save).
    async fn save_async(&self, entity: T) -> CoreResult<T> {
        self.save(entity)
    }

    /// Async form of [`delete`](Self::delete).
    ///
    /// # Errors
    ///
    /// Same as [`delete`](Self::delete).
    async fn delete_async(&self, entity: &T) -> CoreResult<()> {
        self.delete(entity)
    }
}

/// Projection queries, available on every [`Repository`].
pub trait RepositoryExt<T: Entity>: Repository<T> {
    /// Projects filtered rows through `select`, then applies the projection
    /// filter, sort and paging to the projected rows.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the collection cannot be read.
    fn fetch_with_projection<P, F>(
        &self,
        select: F,
        options: &ProjectionOptions<T, P>,
    ) -> CoreResult<Vec<P>>
    where
        P: 'static,
        F: Fn(T) -> P,
    {
        let rows = self.store().scan(&options.predicate())?;
        Ok(options.project(rows, select))
    }

    /// Async form of [`fetch_with_projection`](Self::fetch_with_projection).
    fn fetch_with_projection_async<'a, P, F>(
        &'a self,
        select: F,
        options: &'a ProjectionOptions<T, P>,
    ) -> impl Future<Output = CoreResult<Vec<P>>> + Send + 'a
    where
        P: Send + 'static,
        F: Fn(T) -> P + Send + 'a,
    {
        async move { self.fetch_with_projection(select, options) }
    }
}

impl<T: Entity, R: Repository<T> + ?Sized> RepositoryExt<T> for R {}
