//! Storage primitive behind a repository.

use crate::entity::Entity;
use crate::error::CoreResult;
use crate::predicate::Predicate;
use crate::session::Session;

/// Row-level access to one collection.
///
/// Providers implement this once per storage kind; the [`Repository`]
/// default methods build the full contract on top of it. Writes go to the
/// session's pending state; whether they are immediately durable is up to
/// the session backend.
///
/// [`Repository`]: crate::Repository
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Returns the session this store is bound to.
    fn session(&self) -> &Session;

    /// Returns clones of all rows matching `filter`, in store order.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the collection cannot be read.
    fn scan(&self, filter: &Predicate<T>) -> CoreResult<Vec<T>>;

    /// Checks whether a row with this identifier exists.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the collection cannot be read.
    fn contains(&self, id: &T::Id) -> CoreResult<bool>;

    /// Appends a row, generating its identifier if unset.
    ///
    /// Returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the row cannot be written.
    fn insert(&self, entity: T) -> CoreResult<T>;

    /// Replaces the row with the same identifier.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such row exists.
    fn update(&self, entity: T) -> CoreResult<T>;

    /// Removes the row with this identifier; returns false if absent.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the collection cannot be written.
    fn remove(&self, id: &T::Id) -> CoreResult<bool>;
}
