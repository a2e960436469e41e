//! Typed collections and assets held by a scenario.

use crate::entity::{assign_id, Entity};
use crate::error::{short_type_name, CoreError, CoreResult};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;

/// Names a collection of entities of type `T`.
///
/// Keys are usually declared as constants next to the entity type.
pub struct CollectionKey<T> {
    name: &'static str,
    _entity: PhantomData<fn() -> T>,
}

impl<T> CollectionKey<T> {
    /// Creates a key.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _entity: PhantomData,
        }
    }

    /// Returns the collection name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    fn checked_name(&self) -> CoreResult<&'static str> {
        if self.name.trim().is_empty() {
            return Err(CoreError::argument("collection name must not be blank"));
        }
        Ok(self.name)
    }
}

impl<T> Clone for CollectionKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for CollectionKey<T> {}

impl<T> fmt::Debug for CollectionKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CollectionKey<{}>({:?})", short_type_name::<T>(), self.name)
    }
}

struct Collection {
    rows: Box<dyn Any + Send + Sync>,
    entity: &'static str,
}

impl Collection {
    fn new<T: Entity>() -> Self {
        Self {
            rows: Box::new(Vec::<T>::new()),
            entity: short_type_name::<T>(),
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

/// Named entity collections plus byte assets.
///
/// Closures passed to [`read`](Self::read) and [`write`](Self::write) run
/// under the data lock and must not call back into the same `ScenarioData`.
#[derive(Default)]
pub struct ScenarioData {
    collections: RwLock<HashMap<&'static str, Collection>>,
    assets: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl ScenarioData {
    /// Creates empty scenario data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends entities to a collection, creating it if needed.
    ///
    /// Entities without an identifier receive a generated one that is
    /// unique within the collection.
    ///
    /// # Errors
    ///
    /// Returns `Argument` for a blank key, `TypeMismatch` if the name is
    /// already used by another entity type, or an error if identifiers run out.
    pub fn push<T, I>(&self, key: CollectionKey<T>, entities: I) -> CoreResult<()>
    where
        T: Entity,
        I: IntoIterator<Item = T>,
    {
        self.write(key, |rows| {
            for mut entity in entities {
                assign_id(&mut entity, rows.iter().map(Entity::id))?;
                rows.push(entity);
            }
            Ok(())
        })
    }

    /// Runs `f` over a collection; a missing collection reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `Argument` for a blank key or `TypeMismatch` if the
    /// collection holds another entity type.
    pub fn read<T, R, F>(&self, key: CollectionKey<T>, f: F) -> CoreResult<R>
    where
        T: Entity,
        F: FnOnce(&[T]) -> R,
    {
        let name = key.checked_name()?;
        let collections = self.collections.read();
        match collections.get(name) {
            Some(collection) => Ok(f(collection.rows::<T>()?.as_slice())),
            None => {
                let empty: &[T] = &[];
                Ok(f(empty))
            }
        }
    }

    /// Runs `f` over a mutable collection, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `Argument` for a blank key, `TypeMismatch` if the
    /// collection holds another entity type, or the error returned by `f`.
    pub fn write<T, R, F>(&self, key: CollectionKey<T>, f: F) -> CoreResult<R>
    where
        T: Entity,
        F: FnOnce(&mut Vec<T>) -> CoreResult<R>,
    {
        let name = key.checked_name()?;
        let mut collections = self.collections.write();
        let collection = collections.entry(name).or_insert_with(Collection::new::<T>);
        f(collection.rows_mut::<T>()?)
    }

    /// Returns a copy of a collection.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read).
    pub fn collection<T: Entity>(&self, key: CollectionKey<T>) -> CoreResult<Vec<T>> {
        self.read(key, <[T]>::to_vec)
    }

    /// Returns the number of rows in a collection.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read).
    pub fn len<T: Entity>(&self, key: CollectionKey<T>) -> CoreResult<usize> {
        self.read(key, <[T]>::len)
    }

    /// Returns the names of all collections, sorted.
    #[must_use]
    pub fn collection_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.collections.read().keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Stores an asset, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `Argument` for a blank name.
    pub fn put_asset(&self, name: impl Into<String>, bytes: Vec<u8>) -> CoreResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::argument("asset name must not be blank"));
        }
        self.assets.write().insert(name, bytes);
        Ok(())
    }

    /// Returns a copy of an asset.
    #[must_use]
    pub fn asset(&self, name: &str) -> Option<Vec<u8>> {
        self.assets.read().get(name).cloned()
    }

    /// Returns true if the asset exists.
    #[must_use]
    pub fn has_asset(&self, name: &str) -> bool {
        self.assets.read().contains_key(name)
    }

    /// Returns all asset names, sorted.
    #[must_use]
    pub fn asset_names(&self) -> Vec<String> {
        self.assets.read().keys().cloned().collect()
    }
}

impl fmt::Debug for ScenarioData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioData")
            .field("collections", &self.collection_names())
            .field("assets", &self.asset_names())
            .finish()
    }
}
