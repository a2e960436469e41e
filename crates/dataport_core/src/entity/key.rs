//! Identifier types and identifier generation.

use crate::entity::EntityId;
use crate::error::{short_type_name, CoreError, CoreResult};
use std::fmt::Debug;
use std::hash::Hash;
use uuid::Uuid;

/// A type usable as an entity identifier.
///
/// Every key type has a distinguished "unset" value marking entities that
/// have not been stored yet, and a generation strategy that yields a value
/// unused by the given existing keys.
pub trait EntityKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Returns true if this is the unassigned value.
    fn is_unset(&self) -> bool;

    /// Generates a fresh identifier not present in `existing`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key space is exhausted.
    fn generate<'a, I>(existing: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = &'a Self>,
        Self: 'a;
}

macro_rules! integer_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl EntityKey for $ty {
                fn is_unset(&self) -> bool {
                    *self == 0
                }

                fn generate<'a, I>(existing: I) -> CoreResult<Self>
                where
                    I: IntoIterator<Item = &'a Self>,
                {
                    let max = existing.into_iter().copied().max().unwrap_or(0).max(0);
                    max.checked_add(1).ok_or_else(|| {
                        CoreError::invalid_operation(format!(
                            "identifier space of {} exhausted",
                            short_type_name::<$ty>()
                        ))
                    })
                }
            }
        )*
    };
}

integer_key!(i32, i64, u32, u64);

impl EntityKey for String {
    fn is_unset(&self) -> bool {
        self.trim().is_empty()
    }

    fn generate<'a, I>(_existing: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        Ok(Uuid::new_v4().to_string())
    }
}

impl EntityKey for Uuid {
    fn is_unset(&self) -> bool {
        self.is_nil()
    }

    fn generate<'a, I>(_existing: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        Ok(Uuid::new_v4())
    }
}

impl EntityKey for EntityId {
    fn is_unset(&self) -> bool {
        self.is_nil()
    }

    fn generate<'a, I>(_existing: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        Ok(EntityId::generate())
    }
}
