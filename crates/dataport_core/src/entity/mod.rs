//! Entities, identifiers and validation.

mod id;
mod key;
mod validation;

pub use id::EntityId;
pub use key::EntityKey;
pub use validation::{ValidationFailure, ValidationRules};

use crate::error::CoreResult;

/// A domain record stored in a collection and addressed by its identifier.
///
/// Entities are plain values: repositories hand out clones and accept
/// owned values on save.
///
/// # Example
///
/// ```
/// use dataport_core::{Entity, ValidationRules};
///
/// #[derive(Clone)]
/// struct Note { id: i64, text: String }
///
/// impl Entity for Note {
///     type Id = i64;
///
///     fn id(&self) -> &i64 { &self.id }
///     fn set_id(&mut self, id: i64) { self.id = id; }
///
///     fn rules() -> ValidationRules<Self> {
///         ValidationRules::<Self>::new().required("text", |n| n.text.as_str())
///     }
/// }
///
/// assert!(Note { id: 0, text: "x".into() }.is_new());
/// ```
pub trait Entity: Clone + Send + Sync + 'static {
    /// Identifier type.
    type Id: EntityKey;

    /// Returns the identifier.
    fn id(&self) -> &Self::Id;

    /// Replaces the identifier.
    fn set_id(&mut self, id: Self::Id);

    /// Returns the validation rules for this entity type.
    fn rules() -> ValidationRules<Self>
    where
        Self: Sized,
    {
        ValidationRules::new()
    }

    /// Returns true if the identifier has not been assigned yet.
    fn is_new(&self) -> bool {
        self.id().is_unset()
    }
}

/// Assigns a generated identifier to `entity` if it has none.
///
/// Returns true if an identifier was assigned.
///
/// # Errors
///
/// Returns an error if the key space is exhausted.
pub fn assign_id<'a, T, I>(entity: &mut T, existing: I) -> CoreResult<bool>
where
    T: Entity,
    I: IntoIterator<Item = &'a T::Id>,
{
    if !entity.is_new() {
        return Ok(false);
    }
    entity.set_id(T::Id::generate(existing)?);
    Ok(true)
}
