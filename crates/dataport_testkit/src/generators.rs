//! Property-based test generators using proptest.
//!
//! Strategies for generating sample entities, document names and fetch
//! windows that respect the domain's validation rules.

use crate::domain::{Department, Person};
use dataport_core::{EntityId, FetchOptions};
use proptest::prelude::*;

/// Strategy for generating entity IDs, including the nil ID.
pub fn entity_id_strategy() -> impl Strategy<Value = EntityId> {
    prop::array::uniform16(any::<u8>()).prop_map(EntityId::from_bytes)
}

/// Strategy for generating valid document (collection) names.
pub fn document_name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_-]{0,31}"
}

/// Strategy for generating unsaved people that pass validation.
pub fn person_strategy() -> impl Strategy<Value = Person> {
    ("[A-Z][a-z]{1,15}", "[a-z]{1,10}", 0u8..=150)
        .prop_map(|(name, user, age)| Person::new(name, format!("{user}@example.com"), age))
}

/// Strategy for generating unsaved departments that pass validation.
pub fn department_strategy() -> impl Strategy<Value = Department> {
    ("[A-Z]{2,8}", "[A-Z][a-z]{2,20}")
        .prop_map(|(code, name)| Department::new(code, name))
}

/// A generated paging window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    /// Rows to skip.
    pub start_row_index: Option<usize>,
    /// Rows to take.
    pub maximum_rows: Option<usize>,
    /// Reverse the ordering.
    pub descending: bool,
}

impl WindowSpec {
    /// Builds fetch options with this window and no filter or sort key.
    #[must_use]
    pub fn options<T: 'static>(&self) -> FetchOptions<T> {
        let mut options = FetchOptions::new().descending(self.descending);
        if let Some(start) = self.start_row_index {
            options = options.start_row_index(start);
        }
        if let Some(max) = self.maximum_rows {
            options = options.maximum_rows(max);
        }
        options
    }

    /// Returns the indices of `len` store-ordered rows this window selects.
    #[must_use]
    pub fn expected_indices(&self, len: usize) -> Vec<usize> {
        let ordered: Box<dyn Iterator<Item = usize>> = if self.descending {
            Box::new((0..len).rev())
        } else {
            Box::new(0..len)
        };
        ordered
            .skip(self.start_row_index.unwrap_or(0))
            .take(self.maximum_rows.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Strategy for generating paging windows over up to `max_rows` rows.
pub fn window_strategy(max_rows: usize) -> impl Strategy<Value = WindowSpec> {
    (
        prop::option::of(0..=max_rows + 2),
        prop::option::of(0..=max_rows + 2),
        any::<bool>(),
    )
        .prop_map(|(start_row_index, maximum_rows, descending)| WindowSpec {
            start_row_index,
            maximum_rows,
            descending,
        })
}
