//! Fetch options: filtering, sorting and paging.

use crate::predicate::Predicate;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

type Compare<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Ordering applied to fetched rows.
pub struct SortKey<T> {
    compare: Compare<T>,
}

impl<T: 'static> SortKey<T> {
    /// Sorts by a key extracted from each row.
    pub fn by<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self {
            compare: Arc::new(move |a, b| key(a).cmp(&key(b))),
        }
    }

    /// Sorts with a custom comparator.
    pub fn with<F>(compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self {
            compare: Arc::new(compare),
        }
    }
}

impl<T> SortKey<T> {
    /// Compares two rows.
    #[must_use]
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.compare)(a, b)
    }
}

impl<T> Clone for SortKey<T> {
    fn clone(&self) -> Self {
        Self {
            compare: Arc::clone(&self.compare),
        }
    }
}

impl<T> fmt::Debug for SortKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortKey").finish_non_exhaustive()
    }
}

/// Sort order and paging over an already filtered row set.
///
/// Sorting is stable. Without a sort key rows keep store order, reversed
/// when `descending` is set. `start_row_index` and `maximum_rows` are
/// independent: either may be set alone.
pub struct Window<T> {
    /// Number of leading rows to skip.
    pub start_row_index: Option<usize>,
    /// Maximum number of rows to return.
    pub maximum_rows: Option<usize>,
    /// Sort key, or `None` for store order.
    pub sort: Option<SortKey<T>>,
    /// Reverse the ordering.
    pub descending: bool,
}

impl<T> Window<T> {
    /// Sorts and pages `rows`.
    #[must_use]
    pub fn apply(&self, mut rows: Vec<T>) -> Vec<T> {
        match &self.sort {
            Some(sort) if self.descending => rows.sort_by(|a, b| sort.compare(b, a)),
            Some(sort) => rows.sort_by(|a, b| sort.compare(a, b)),
            None if self.descending => rows.reverse(),
            None => {}
        }

        let start = self.start_row_index.unwrap_or(0);
        let take = self.maximum_rows.unwrap_or(usize::MAX);
        rows.into_iter().skip(start).take(take).collect()
    }
}

impl<T> Default for Window<T> {
    fn default() -> Self {
        Self {
            start_row_index: None,
            maximum_rows: None,
            sort: None,
            descending: false,
        }
    }
}

impl<T> Clone for Window<T> {
    fn clone(&self) -> Self {
        Self {
            start_row_index: self.start_row_index,
            maximum_rows: self.maximum_rows,
            sort: self.sort.clone(),
            descending: self.descending,
        }
    }
}

impl<T> fmt::Debug for Window<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("start_row_index", &self.start_row_index)
            .field("maximum_rows", &self.maximum_rows)
            .field("sorted", &self.sort.is_some())
            .field("descending", &self.descending)
            .finish()
    }
}

/// Options for [`Repository::fetch`](crate::Repository::fetch).
///
/// # Example
///
/// ```
/// use dataport_core::{FetchOptions, Predicate};
///
/// let options = FetchOptions::new()
///     .filter(Predicate::new(|n: &u32| n % 2 == 1))
///     .sort_by(|n: &u32| *n)
///     .descending(true)
///     .start_row_index(1)
///     .maximum_rows(2);
///
/// let rows: Vec<u32> = (1..=9).filter(|n| options.matches(n)).collect();
/// assert_eq!(options.window.apply(rows), vec![7, 5]);
/// ```
pub struct FetchOptions<T> {
    /// Row filter; `None` selects every row.
    pub filter: Option<Predicate<T>>,
    /// Sort order and paging.
    pub window: Window<T>,
}

impl<T: 'static> FetchOptions<T> {
    /// Creates options selecting every row in store order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row filter.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate<T>) -> Self {
        self.filter = Some(predicate);
        self
    }

    /// Sorts by a key extracted from each row.
    #[must_use]
    pub fn sort_by<K, F>(mut self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.window.sort = Some(SortKey::by(key));
        self
    }

    /// Sets the sort key.
    #[must_use]
    pub fn sort(mut self, key: SortKey<T>) -> Self {
        self.window.sort = Some(key);
        self
    }

    /// Sets whether the ordering is reversed.
    #[must_use]
    pub fn descending(mut self, value: bool) -> Self {
        self.window.descending = value;
        self
    }

    /// Skips the first `index` rows.
    #[must_use]
    pub fn start_row_index(mut self, index: usize) -> Self {
        self.window.start_row_index = Some(index);
        self
    }

    /// Returns at most `count` rows.
    #[must_use]
    pub fn maximum_rows(mut self, count: usize) -> Self {
        self.window.maximum_rows = Some(count);
        self
    }

    /// Returns the filter, or a match-all predicate.
    #[must_use]
    pub fn predicate(&self) -> Predicate<T> {
        self.filter.clone().unwrap_or_else(Predicate::always)
    }
}

impl<T> FetchOptions<T> {
    /// Returns true if `row` passes the filter.
    #[must_use]
    pub fn matches(&self, row: &T) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter.matches(row))
    }
}

impl<T> Default for FetchOptions<T> {
    fn default() -> Self {
        Self {
            filter: None,
            window: Window::default(),
        }
    }
}

impl<T> Clone for FetchOptions<T> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            window: self.window.clone(),
        }
    }
}

impl<T> fmt::Debug for FetchOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("filtered", &self.filter.is_some())
            .field("window", &self.window)
            .finish()
    }
}

/// Options for fetching a projection of type `P` from rows of type `T`.
///
/// The source filter runs on `T`; projection filter, sorting and paging
/// run on the projected rows.
pub struct ProjectionOptions<T, P> {
    /// Filter over source rows.
    pub filter: Option<Predicate<T>>,
    /// Filter over projected rows.
    pub projection_filter: Option<Predicate<P>>,
    /// Sort order and paging over projected rows.
    pub window: Window<P>,
}

impl<T: 'static, P: 'static> ProjectionOptions<T, P> {
    /// Creates options selecting every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source filter.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate<T>) -> Self {
        self.filter = Some(predicate);
        self
    }

    /// Sets the filter over projected rows.
    #[must_use]
    pub fn projection_filter(mut self, predicate: Predicate<P>) -> Self {
        self.projection_filter = Some(predicate);
        self
    }

    /// Sorts projected rows by a key.
    #[must_use]
    pub fn sort_by<K, F>(mut self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&P) -> K + Send + Sync + 'static,
    {
        self.window.sort = Some(SortKey::by(key));
        self
    }

    /// Sets whether the ordering is reversed.
    #[must_use]
    pub fn descending(mut self, value: bool) -> Self {
        self.window.descending = value;
        self
    }

    /// Skips the first `index` projected rows.
    #[must_use]
    pub fn start_row_index(mut self, index: usize) -> Self {
        self.window.start_row_index = Some(index);
        self
    }

    /// Returns at most `count` projected rows.
    #[must_use]
    pub fn maximum_rows(mut self, count: usize) -> Self {
        self.window.maximum_rows = Some(count);
        self
    }

    /// Returns the source filter, or a match-all predicate.
    #[must_use]
    pub fn predicate(&self) -> Predicate<T> {
        self.filter.clone().unwrap_or_else(Predicate::always)
    }

    /// Projects filtered source rows and applies the projection filter and window.
    #[must_use]
    pub fn project<F>(&self, rows: Vec<T>, select: F) -> Vec<P>
    where
        F: Fn(T) -> P,
    {
        let projected = rows
            .into_iter()
            .map(select)
            .filter(|row| {
                self.projection_filter
                    .as_ref()
                    .map_or(true, |filter| filter.matches(row))
            })
            .collect();
        self.window.apply(projected)
    }
}

impl<T, P> Default for ProjectionOptions<T, P> {
    fn default() -> Self {
        Self {
            filter: None,
            projection_filter: None,
            window: Window::default(),
        }
    }
}

impl<T, P> fmt::Debug for ProjectionOptions<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectionOptions")
            .field("filtered", &self.filter.is_some())
            .field("projection_filtered", &self.projection_filter.is_some())
            .field("window", &self.window)
            .finish()
    }
}
