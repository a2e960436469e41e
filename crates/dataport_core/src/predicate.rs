//! Composable entity predicates.
//!
//! A [`Predicate`] wraps a shared closure. Composition builds a new closure
//! around its operands, so nothing is evaluated until [`Predicate::matches`]
//! is called, and `and`/`or` short-circuit.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

type Test<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A boolean test over entities of type `T`.
///
/// # Example
///
/// ```
/// use dataport_core::Predicate;
///
/// let even = Predicate::new(|n: &i32| n % 2 == 0);
/// let big = Predicate::new(|n: &i32| *n > 10);
///
/// let both = even.clone() & big.clone();
/// assert!(both.matches(&12));
/// assert!(!both.matches(&8));
/// assert!((even | big).matches(&11));
/// ```
pub struct Predicate<T> {
    test: Test<T>,
}

impl<T: 'static> Predicate<T> {
    /// Wraps a closure as a predicate.
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(test),
        }
    }

    /// A predicate that matches everything.
    #[must_use]
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// A predicate that matches nothing.
    #[must_use]
    pub fn never() -> Self {
        Self::new(|_| false)
    }

    /// Matches when both predicates match; `other` is skipped when `self` fails.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let (left, right) = (self.test, other.test);
        Self::new(move |value| left(value) && right(value))
    }

    /// Matches when either predicate matches; `other` is skipped when `self` matches.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        let (left, right) = (self.test, other.test);
        Self::new(move |value| left(value) || right(value))
    }

    /// Inverts the predicate.
    #[must_use]
    pub fn negate(self) -> Self {
        let inner = self.test;
        Self::new(move |value| !inner(value))
    }
}

impl<T> Predicate<T> {
    /// Evaluates the predicate against a value.
    #[must_use]
    pub fn matches(&self, value: &T) -> bool {
        (self.test)(value)
    }
}

/// Combines two predicates with logical AND.
#[must_use]
pub fn and<T: 'static>(left: Predicate<T>, right: Predicate<T>) -> Predicate<T> {
    left.and(right)
}

/// Combines two predicates with logical OR.
#[must_use]
pub fn or<T: 'static>(left: Predicate<T>, right: Predicate<T>) -> Predicate<T> {
    left.or(right)
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            test: Arc::clone(&self.test),
        }
    }
}

impl<T: 'static> Default for Predicate<T> {
    fn default() -> Self {
        Self::always()
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").finish_non_exhaustive()
    }
}

impl<T: 'static> BitAnd for Predicate<T> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

impl<T: 'static> BitOr for Predicate<T> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

impl<T: 'static> Not for Predicate<T> {
    type Output = Self;

    fn not(self) -> Self {
        self.negate()
    }
}
