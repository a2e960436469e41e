//! Declarative validation rules for entities.

use std::fmt;
use std::ops::RangeInclusive;

/// One failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Field the rule applies to, or `None` for entity-level rules.
    pub field: Option<String>,
    /// Human-readable description of the failure.
    pub message: String,
}

impl ValidationFailure {
    /// Creates a failure attached to a field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates an entity-level failure.
    pub fn entity(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

type Check<T> = Box<dyn Fn(&T) -> Option<ValidationFailure> + Send + Sync>;

/// An ordered set of rules evaluated against an entity.
///
/// Rules are declared once per entity type (see [`Entity::rules`]) and
/// every rule runs on each validation; failures are collected, not
/// short-circuited.
///
/// # Example
///
/// ```
/// use dataport_core::ValidationRules;
///
/// struct Tag { label: String, weight: u8 }
///
/// let rules = ValidationRules::<Tag>::new()
///     .required("label", |t| t.label.as_str())
///     .max_length("label", 8, |t| t.label.as_str())
///     .range("weight", 1..=10, |t| t.weight);
///
/// let failures = rules.validate(&Tag { label: String::new(), weight: 0 });
/// assert_eq!(failures.len(), 2);
/// ```
///
/// [`Entity::rules`]: crate::Entity::rules
pub struct ValidationRules<T> {
    checks: Vec<Check<T>>,
}

impl<T: 'static> ValidationRules<T> {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Requires a text field to be non-blank.
    #[must_use]
    pub fn required<F>(self, field: &'static str, get: F) -> Self
    where
        F: Fn(&T) -> &str + Send + Sync + 'static,
    {
        self.push(move |entity| {
            get(entity)
                .trim()
                .is_empty()
                .then(|| ValidationFailure::field(field, "is required"))
        })
    }

    /// Limits a text field to `max` characters.
    #[must_use]
    pub fn max_length<F>(self, field: &'static str, max: usize, get: F) -> Self
    where
        F: Fn(&T) -> &str + Send + Sync + 'static,
    {
        self.push(move |entity| {
            (get(entity).chars().count() > max).then(|| {
                ValidationFailure::field(field, format!("must be at most {max} characters"))
            })
        })
    }

    /// Requires a value to fall within an inclusive range.
    #[must_use]
    pub fn range<V, F>(self, field: &'static str, bounds: RangeInclusive<V>, get: F) -> Self
    where
        V: PartialOrd + fmt::Debug + Send + Sync + 'static,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.push(move |entity| {
            let value = get(entity);
            (!bounds.contains(&value)).then(|| {
                ValidationFailure::field(
                    field,
                    format!(
                        "must be between {:?} and {:?}, got {value:?}",
                        bounds.start(),
                        bounds.end()
                    ),
                )
            })
        })
    }

    /// Adds a field rule with a custom check.
    #[must_use]
    pub fn field<F>(self, field: &'static str, message: &'static str, check: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.push(move |entity| (!check(entity)).then(|| ValidationFailure::field(field, message)))
    }

    /// Adds an entity-level rule, typically spanning several fields.
    #[must_use]
    pub fn rule<F>(self, message: &'static str, check: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.push(move |entity| (!check(entity)).then(|| ValidationFailure::entity(message)))
    }

    fn push<F>(mut self, check: F) -> Self
    where
        F: Fn(&T) -> Option<ValidationFailure> + Send + Sync + 'static,
    {
        self.checks.push(Box::new(check));
        self
    }
}

impl<T> ValidationRules<T> {
    /// Runs every rule and returns the failures in declaration order.
    #[must_use]
    pub fn validate(&self, entity: &T) -> Vec<ValidationFailure> {
        self.checks.iter().filter_map(|check| check(entity)).collect()
    }

    /// Returns the number of declared rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Returns true if no rules are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl<T: 'static> Default for ValidationRules<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ValidationRules<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRules")
            .field("rules", &self.checks.len())
            .finish()
    }
}
