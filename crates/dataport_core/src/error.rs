//! Error types for Dataport core.

use crate::entity::ValidationFailure;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Broad classification of a [`CoreError`].
///
/// Callers that only care about *what kind* of failure happened (for
/// example "the row was missing" versus "the repository could not be
/// resolved") should match on [`CoreError::kind`] rather than on variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required input was empty or absent.
    Argument,
    /// An operation was attempted before required initialization.
    State,
    /// A terminal state was violated.
    InvalidOperation,
    /// Repository resolution found zero or several implementations.
    Resolution,
    /// A session, repository or scenario had an unexpected concrete type.
    TypeMismatch,
    /// No entity matched.
    NotFound,
    /// More than one entity matched where exactly one was required.
    AmbiguousResult,
    /// An entity was rejected by its validation rules on save.
    Validation,
    /// The storage backend failed.
    Storage,
}

/// Errors that can occur in Dataport core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required input was empty or absent.
    #[error("invalid argument: {message}")]
    Argument {
        /// Description of the offending argument.
        message: String,
    },

    /// Operation attempted before required initialization.
    #[error("invalid state: {message}")]
    State {
        /// What was missing.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// No registered repository implements the interface for the provider.
    #[error("no implementation of {interface} found for provider {provider}")]
    NoImplementation {
        /// Requested repository interface.
        interface: &'static str,
        /// Provider of the resolving session.
        provider: &'static str,
    },

    /// More than one registered repository matches.
    #[error("ambiguous implementation of {interface} for provider {provider}: {}", .candidates.join(", "))]
    AmbiguousImplementation {
        /// Requested repository interface.
        interface: &'static str,
        /// Provider of the resolving session.
        provider: &'static str,
        /// Names of every matching implementation.
        candidates: Vec<&'static str>,
    },

    /// A value could not be viewed as the requested type.
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        /// The requested type.
        expected: String,
        /// The type actually present.
        actual: String,
    },

    /// A session type could not be constructed.
    #[error("session type {session_type} could not be constructed: {source}")]
    SessionConstruction {
        /// The session type that failed.
        session_type: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<CoreError>,
    },

    /// No entity matched.
    #[error("{entity} not found: {detail}")]
    NotFound {
        /// Entity type name.
        entity: &'static str,
        /// What was looked for.
        detail: String,
    },

    /// More than one entity matched a predicate expected to be unique.
    #[error("expected a single {entity}, found {count}")]
    AmbiguousResult {
        /// Entity type name.
        entity: &'static str,
        /// Number of matches.
        count: usize,
    },

    /// Entity rejected by its validation rules.
    #[error("{entity} failed validation: {}", join_failures(.failures))]
    Validation {
        /// Entity type name.
        entity: &'static str,
        /// Every failed rule.
        failures: Vec<ValidationFailure>,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] dataport_storage::StorageError),
}

fn join_failures(failures: &[ValidationFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CoreError {
    /// Returns the broad kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Argument { .. } => ErrorKind::Argument,
            Self::State { .. } => ErrorKind::State,
            Self::InvalidOperation { .. } => ErrorKind::InvalidOperation,
            Self::NoImplementation { .. } | Self::AmbiguousImplementation { .. } => {
                ErrorKind::Resolution
            }
            Self::TypeMismatch { .. } | Self::SessionConstruction { .. } => ErrorKind::TypeMismatch,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AmbiguousResult { .. } => ErrorKind::AmbiguousResult,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Storage(dataport_storage::StorageError::InvalidName(_)) => ErrorKind::Argument,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Creates an invalid argument error.
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a not found error for entity type `T`.
    pub fn not_found<T: ?Sized>(detail: impl Into<String>) -> Self {
        Self::NotFound {
            entity: short_type_name::<T>(),
            detail: detail.into(),
        }
    }

    /// Creates an ambiguous result error for entity type `T`.
    pub fn ambiguous_result<T: ?Sized>(count: usize) -> Self {
        Self::AmbiguousResult {
            entity: short_type_name::<T>(),
            count,
        }
    }

    /// Creates a validation error for entity type `T`.
    pub fn validation<T: ?Sized>(failures: Vec<ValidationFailure>) -> Self {
        Self::Validation {
            entity: short_type_name::<T>(),
            failures,
        }
    }
}

/// Returns the last path segment of a type name (`my::mod::Person` → `Person`).
///
/// Generic arguments are kept as-is. Trait objects render as the trait
/// name alone, so `dyn my::mod::Store + Send` becomes `Store`. Every error
/// and log line names types through this function.
#[must_use]
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    match full.strip_prefix("dyn ") {
        Some(object) => last_segment(object.split(" + ").next().unwrap_or(object)),
        None => last_segment(full),
    }
}

fn last_segment(path: &'static str) -> &'static str {
    let base = path.split('<').next().unwrap_or(path);
    match base.rfind("::") {
        Some(pos) => &path[pos + 2..],
        None => path,
    }
}
