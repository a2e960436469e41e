//! Storage provider markers.
//!
//! A provider marker tags sessions and repository implementations with the
//! kind of store they target. Resolution only matches implementations
//! tagged with the resolving session's provider.

use std::any::TypeId;
use std::fmt;

/// A storage provider category.
pub trait Provider: Send + Sync + 'static {
    /// Human-readable provider name.
    const NAME: &'static str;
}

/// In-memory scenario data.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mock;

impl Provider for Mock {
    const NAME: &'static str = "mock";
}

/// Documents on the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystem;

impl Provider for FileSystem {
    const NAME: &'static str = "file-system";
}

/// A relational database reached through an external adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Relational;

impl Provider for Relational {
    const NAME: &'static str = "relational";
}

/// Runtime tag identifying a [`Provider`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId {
    type_id: TypeId,
    name: &'static str,
}

impl ProviderId {
    /// Returns the tag of provider `P`.
    #[must_use]
    pub fn of<P: Provider>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            name: P::NAME,
        }
    }

    /// Returns the provider name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true if this is the tag of provider `P`.
    #[must_use]
    pub fn is<P: Provider>(&self) -> bool {
        self.type_id == TypeId::of::<P>()
    }
}

impl fmt::Debug for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderId({})", self.name)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_distinguish_providers() {
        assert_eq!(ProviderId::of::<Mock>(), ProviderId::of::<Mock>());
        assert_ne!(ProviderId::of::<Mock>(), ProviderId::of::<FileSystem>());
        assert!(ProviderId::of::<Relational>().is::<Relational>());
        assert!(!ProviderId::of::<Relational>().is::<Mock>());
    }

    #[test]
    fn names() {
        assert_eq!(ProviderId::of::<Mock>().to_string(), "mock");
        assert_eq!(ProviderId::of::<FileSystem>().name(), "file-system");
        assert_eq!(format!("{:?}", ProviderId::of::<Relational>()), "ProviderId(relational)");
    }
}
