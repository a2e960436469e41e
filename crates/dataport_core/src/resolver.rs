//! Repository resolution.
//!
//! Repository implementations are registered against the interface they
//! implement (a `dyn Trait` type) and the providers they support.
//! Resolving an interface for a session picks the single registration
//! matching both the interface and the session's provider and constructs
//! it with that session.
//!
//! Registrations come from two places: explicit calls to
//! [`RepositoryRegistry::register`], and [`declare_repository!`]
//! declarations collected at link time into [`RepositoryRegistry::global`].
//!
//! [`declare_repository!`]: crate::declare_repository

use crate::error::{short_type_name, CoreError, CoreResult};
use crate::provider::ProviderId;
use crate::session::Session;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Constructs a repository, boxed twice: `Box<Box<dyn Interface>>` as `Box<dyn Any>`.
pub type Constructor = fn(&Session) -> CoreResult<Box<dyn Any>>;

/// A concrete repository type that can be resolved through a session.
pub trait RepositoryImplementation: Sized + Send + Sync + 'static {
    /// The interface this implementation is resolved as, e.g. `dyn PersonRepository`.
    type Interface: ?Sized + 'static;

    /// Builds the repository for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot back this repository, for
    /// example because its backend has the wrong type.
    fn from_session(session: &Session) -> CoreResult<Self>;

    /// Converts into the boxed interface.
    fn into_interface(self) -> Box<Self::Interface>;
}

/// Builds `I` for a session and erases it for the registry.
///
/// # Errors
///
/// Propagates the error from [`RepositoryImplementation::from_session`].
pub fn construct<I: RepositoryImplementation>(session: &Session) -> CoreResult<Box<dyn Any>> {
    let repository = I::from_session(session)?;
    Ok(Box::new(repository.into_interface()))
}

/// Returns the [`TypeId`] of a possibly unsized type.
#[must_use]
pub fn type_id_of<T: ?Sized + 'static>() -> TypeId {
    TypeId::of::<T>()
}

/// A link-time repository declaration.
///
/// Created by [`declare_repository!`](crate::declare_repository) and
/// collected with `inventory`.
pub struct RepositoryDeclaration {
    /// Implementation type name.
    pub implementation: &'static str,
    /// Returns the interface type ID.
    pub interface: fn() -> TypeId,
    /// Returns the interface type name.
    pub interface_name: fn() -> &'static str,
    /// Returns each supported provider.
    pub providers: &'static [fn() -> ProviderId],
    /// Builds the repository.
    pub construct: Constructor,
}

inventory::collect!(RepositoryDeclaration);

#[derive(Clone)]
struct Registration {
    implementation: &'static str,
    interface: TypeId,
    interface_name: &'static str,
    providers: Vec<ProviderId>,
    construct: Constructor,
}

impl Registration {
    fn matches(&self, interface: TypeId, provider: ProviderId) -> bool {
        self.interface == interface && self.providers.contains(&provider)
    }
}

static GLOBAL: Lazy<Arc<RepositoryRegistry>> = Lazy::new(|| {
    let registry = RepositoryRegistry::from_declarations();
    debug!(registrations = registry.len(), "repository registry initialized");
    Arc::new(registry)
});

/// Table of repository registrations.
///
/// No instances are cached: every [`resolve`](Self::resolve) call
/// constructs a new repository.
#[derive(Default)]
pub struct RepositoryRegistry {
    entries: RwLock<Vec<Registration>>,
}

impl RepositoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every linked [`RepositoryDeclaration`].
    #[must_use]
    pub fn from_declarations() -> Self {
        let registry = Self::new();
        for declaration in inventory::iter::<RepositoryDeclaration>() {
            registry.register_declaration(declaration);
        }
        registry
    }

    /// Returns the process-wide registry used by [`Session::new`].
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Registers implementation `I` for the given providers.
    pub fn register<I: RepositoryImplementation>(&self, providers: &[ProviderId]) {
        self.push(Registration {
            implementation: short_type_name::<I>(),
            interface: TypeId::of::<I::Interface>(),
            interface_name: short_type_name::<I::Interface>(),
            providers: providers.to_vec(),
            construct: construct::<I>,
        });
    }

    /// Registers a link-time declaration.
    pub fn register_declaration(&self, declaration: &RepositoryDeclaration) {
        self.push(Registration {
            implementation: declaration.implementation,
            interface: (declaration.interface)(),
            interface_name: (declaration.interface_name)(),
            providers: declaration.providers.iter().map(|provider| provider()).collect(),
            construct: declaration.construct,
        });
    }

    fn push(&self, registration: Registration) {
        debug!(
            implementation = registration.implementation,
            interface = registration.interface_name,
            providers = ?registration.providers,
            "repository registered"
        );
        self.entries.write().push(registration);
    }

    /// Returns the number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the names of implementations of `R` supporting `provider`.
    #[must_use]
    pub fn implementations_of<R: ?Sized + 'static>(&self, provider: ProviderId) -> Vec<&'static str> {
        let interface = TypeId::of::<R>();
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.matches(interface, provider))
            .map(|entry| entry.implementation)
            .collect()
    }

    /// Constructs the single implementation of `R` for the session's provider.
    ///
    /// # Errors
    ///
    /// - `NoImplementation` if nothing matches
    /// - `AmbiguousImplementation` if several registrations match
    /// - `TypeMismatch` if the constructed value is not a `Box<R>`
    /// - any error from the implementation's constructor
    pub fn resolve<R: ?Sized + 'static>(&self, session: &Session) -> CoreResult<Box<R>> {
        let interface = TypeId::of::<R>();
        let provider = session.provider();

        let registration = {
            let entries = self.entries.read();
            let mut matches = entries
                .iter()
                .filter(|entry| entry.matches(interface, provider));
            match (matches.next(), matches.next()) {
                (None, _) => {
                    return Err(CoreError::NoImplementation {
                        interface: short_type_name::<R>(),
                        provider: provider.name(),
                    })
                }
                (Some(only), None) => only.clone(),
                (Some(first), Some(second)) => {
                    let candidates = [first, second]
                        .into_iter()
                        .chain(matches)
                        .map(|entry| entry.implementation)
                        .collect();
                    return Err(CoreError::AmbiguousImplementation {
                        interface: short_type_name::<R>(),
                        provider: provider.name(),
                        candidates,
                    });
                }
            }
        };

        debug!(
            implementation = registration.implementation,
            interface = registration.interface_name,
            session = %session.id(),
            "resolving repository"
        );
        let constructed = (registration.construct)(session)?;
        constructed
            .downcast::<Box<R>>()
            .map(|boxed| *boxed)
            .map_err(|_| CoreError::type_mismatch(short_type_name::<R>(), registration.implementation))
    }
}

impl fmt::Debug for RepositoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        f.debug_list()
            .entries(entries.iter().map(|entry| (entry.implementation, entry.interface_name)))
            .finish()
    }
}

/// Declares a repository implementation for link-time registration.
///
/// The implementation must implement
/// [`RepositoryImplementation`](crate::RepositoryImplementation) with the
/// named interface. Every declaration linked into the binary is picked up
/// by [`RepositoryRegistry::global`](crate::RepositoryRegistry::global).
///
/// ```ignore
/// declare_repository!(MockPersonRepository => dyn PersonRepository, providers: [Mock]);
/// ```
#[macro_export]
macro_rules! declare_repository {
    ($implementation:ty => dyn $interface:path, providers: [$($provider:ty),+ $(,)?]) => {
        $crate::__private::inventory::submit! {
            $crate::RepositoryDeclaration {
                implementation: ::core::stringify!($implementation),
                interface: $crate::type_id_of::<dyn $interface>,
                interface_name: $crate::short_type_name::<dyn $interface>,
                providers: &[$($crate::ProviderId::of::<$provider> as fn() -> $crate::ProviderId),+],
                construct: $crate::construct::<$implementation>,
            }
        }
    };
}
