//! Process-wide session factory.

use super::{OpenSession, Session};
use crate::config::SessionConfig;
use crate::error::{short_type_name, CoreError, CoreResult};
use crate::mock::MockSession;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::TypeId;
use tracing::debug;

type Opener = fn(&SessionConfig) -> CoreResult<Session>;

#[derive(Clone, Copy)]
struct DefaultSession {
    name: &'static str,
    type_id: TypeId,
    open: Opener,
}

impl DefaultSession {
    fn of<T: OpenSession>() -> Self {
        Self {
            name: short_type_name::<T>(),
            type_id: TypeId::of::<T>(),
            open: open_with::<T>,
        }
    }
}

struct FactoryState {
    default: Option<DefaultSession>,
    config: SessionConfig,
}

impl FactoryState {
    fn initial() -> Self {
        Self {
            default: Some(DefaultSession::of::<MockSession>()),
            config: SessionConfig::default(),
        }
    }
}

static FACTORY: Lazy<RwLock<FactoryState>> = Lazy::new(|| RwLock::new(FactoryState::initial()));

fn open_with<T: OpenSession>(config: &SessionConfig) -> CoreResult<Session> {
    let backend = T::open(config).map_err(|source| CoreError::SessionConstruction {
        session_type: short_type_name::<T>(),
        source: Box::new(source),
    })?;
    Ok(Session::new(backend, config.clone()))
}

/// Opens sessions of a process-wide default type.
///
/// The default starts as [`MockSession`]. Applications register their
/// provider's session type once at startup; tests swap it and call
/// [`reset`](Self::reset) afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFactory;

impl SessionFactory {
    /// Makes `T` the default session type.
    pub fn register_default<T: OpenSession>() {
        let entry = DefaultSession::of::<T>();
        debug!(session_type = entry.name, "default session type registered");
        FACTORY.write().default = Some(entry);
    }

    /// Removes the default session type.
    pub fn clear_default() {
        FACTORY.write().default = None;
    }

    /// Sets the configuration passed to newly opened sessions.
    pub fn configure(config: SessionConfig) {
        FACTORY.write().config = config;
    }

    /// Returns the configuration passed to newly opened sessions.
    #[must_use]
    pub fn config() -> SessionConfig {
        FACTORY.read().config.clone()
    }

    /// Returns the short name of the default session type.
    #[must_use]
    pub fn default_session_type() -> Option<&'static str> {
        FACTORY.read().default.map(|entry| entry.name)
    }

    /// Returns true if `T` is the default session type.
    #[must_use]
    pub fn is_default<T: OpenSession>() -> bool {
        FACTORY
            .read()
            .default
            .is_some_and(|entry| entry.type_id == TypeId::of::<T>())
    }

    /// Opens a session of the default type.
    ///
    /// # Errors
    ///
    /// Returns a state error if no default is registered, or
    /// `SessionConstruction` if the session type fails to open.
    pub fn open_session() -> CoreResult<Session> {
        let (entry, config) = {
            let state = FACTORY.read();
            let entry = state
                .default
                .ok_or_else(|| CoreError::state("no default session type registered"))?;
            (entry, state.config.clone())
        };
        (entry.open)(&config)
    }

    /// Opens a session of type `T` with the factory configuration.
    ///
    /// # Errors
    ///
    /// Returns `SessionConstruction` if `T` fails to open.
    pub fn open_session_as<T: OpenSession>() -> CoreResult<Session> {
        let config = Self::config();
        open_with::<T>(&config)
    }

    /// Opens a session of type `T` with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `SessionConstruction` if `T` fails to open.
    pub fn open_session_with<T: OpenSession>(config: &SessionConfig) -> CoreResult<Session> {
        open_with::<T>(config)
    }

    /// Restores the initial default type and configuration.
    pub fn reset() {
        *FACTORY.write() = FactoryState::initial();
    }
}
