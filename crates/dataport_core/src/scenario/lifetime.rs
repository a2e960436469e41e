//! Scenario lifetime policies.

use super::{Scenario, ScenarioInstance};
use crate::error::CoreResult;
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// A scenario instance owned by its holder.
///
/// The scenario is loaded on first access and lives as long as the
/// `Transient` value. Two holders never share data.
pub struct Transient<S: Scenario> {
    build: Box<dyn Fn() -> S + Send + Sync>,
    instance: OnceCell<Arc<ScenarioInstance>>,
}

impl<S: Scenario> Transient<S> {
    /// Creates a holder that builds the scenario with `build` when first used.
    pub fn new<F>(build: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self {
            build: Box::new(build),
            instance: OnceCell::new(),
        }
    }

    /// Returns the instance, loading it on first call.
    ///
    /// A failed load is not cached; the next call tries again.
    ///
    /// # Errors
    ///
    /// Returns the scenario's initializer error.
    pub fn instance(&self) -> CoreResult<Arc<ScenarioInstance>> {
        self.instance
            .get_or_try_init(|| ScenarioInstance::load((self.build)()).map(Arc::new))
            .map(Arc::clone)
    }

    /// Returns true if the scenario has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.instance.get().is_some()
    }
}

impl<S: Scenario + Default> Default for Transient<S> {
    fn default() -> Self {
        Self::new(S::default)
    }
}

impl<S: Scenario> fmt::Debug for Transient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transient")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

type ScopedCell = Arc<OnceCell<Arc<ScenarioInstance>>>;

static SCOPED: Lazy<Mutex<HashMap<TypeId, ScopedCell>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// A process-wide scenario instance, one per scenario type.
///
/// Each scenario type has its own cell. The registry lock is held only
/// to find the cell, so an initializer may load other scoped scenarios,
/// while concurrent first accesses of one type still load it once.
pub struct Scoped<S: Scenario> {
    _scenario: PhantomData<fn() -> S>,
}

impl<S: Scenario> Scoped<S> {
    fn cell() -> ScopedCell {
        Arc::clone(SCOPED.lock().entry(TypeId::of::<S>()).or_default())
    }

    /// Returns the shared instance, loading it with `build` if absent.
    ///
    /// # Errors
    ///
    /// Returns the scenario's initializer error; nothing is cached then.
    pub fn get_or_load<F>(build: F) -> CoreResult<Arc<ScenarioInstance>>
    where
        F: FnOnce() -> S,
    {
        Self::cell()
            .get_or_try_init(|| {
                let instance = Arc::new(ScenarioInstance::load(build())?);
                debug!(scenario = instance.name(), "scoped scenario created");
                Ok(instance)
            })
            .map(Arc::clone)
    }

    /// Returns the shared instance, loading `S::default()` if absent.
    ///
    /// # Errors
    ///
    /// Returns the scenario's initializer error.
    pub fn instance() -> CoreResult<Arc<ScenarioInstance>>
    where
        S: Default,
    {
        Self::get_or_load(S::default)
    }

    /// Returns true if the shared instance exists.
    #[must_use]
    pub fn is_loaded() -> bool {
        SCOPED
            .lock()
            .get(&TypeId::of::<S>())
            .is_some_and(|cell| cell.get().is_some())
    }

    /// Drops the shared instance so the next access reloads it.
    ///
    /// A load already in progress finishes into the dropped cell.
    pub fn reset() {
        SCOPED.lock().remove(&TypeId::of::<S>());
    }
}

/// Drops every scoped scenario instance.
pub fn reset_all_scoped() {
    SCOPED.lock().clear();
}
