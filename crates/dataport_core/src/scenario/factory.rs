//! Process-wide current scenario.

use super::{Scenario, ScenarioInstance, Scoped};
use crate::error::{CoreError, CoreResult};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

static CURRENT: Lazy<RwLock<Option<Arc<ScenarioInstance>>>> = Lazy::new(|| RwLock::new(None));

/// Holds the scenario instance that mock sessions open against.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioFactory;

impl ScenarioFactory {
    /// Loads `scenario` and makes it current.
    ///
    /// The previous instance is replaced; sessions already open keep it.
    ///
    /// # Errors
    ///
    /// Returns the scenario's initializer error; the current instance is
    /// then unchanged.
    pub fn initialize<S: Scenario>(scenario: S) -> CoreResult<Arc<ScenarioInstance>> {
        let instance = Arc::new(ScenarioInstance::load(scenario)?);
        Self::install(Arc::clone(&instance));
        Ok(instance)
    }

    /// Makes the process-wide [`Scoped`] instance of `S` current.
    ///
    /// # Errors
    ///
    /// Returns the scenario's initializer error.
    pub fn initialize_scoped<S: Scenario + Default>() -> CoreResult<Arc<ScenarioInstance>> {
        let instance = Scoped::<S>::instance()?;
        Self::install(Arc::clone(&instance));
        Ok(instance)
    }

    /// Makes an already loaded instance current.
    pub fn install(instance: Arc<ScenarioInstance>) {
        debug!(scenario = instance.name(), "current scenario set");
        *CURRENT.write() = Some(instance);
    }

    /// Returns the current instance.
    ///
    /// # Errors
    ///
    /// Returns a state error before the first `initialize` or `install`.
    pub fn current() -> CoreResult<Arc<ScenarioInstance>> {
        CURRENT
            .read()
            .clone()
            .ok_or_else(|| CoreError::state("scenario factory not initialized"))
    }

    /// Returns true if a current instance is set.
    #[must_use]
    pub fn is_initialized() -> bool {
        CURRENT.read().is_some()
    }

    /// Clears the current instance.
    pub fn reset() {
        *CURRENT.write() = None;
    }
}
