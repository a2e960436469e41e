//! Scenario mock engine.
//!
//! A scenario seeds typed in-memory collections (and optional byte
//! assets) that mock repositories read and write. Scenarios are loaded
//! once into a [`ScenarioInstance`]; [`Transient`] and [`Scoped`] control
//! how long an instance lives, and [`ScenarioFactory`] holds the instance
//! that mock sessions open against.

mod data;
mod factory;
mod lifetime;

pub use data::{CollectionKey, ScenarioData};
pub use factory::ScenarioFactory;
pub use lifetime::{reset_all_scoped, Scoped, Transient};

use crate::error::{short_type_name, CoreError, CoreResult};
use std::any::Any;
use std::fmt;
use tracing::debug;

/// A named set of seed data.
///
/// # Example
///
/// ```
/// use dataport_core::{CollectionKey, CoreResult, Entity, Scenario, ScenarioData, ScenarioInstance};
///
/// #[derive(Clone)]
/// struct City { id: u32, name: String }
///
/// impl Entity for City {
///     type Id = u32;
///     fn id(&self) -> &u32 { &self.id }
///     fn set_id(&mut self, id: u32) { self.id = id; }
/// }
///
/// const CITIES: CollectionKey<City> = CollectionKey::new("cities");
///
/// struct Atlas;
///
/// impl Scenario for Atlas {
///     fn initialize_entities(&self, data: &ScenarioData) -> CoreResult<()> {
///         data.push(CITIES, ["Lyon", "Oslo"].map(|name| City { id: 0, name: name.into() }))
///     }
/// }
///
/// let instance = ScenarioInstance::load(Atlas).unwrap();
/// let ids = instance.data().read(CITIES, |rows| rows.iter().map(|c| c.id).collect::<Vec<_>>()).unwrap();
/// assert_eq!(ids, vec![1, 2]);
/// ```
pub trait Scenario: Send + Sync + 'static {
    /// Seeds entity collections.
    ///
    /// # Errors
    ///
    /// Returns an error if seeding fails; the scenario is then not loaded.
    fn initialize_entities(&self, data: &ScenarioData) -> CoreResult<()>;

    /// Seeds auxiliary assets. Runs after [`initialize_entities`](Self::initialize_entities).
    ///
    /// # Errors
    ///
    /// Returns an error if seeding fails; the scenario is then not loaded.
    fn initialize_assets(&self, data: &ScenarioData) -> CoreResult<()> {
        let _ = data;
        Ok(())
    }

    /// Returns the scenario name used in logs and errors.
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

/// A loaded scenario and its data.
pub struct ScenarioInstance {
    name: &'static str,
    scenario: Box<dyn Any + Send + Sync>,
    data: ScenarioData,
}

impl ScenarioInstance {
    /// Runs the scenario's initializers, entities first, then assets.
    ///
    /// # Errors
    ///
    /// Returns the first initializer error.
    pub fn load<S: Scenario>(scenario: S) -> CoreResult<Self> {
        let name = scenario.name();
        let data = ScenarioData::new();
        scenario.initialize_entities(&data)?;
        scenario.initialize_assets(&data)?;
        debug!(
            scenario = name,
            collections = data.collection_names().len(),
            assets = data.asset_names().len(),
            "scenario loaded"
        );
        Ok(Self {
            name,
            scenario: Box::new(scenario),
            data,
        })
    }

    /// Returns the scenario name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the scenario data.
    #[must_use]
    pub fn data(&self) -> &ScenarioData {
        &self.data
    }

    /// Narrows the scenario to its concrete type.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the scenario is not an `S`.
    pub fn scenario_as<S: Scenario>(&self) -> CoreResult<&S> {
        self.scenario
            .downcast_ref::<S>()
            .ok_or_else(|| CoreError::type_mismatch(short_type_name::<S>(), self.name))
    }
}

impl fmt::Debug for ScenarioInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioInstance")
            .field("name", &self.name)
            .field("data", &self.data)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Ordered {
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Scenario for Ordered {
        fn initialize_entities(&self, _data: &ScenarioData) -> CoreResult<()> {
            self.calls.lock().push("entities");
            Ok(())
        }

        fn initialize_assets(&self, data: &ScenarioData) -> CoreResult<()> {
            self.calls.lock().push("assets");
            data.put_asset("readme", b"hi".to_vec())
        }
    }

    struct Failing;

    impl Scenario for Failing {
        fn initialize_entities(&self, _data: &ScenarioData) -> CoreResult<()> {
            Err(CoreError::state("seed unavailable"))
        }

        fn initialize_assets(&self, _data: &ScenarioData) -> CoreResult<()> {
            panic!("assets must not run after a failed entity seed");
        }
    }

    #[test]
    fn load_runs_initializers_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let instance = ScenarioInstance::load(Ordered {
            calls: Arc::clone(&calls),
        })
        .unwrap();

        assert_eq!(*calls.lock(), vec!["entities", "assets"]);
        assert_eq!(instance.data().asset("readme"), Some(b"hi".to_vec()));
        assert_eq!(instance.name(), "Ordered");
    }

    #[test]
    fn failed_initializer_aborts_load() {
        let err = ScenarioInstance::load(Failing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn scenario_as_narrows() {
        let instance = ScenarioInstance::load(Ordered {
            calls: Arc::default(),
        })
        .unwrap();

        assert!(instance.scenario_as::<Ordered>().is_ok());
        assert_eq!(
            instance.scenario_as::<Failing>().err().map(|err| err.kind()),
            Some(ErrorKind::TypeMismatch)
        );
    }
}
