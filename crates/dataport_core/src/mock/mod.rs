//! Mock provider backed by scenario data.
//!
//! A [`MockSession`] points at a loaded [`ScenarioInstance`]; a
//! [`MockRepository`] reads and writes one of its collections in place.
//! Writes are visible immediately, so persisting and discarding are no-ops.

mod repository;

pub use repository::MockRepository;

use crate::config::SessionConfig;
use crate::error::CoreResult;
use crate::provider::{Mock, ProviderId};
use crate::scenario::{ScenarioFactory, ScenarioInstance};
use crate::session::{OpenSession, SessionBackend};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Session backend for the mock provider.
pub struct MockSession {
    scenario: Arc<ScenarioInstance>,
}

impl MockSession {
    /// Creates a backend over an explicit scenario instance.
    #[must_use]
    pub fn new(scenario: Arc<ScenarioInstance>) -> Self {
        Self { scenario }
    }

    /// Returns the scenario instance.
    #[must_use]
    pub fn scenario(&self) -> &Arc<ScenarioInstance> {
        &self.scenario
    }
}

impl SessionBackend for MockSession {
    fn provider(&self) -> ProviderId {
        ProviderId::of::<Mock>()
    }

    fn persist(&self) -> CoreResult<()> {
        trace!(scenario = self.scenario.name(), "mock persist");
        Ok(())
    }

    fn discard(&self) -> CoreResult<()> {
        trace!(scenario = self.scenario.name(), "mock discard");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl OpenSession for MockSession {
    /// Opens against [`ScenarioFactory::current`].
    fn open(_config: &SessionConfig) -> CoreResult<Self> {
        Ok(Self::new(ScenarioFactory::current()?))
    }
}

impl fmt::Debug for MockSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSession")
            .field("scenario", &self.scenario.name())
            .finish()
    }
}
