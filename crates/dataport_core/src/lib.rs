//! # Dataport Core
//!
//! Provider-agnostic data access for Dataport.
//!
//! This crate provides:
//! - Sessions with at most one active transaction (unit of work)
//! - A uniform repository contract with sync and async forms
//! - Resolution of repository interfaces to provider implementations
//! - Scenario-driven mock data with transient and scoped lifetimes
//! - A file-system provider storing one CBOR document per collection
//!
//! ## Example
//!
//! ```rust
//! use dataport_core::{
//!     CollectionKey, CoreResult, Entity, MockRepository, MockSession, Repository, Scenario,
//!     ScenarioData, ScenarioInstance, Session, SessionConfig,
//! };
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone)]
//! struct City {
//!     id: u32,
//!     name: String,
//! }
//!
//! impl Entity for City {
//!     type Id = u32;
//!     fn id(&self) -> &u32 { &self.id }
//!     fn set_id(&mut self, id: u32) { self.id = id; }
//! }
//!
//! const CITIES: CollectionKey<City> = CollectionKey::new("cities");
//!
//! struct Atlas;
//!
//! impl Scenario for Atlas {
//!     fn initialize_entities(&self, data: &ScenarioData) -> CoreResult<()> {
//!         data.push(CITIES, [City { id: 0, name: "Lima".into() }])
//!     }
//! }
//!
//! let scenario = Arc::new(ScenarioInstance::load(Atlas).unwrap());
//! let session = Session::new(MockSession::new(scenario), SessionConfig::default());
//! let cities = MockRepository::new(&session, CITIES).unwrap();
//!
//! let saved = cities.save(City { id: 0, name: "Oslo".into() }).unwrap();
//! assert_eq!(saved.id, 2);
//! assert_eq!(cities.count(None).unwrap(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod entity;
mod error;
mod fs;
mod mock;
mod predicate;
mod provider;
mod query;
mod repository;
mod resolver;
mod scenario;
mod session;
mod transaction;
mod types;

pub use config::SessionConfig;
pub use entity::{assign_id, Entity, EntityId, EntityKey, ValidationFailure, ValidationRules};
pub use error::{short_type_name, CoreError, CoreResult, ErrorKind};
pub use fs::{FileSession, FileStore};
pub use mock::{MockRepository, MockSession};
pub use predicate::{and, or, Predicate};
pub use provider::{FileSystem, Mock, Provider, ProviderId, Relational};
pub use query::{FetchOptions, ProjectionOptions, SortKey, Window};
pub use repository::{EntityStore, Repository, RepositoryExt};
pub use resolver::{
    construct, type_id_of, Constructor, RepositoryDeclaration, RepositoryImplementation,
    RepositoryRegistry,
};
pub use scenario::{
    reset_all_scoped, CollectionKey, Scenario, ScenarioData, ScenarioFactory, ScenarioInstance,
    Scoped, Transient,
};
pub use session::{OpenSession, Session, SessionBackend, SessionFactory};
pub use transaction::{Transaction, TransactionState};
pub use types::{SessionId, TransactionId};

/// Re-exported so implementors of [`SessionBackend`] and repository
/// interfaces can use the same attribute.
pub use async_trait::async_trait;

#[doc(hidden)]
pub mod __private {
    pub use inventory;
}
