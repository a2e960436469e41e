//! # Dataport Testkit
//!
//! Sample domain and test utilities for Dataport.
//!
//! This crate provides:
//! - A sample domain (`Person`, `Department`) with repository interfaces
//! - Mock and file-system implementations of those interfaces
//! - Sample scenarios for the mock provider
//! - Session fixtures with temporary storage
//! - Property-based test generators using proptest
//! - Tracing initialization for tests
//!
//! ## Usage
//!
//! ```rust
//! use dataport_testkit::prelude::*;
//!
//! let session = mock_session_with(CompanyScenario, std::sync::Arc::new(sample_registry())).unwrap();
//! let people = session.resolve_repository::<dyn PersonRepository>().unwrap();
//! assert_eq!(people.find_by_email("ada@example.com").unwrap().id, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod domain;
pub mod fixtures;
pub mod generators;
pub mod logging;
pub mod repositories;
pub mod scenarios;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::domain::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
    pub use crate::repositories::*;
    pub use crate::scenarios::*;
    pub use dataport_core::{Repository, RepositoryExt};
}

pub use domain::*;
pub use fixtures::*;
pub use generators::*;
pub use logging::*;
pub use repositories::*;
pub use scenarios::*;
