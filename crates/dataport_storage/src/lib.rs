//! # Dataport Storage
//!
//! Document storage backends for Dataport.
//!
//! This crate provides the lowest-level persistence used by the file-system
//! provider. Backends are **opaque named-document stores** - they map a
//! document name to a byte payload and know nothing about entities,
//! sessions or transactions.
//!
//! ## Design Principles
//!
//! - Backends are simple document stores (load, store, remove, sync)
//! - A `store` replaces a document atomically; readers never see half a write
//! - Must be `Send + Sync` so a session can share one backend
//! - Dataport owns the payload format (see [`codec`])
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//! - [`FileBackend`] - One file per document inside a directory
//!
//! ## Example
//!
//! ```rust
//! use dataport_storage::{StorageBackend, InMemoryBackend};
//!
//! let backend = InMemoryBackend::new();
//! backend.store("persons", b"hello world").unwrap();
//! let data = backend.load("persons").unwrap();
//! assert_eq!(data.as_deref(), Some(&b"hello world"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
pub mod codec;
mod error;
mod file;
mod memory;

pub use backend::{validate_document_name, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use file::{FileBackend, DOCUMENT_EXTENSION};
pub use memory::InMemoryBackend;
