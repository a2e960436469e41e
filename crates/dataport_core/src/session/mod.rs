//! Data sessions.
//!
//! A [`Session`] is the entry point for a unit of work: it carries the
//! provider backend, resolves repositories bound to itself, and owns at
//! most one active [`Transaction`].

mod factory;
#[cfg(test)]
pub(crate) mod testing;

pub use factory::SessionFactory;

use crate::config::SessionConfig;
use crate::error::{short_type_name, CoreError, CoreResult};
use crate::provider::ProviderId;
use crate::resolver::RepositoryRegistry;
use crate::transaction::Transaction;
use crate::types::{SessionId, TransactionId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Provider-specific half of a session.
///
/// Backends hold whatever connection or staging state their provider
/// needs. Repositories written for a provider reach their backend through
/// [`Session::backend_as`].
#[async_trait]
pub trait SessionBackend: Any + Send + Sync {
    /// Returns the provider this backend talks to.
    fn provider(&self) -> ProviderId;

    /// Makes pending writes durable.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if writes cannot be persisted.
    fn persist(&self) -> CoreResult<()>;

    /// Async form of [`persist`](Self::persist).
    ///
    /// # Errors
    ///
    /// Same as [`persist`](Self::persist).
    async fn persist_async(&self) -> CoreResult<()> {
        self.persist()
    }

    /// Drops pending writes.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if pending state cannot be released.
    fn discard(&self) -> CoreResult<()>;

    /// Returns `self` as [`Any`] for narrowing to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Returns the short name of the concrete backend type.
    fn type_name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

/// A backend that can be constructed from configuration alone.
///
/// Session types registered with [`SessionFactory`] implement this.
pub trait OpenSession: SessionBackend + Sized {
    /// Opens a backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is incomplete or the store
    /// cannot be reached.
    fn open(config: &SessionConfig) -> CoreResult<Self>;
}

struct SessionShared {
    id: SessionId,
    backend: Box<dyn SessionBackend>,
    config: SessionConfig,
    registry: Arc<RepositoryRegistry>,
    active: Mutex<Option<TransactionId>>,
    next_txid: AtomicU64,
    disposed: AtomicBool,
}

impl SessionShared {
    fn release_pending(&self) {
        let pending = self.active.lock().take();
        if let Some(txn) = pending {
            if let Err(err) = self.backend.discard() {
                warn!(session = %self.id, %txn, error = %err, "discarding pending transaction failed");
            } else {
                debug!(session = %self.id, %txn, "discarded pending transaction");
            }
        }
    }
}

impl Drop for SessionShared {
    fn drop(&mut self) {
        self.release_pending();
        debug!(session = %self.id, "session closed");
    }
}

/// A data session.
///
/// `Session` is a cheap handle: clones share the same backend and
/// transaction slot. A transaction holds a handle too, so pending state
/// outlives every other handle until the transaction is finished or
/// dropped. Repositories are not cached; every resolution builds a fresh
/// instance bound to this session.
#[derive(Clone)]
pub struct Session {
    shared: Arc<SessionShared>,
}

impl Session {
    /// Wraps a backend in a session that resolves through the global registry.
    pub fn new<B: SessionBackend>(backend: B, config: SessionConfig) -> Self {
        Self::with_registry(backend, config, RepositoryRegistry::global())
    }

    /// Wraps a backend in a session that resolves through `registry`.
    pub fn with_registry<B: SessionBackend>(
        backend: B,
        config: SessionConfig,
        registry: Arc<RepositoryRegistry>,
    ) -> Self {
        let id = SessionId::next();
        debug!(session = %id, backend = backend.type_name(), provider = %backend.provider(), "session opened");
        Self {
            shared: Arc::new(SessionShared {
                id,
                backend: Box::new(backend),
                config,
                registry,
                active: Mutex::new(None),
                next_txid: AtomicU64::new(1),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the session ID.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.shared.id
    }

    /// Returns the provider of the backend.
    #[must_use]
    pub fn provider(&self) -> ProviderId {
        self.shared.backend.provider()
    }

    /// Returns the configuration the session was opened with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Returns the registry used for repository resolution.
    #[must_use]
    pub fn registry(&self) -> &Arc<RepositoryRegistry> {
        &self.shared.registry
    }

    /// Returns the backend.
    #[must_use]
    pub fn backend(&self) -> &dyn SessionBackend {
        self.shared.backend.as_ref()
    }

    /// Narrows the backend to its concrete type.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the backend is not a `T`.
    pub fn backend_as<T: SessionBackend>(&self) -> CoreResult<&T> {
        self.try_backend_as::<T>().ok_or_else(|| {
            CoreError::type_mismatch(short_type_name::<T>(), self.shared.backend.type_name())
        })
    }

    /// Narrows the backend to its concrete type, if it is a `T`.
    #[must_use]
    pub fn try_backend_as<T: SessionBackend>(&self) -> Option<&T> {
        self.shared.backend.as_any().downcast_ref::<T>()
    }

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if a transaction is already active or the
    /// session was disposed. The already-active transaction is unaffected.
    pub fn begin_transaction(&self) -> CoreResult<Transaction> {
        if self.is_disposed() {
            return Err(CoreError::invalid_operation("session disposed"));
        }

        let mut active = self.shared.active.lock();
        if let Some(current) = *active {
            return Err(CoreError::invalid_operation(format!(
                "{current} already active on {}",
                self.shared.id
            )));
        }

        let id = TransactionId::new(self.shared.next_txid.fetch_add(1, Ordering::Relaxed));
        *active = Some(id);
        debug!(session = %self.shared.id, txn = %id, "transaction started");
        Ok(Transaction::new(id, self.clone()))
    }

    /// Returns the active transaction, if any.
    #[must_use]
    pub fn transaction(&self) -> Option<TransactionId> {
        *self.shared.active.lock()
    }

    /// Resolves a repository interface for this session's provider.
    ///
    /// # Errors
    ///
    /// Returns a resolution error when no implementation, or more than
    /// one, is registered for the provider, and `TypeMismatch` if the
    /// constructed repository is not an `R`.
    pub fn resolve_repository<R: ?Sized + 'static>(&self) -> CoreResult<Box<R>> {
        self.shared.registry.resolve::<R>(self)
    }

    /// Persists pending writes when no transaction is active.
    ///
    /// Repositories call this after each write so that writes outside a
    /// transaction behave as auto-committed.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if persisting fails.
    pub fn auto_commit(&self) -> CoreResult<()> {
        if self.transaction().is_some() {
            return Ok(());
        }
        self.shared.backend.persist()
    }

    /// Async form of [`auto_commit`](Self::auto_commit).
    ///
    /// # Errors
    ///
    /// Same as [`auto_commit`](Self::auto_commit).
    pub async fn auto_commit_async(&self) -> CoreResult<()> {
        if self.transaction().is_some() {
            return Ok(());
        }
        self.shared.backend.persist_async().await
    }

    /// Releases pending transaction state.
    ///
    /// An active transaction is discarded and its handle becomes stale.
    /// Further `begin_transaction` calls fail. Safe to call repeatedly.
    pub fn dispose(&self) {
        if !self.shared.disposed.swap(true, Ordering::AcqRel) {
            debug!(session = %self.shared.id, "session disposed");
        }
        self.shared.release_pending();
    }

    /// Returns true if [`dispose`](Self::dispose) was called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }

    pub(crate) fn is_current_transaction(&self, id: TransactionId) -> bool {
        *self.shared.active.lock() == Some(id)
    }

    pub(crate) fn release_transaction(&self, id: TransactionId) {
        let mut active = self.shared.active.lock();
        if *active == Some(id) {
            *active = None;
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.shared.id)
            .field("backend", &self.shared.backend.type_name())
            .field("provider", &self.provider())
            .field("transaction", &self.transaction())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingBackend;
    use super::*;
    use crate::error::ErrorKind;
    use crate::provider::Mock;

    struct OtherBackend;

    impl SessionBackend for OtherBackend {
        fn provider(&self) -> ProviderId {
            ProviderId::of::<Mock>()
        }

        fn persist(&self) -> CoreResult<()> {
            Ok(())
        }

        fn discard(&self) -> CoreResult<()> {
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn session() -> (Session, RecordingBackend) {
        let backend = RecordingBackend::default();
        (Session::new(backend.clone(), SessionConfig::default()), backend)
    }

    #[test]
    fn sessions_have_distinct_ids() {
        let (a, _) = session();
        let (b, _) = session();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn second_begin_is_rejected() {
        let (session, _) = session();
        let first = session.begin_transaction().unwrap();

        let err = session.begin_transaction().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert_eq!(session.transaction(), Some(first.id()));
    }

    #[test]
    fn transaction_ids_increase() {
        let (session, _) = session();
        let mut first = session.begin_transaction().unwrap();
        first.commit().unwrap();
        let second = session.begin_transaction().unwrap();
        assert!(second.id() > first.id());
    }

    #[test]
    fn backend_as_narrows_exact_type() {
        let (session, _) = session();
        assert!(session.backend_as::<RecordingBackend>().is_ok());
        assert!(session.try_backend_as::<OtherBackend>().is_none());

        let err = session.backend_as::<OtherBackend>().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(err.to_string().contains("OtherBackend"));
        assert!(err.to_string().contains("RecordingBackend"));
    }

    #[test]
    fn auto_commit_only_without_transaction() {
        let (session, backend) = session();
        session.auto_commit().unwrap();
        assert_eq!(backend.persists(), 1);

        let _txn = session.begin_transaction().unwrap();
        session.auto_commit().unwrap();
        assert_eq!(backend.persists(), 1);
    }

    #[test]
    fn dispose_discards_pending_transaction() {
        let (session, backend) = session();
        let _txn = session.begin_transaction().unwrap();

        session.dispose();
        session.dispose();

        assert!(session.is_disposed());
        assert_eq!(session.transaction(), None);
        assert_eq!(backend.discards(), 1);
        assert_eq!(
            session.begin_transaction().unwrap_err().kind(),
            ErrorKind::InvalidOperation
        );
    }

    #[test]
    fn dropping_last_handle_releases_pending_state() {
        let (session, backend) = session();
        *session.shared.active.lock() = Some(TransactionId::new(7));

        let clone = session.clone();
        drop(session);
        assert_eq!(backend.discards(), 0);

        drop(clone);
        assert_eq!(backend.discards(), 1);
    }

    #[test]
    fn transaction_outliving_its_session_discards_once() {
        let (session, backend) = session();
        let txn = session.begin_transaction().unwrap();

        drop(session);
        assert_eq!(backend.discards(), 0);

        drop(txn);
        assert_eq!(backend.discards(), 1);
    }

    #[test]
    fn debug_names_backend() {
        let (session, _) = session();
        let rendered = format!("{session:?}");
        assert!(rendered.contains("RecordingBackend"));
    }
}
