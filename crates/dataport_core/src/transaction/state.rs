//! Transaction state.

use crate::error::{CoreError, CoreResult};
use crate::session::Session;
use crate::types::TransactionId;
use tracing::{debug, warn};

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can be committed or rolled back.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    RolledBack,
}

/// A unit of work on a [`Session`].
///
/// Dropping an active transaction rolls it back.
///
/// # Example
///
/// ```
/// use dataport_core::{ScenarioFactory, SessionFactory, TransactionState};
/// # use dataport_core::{Scenario, ScenarioData, CoreResult};
/// # struct Empty;
/// # impl Scenario for Empty {
/// #     fn initialize_entities(&self, _: &ScenarioData) -> CoreResult<()> { Ok(()) }
/// # }
/// # ScenarioFactory::initialize(Empty).unwrap();
///
/// let session = SessionFactory::open_session().unwrap();
/// let mut txn = session.begin_transaction().unwrap();
/// txn.commit().unwrap();
/// assert_eq!(txn.state(), TransactionState::Committed);
/// assert!(txn.commit().is_err());
/// ```
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    state: TransactionState,
    session: Session,
}

impl Transaction {
    pub(crate) fn new(id: TransactionId, session: Session) -> Self {
        Self {
            id,
            state: TransactionState::Active,
            session,
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Returns the session this transaction belongs to.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Persists pending writes and marks the transaction committed.
    ///
    /// A stale handle returns `Ok(())` without touching the backend.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the transaction already finished, or
    /// the backend's error if persisting fails. On a persistence failure
    /// the transaction stays active so the caller can roll back.
    pub fn commit(&mut self) -> CoreResult<()> {
        self.ensure_active()?;
        if !self.session.is_current_transaction(self.id) {
            debug!(txn = %self.id, session = %self.session.id(), "ignoring commit of stale transaction");
            return Ok(());
        }

        self.session.backend().persist()?;
        self.finish(TransactionState::Committed);
        debug!(txn = %self.id, session = %self.session.id(), "transaction committed");
        Ok(())
    }

    /// Async form of [`commit`](Self::commit).
    ///
    /// # Errors
    ///
    /// Same as [`commit`](Self::commit).
    pub async fn commit_async(&mut self) -> CoreResult<()> {
        self.ensure_active()?;
        if !self.session.is_current_transaction(self.id) {
            debug!(txn = %self.id, session = %self.session.id(), "ignoring commit of stale transaction");
            return Ok(());
        }

        self.session.backend().persist_async().await?;
        self.finish(TransactionState::Committed);
        debug!(txn = %self.id, session = %self.session.id(), "transaction committed");
        Ok(())
    }

    /// Discards pending writes and marks the transaction rolled back.
    ///
    /// Rolling back twice is a no-op. A stale handle is only marked rolled
    /// back; the session's current transaction is left alone.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the transaction was committed, or the
    /// backend's error if discarding fails. The transaction is rolled back
    /// either way.
    pub fn rollback(&mut self) -> CoreResult<()> {
        match self.state {
            TransactionState::Committed => {
                return Err(CoreError::invalid_operation("transaction already committed"))
            }
            TransactionState::RolledBack => return Ok(()),
            TransactionState::Active => {}
        }

        if !self.session.is_current_transaction(self.id) {
            self.state = TransactionState::RolledBack;
            return Ok(());
        }

        let result = self.session.backend().discard();
        self.finish(TransactionState::RolledBack);
        debug!(txn = %self.id, session = %self.session.id(), "transaction rolled back");
        result
    }

    fn finish(&mut self, state: TransactionState) {
        self.state = state;
        self.session.release_transaction(self.id);
    }

    fn ensure_active(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(CoreError::invalid_operation(
                "transaction already committed",
            )),
            TransactionState::RolledBack => Err(CoreError::invalid_operation(
                "transaction already rolled back",
            )),
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.is_active() && self.session.is_current_transaction(self.id) {
            if let Err(err) = self.rollback() {
                warn!(txn = %self.id, error = %err, "rollback on drop failed");
            }
        }
    }
}
