//! Transactions bound to a data session.
//!
//! A session owns at most one active transaction. Committing asks the
//! session's backend to persist pending writes; rolling back asks it to
//! discard them. A handle that is no longer the session's active
//! transaction (for example after the session was disposed) is stale and
//! its commit has no effect.

mod state;

pub use state::{Transaction, TransactionState};
