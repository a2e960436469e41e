//! Backend that records calls, for unit tests.

use super::SessionBackend;
use crate::error::{CoreError, CoreResult};
use crate::provider::{Mock, ProviderId};
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Calls {
    persists: AtomicUsize,
    discards: AtomicUsize,
    fail_persist: AtomicBool,
    fail_discard: AtomicBool,
}

/// Counts persist and discard calls; clones share counters.
#[derive(Clone, Default)]
pub(crate) struct RecordingBackend {
    calls: Arc<Calls>,
}

impl RecordingBackend {
    pub(crate) fn persists(&self) -> usize {
        self.calls.persists.load(Ordering::SeqCst)
    }

    pub(crate) fn discards(&self) -> usize {
        self.calls.discards.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_next_persist(&self) {
        self.calls.fail_persist.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_next_discard(&self) {
        self.calls.fail_discard.store(true, Ordering::SeqCst);
    }
}

impl SessionBackend for RecordingBackend {
    fn provider(&self) -> ProviderId {
        ProviderId::of::<Mock>()
    }

    fn persist(&self) -> CoreResult<()> {
        if self.calls.fail_persist.swap(false, Ordering::SeqCst) {
            return Err(CoreError::state("persist failed"));
        }
        self.calls.persists.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn discard(&self) -> CoreResult<()> {
        if self.calls.fail_discard.swap(false, Ordering::SeqCst) {
            return Err(CoreError::state("discard failed"));
        }
        self.calls.discards.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
