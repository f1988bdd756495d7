//! Ephemeral handoff of the scored submission to the results view.

use std::sync::{Mutex, MutexGuard, PoisonError};

use shared::protocol::ResultPayload;

/// Single-slot holder scoped to the running front-end, never the durable store.
///
/// `get` returning `None` is the normal "nothing to show" state.
pub trait ResultsHolder: Send + Sync {
    fn set(&self, payload: ResultPayload);
    fn get(&self) -> Option<ResultPayload>;
    fn clear(&self);
}

#[derive(Default)]
pub struct MemoryResultsHolder {
    slot: Mutex<Option<ResultPayload>>,
}

impl MemoryResultsHolder {
    fn slot(&self) -> MutexGuard<'_, Option<ResultPayload>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResultsHolder for MemoryResultsHolder {
    fn set(&self, payload: ResultPayload) {
        *self.slot() = Some(payload);
    }

    fn get(&self) -> Option<ResultPayload> {
        self.slot().clone()
    }

    fn clear(&self) {
        self.slot().take();
    }
}
