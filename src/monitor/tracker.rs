//! State tracker: the single previous observed state, exchanged under a lock.

use std::sync::Mutex;

use tracing::warn;

use crate::types::ObservedState;

/// Holds the last committed [`ObservedState`].
///
/// The only mutation is [`exchange`](Self::exchange), which swaps in the new
/// state and hands back the old one in a single critical section. Overlapping
/// check cycles therefore see a strict chain: the previous state returned to
/// cycle N is exactly what cycle N-1 committed.
#[derive(Debug, Default)]
pub struct StateTracker {
    state: Mutex<ObservedState>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit `next` and return the state it replaced. Never fails.
    pub fn exchange(&self, next: ObservedState) -> ObservedState {
        let mut guard = self.state.lock().unwrap_or_else(|e| {
            warn!("State tracker mutex poisoned, recovering");
            e.into_inner()
        });
        std::mem::replace(&mut *guard, next)
    }

    /// Snapshot of the committed state.
    pub fn current(&self) -> ObservedState {
        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
