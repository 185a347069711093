//! Scripted store failures
//!
//! Lets tests make the next call of a given operation fail, or make a
//! select cursor fail part-way through, to check that callers leave their
//! state untouched when the backend errors.

use docmap_core::StoreError;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Store operation kinds a failure can be armed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// `select`
    Select,
    /// `count`
    Count,
    /// `insert`
    Insert,
    /// `update`
    Update,
    /// `delete`
    Delete,
}

/// One-shot failures, consumed by the next matching call
#[derive(Debug, Default)]
pub struct FaultInjector {
    pending: Mutex<FxHashMap<StoreOp, StoreError>>,
    row_failure: Mutex<Option<(usize, StoreError)>>,
}

impl FaultInjector {
    /// Create an injector with nothing armed
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `op` call fail with `error`
    pub fn fail_next(&self, op: StoreOp, error: StoreError) {
        self.pending.lock().insert(op, error);
    }

    /// Make the next select cursor fail after yielding `rows` rows
    pub fn fail_cursor_after(&self, rows: usize, error: StoreError) {
        *self.row_failure.lock() = Some((rows, error));
    }

    /// Disarm everything
    pub fn clear(&self) {
        self.pending.lock().clear();
        *self.row_failure.lock() = None;
    }

    pub(crate) fn take(&self, op: StoreOp) -> Option<StoreError> {
        self.pending.lock().remove(&op)
    }

    pub(crate) fn take_cursor_failure(&self) -> Option<(usize, StoreError)> {
        self.row_failure.lock().take()
    }
}
