//! Per-operation counters for a store
//!
//! Counters are plain `AtomicU64`s with relaxed ordering: they are used to
//! assert how many round-trips an operation cost, not to synchronize.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live operation counters
#[derive(Debug, Default)]
pub struct QueryStats {
    selects: AtomicU64,
    counts: AtomicU64,
    inserts: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
}

/// Point-in-time copy of [`QueryStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Selects started
    pub selects: u64,
    /// Counts executed
    pub counts: u64,
    /// Rows inserted
    pub inserts: u64,
    /// Update statements executed
    pub updates: u64,
    /// Delete statements executed
    pub deletes: u64,
}

impl StatsSnapshot {
    /// Read round-trips (selects + counts)
    pub fn reads(&self) -> u64 {
        self.selects + self.counts
    }

    /// Write round-trips (inserts + updates + deletes)
    pub fn writes(&self) -> u64 {
        self.inserts + self.updates + self.deletes
    }

    /// All round-trips
    pub fn total(&self) -> u64 {
        self.reads() + self.writes()
    }
}

impl QueryStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_select(&self) {
        self.selects.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_count(&self) {
        self.counts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    /// Read round-trips so far
    pub fn reads(&self) -> u64 {
        self.snapshot().reads()
    }

    /// Copy the current values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            selects: self.selects.load(Ordering::Relaxed),
            counts: self.counts.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        for counter in [
            &self.selects,
            &self.counts,
            &self.inserts,
            &self.updates,
            &self.deletes,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
