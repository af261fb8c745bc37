//! Process-wide cache of the latest scrape result.
//!
//! Readers take an `Arc` to an immutable [`Snapshot`]; a completed run swaps
//! in a new one. The in-progress flag serialises whole runs, not steps.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::types::record::GroupDataset;

/// The current dataset and when it was committed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub datasets: Vec<GroupDataset>,

    /// `None` until the first commit
    pub last_updated: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

/// Holds exactly one dataset, one timestamp and the run gate.
#[derive(Debug, Default)]
pub struct Store {
    current: RwLock<Arc<Snapshot>>,
    running: AtomicBool,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the run gate. `None` when another run holds it.
    ///
    /// The gate is released when the returned guard is dropped, whether or
    /// not it committed.
    pub fn begin_run(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard { store: self })
    }

    /// True while a run holds the gate.
    pub fn in_progress(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// The current snapshot. Cheap; never blocks on a running scrape.
    pub fn read(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, snapshot: Snapshot) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
    }
}

/// Proof that the holder owns the run gate.
#[derive(Debug)]
pub struct RunGuard<'a> {
    store: &'a Store,
}

impl RunGuard<'_> {
    /// Replace the whole dataset and timestamp. Never merges.
    pub fn commit(&self, datasets: Vec<GroupDataset>, at: DateTime<Utc>) {
        self.store.replace(Snapshot {
            datasets,
            last_updated: Some(at),
        });
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.store.running.store(false, Ordering::Release);
    }
}
