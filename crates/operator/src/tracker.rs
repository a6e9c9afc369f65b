use std::sync::Mutex;

use game_core::{InstanceRef, Outcome};
use rustc_hash::FxHashMap;

#[derive(Debug, Default, Clone, Copy)]
struct Entry {
    failures: u32,
}

/// Host-side bookkeeping per game: whether this process has seen it and how
/// many transient failures it has hit in a row. The engine never reads this.
#[derive(Debug, Default)]
pub struct Tracker {
    entries: Mutex<FxHashMap<InstanceRef, Entry>>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time `r` is observed since process start.
    pub fn observe(&self, r: &InstanceRef) -> bool {
        let mut map = self.entries.lock().unwrap();
        if map.contains_key(r) {
            return false;
        }
        map.insert(r.clone(), Entry::default());
        true
    }

    /// Record an outcome; returns the current consecutive failure count.
    pub fn record(&self, r: &InstanceRef, outcome: &Outcome) -> u32 {
        let mut map = self.entries.lock().unwrap();
        let e = map.entry(r.clone()).or_default();
        if outcome.is_converged() {
            e.failures = 0;
        } else {
            e.failures = e.failures.saturating_add(1);
        }
        e.failures
    }

    pub fn forget(&self, r: &InstanceRef) {
        self.entries.lock().unwrap().remove(r);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
