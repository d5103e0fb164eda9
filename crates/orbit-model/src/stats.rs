use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-stage counters. The only concurrent writers during a stage are these
/// atomics; everything else is either read-only shared state or produced by
/// a single worker and handed off without locking.
#[derive(Debug, Default)]
pub struct StatsCollector {
    pub satellites_in: AtomicU64,
    pub satellites_out: AtomicU64,
    pub propagation_failures: AtomicU64,
    pub frame_transform_failures: AtomicU64,
    pub snapshots_produced: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_satellites_in(&self, n: u64) {
        self.satellites_in.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_satellites_out(&self) {
        self.satellites_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_propagation_failure(&self) {
        self.propagation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_frame_transform_failure(&self) {
        self.frame_transform_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_snapshots(&self, n: u64) {
        self.snapshots_produced.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            satellites_in: self.satellites_in.load(Ordering::Relaxed),
            satellites_out: self.satellites_out.load(Ordering::Relaxed),
            propagation_failures: self.propagation_failures.load(Ordering::Relaxed),
            frame_transform_failures: self.frame_transform_failures.load(Ordering::Relaxed),
            snapshots_produced: self.snapshots_produced.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatsSnapshot {
    pub satellites_in: u64,
    pub satellites_out: u64,
    pub propagation_failures: u64,
    pub frame_transform_failures: u64,
    pub snapshots_produced: u64,
}
