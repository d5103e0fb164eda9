use crate::snapshot::SatelliteSnapshot;
use crate::tle::Constellation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A satellite's full time series, spanning at least one orbital period of
/// its constellation. Snapshots are ordered by `t` and never mutated once
/// produced by C2 - downstream stages filter, they do not rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteTimeSeries {
    pub sat_id: String,
    pub constellation: Constellation,
    pub epoch: DateTime<Utc>,
    pub sampling_interval_s: f64,
    pub snapshots: Vec<SatelliteSnapshot>,
}

impl SatelliteTimeSeries {
    pub fn span_minutes(&self) -> Option<f64> {
        let first = self.snapshots.first()?.t;
        let last = self.snapshots.last()?.t;
        Some((last - first).num_milliseconds() as f64 / 60_000.0)
    }

    pub fn visible_snapshots(&self) -> impl Iterator<Item = &SatelliteSnapshot> {
        self.snapshots.iter().filter(|s| s.is_connectable())
    }
}
