use crate::snapshot::SatelliteSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceQualityGrade {
    A,
    B,
    C,
    D,
    F,
}

/// A contiguous run of passing snapshots for one satellite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityWindow {
    pub sat_id: String,
    pub start_t: DateTime<Utc>,
    pub end_t: DateTime<Utc>,
    pub duration_minutes: f64,
    pub max_elevation_deg: f64,
    pub snapshots: Vec<SatelliteSnapshot>,
}

/// A `VisibilityWindow` that has additionally passed the duration and
/// position-count quorum gates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceWindow {
    pub sat_id: String,
    pub start_t: DateTime<Utc>,
    pub end_t: DateTime<Utc>,
    pub duration_minutes: f64,
    pub max_elevation_deg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityStatistics {
    pub sat_id: String,
    pub total_visible_minutes: f64,
    pub window_count: usize,
    pub max_elevation_deg: f64,
    pub next_pass_time: Option<DateTime<Utc>>,
    pub service_quality_grade: ServiceQualityGrade,
}
