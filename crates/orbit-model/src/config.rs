use crate::snapshot::GeodeticPosition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevationThresholds {
    pub starlink_deg: f64,
    pub oneweb_deg: f64,
    pub other_deg: f64,
}

impl Default for ElevationThresholds {
    fn default() -> Self {
        // spec.md §4.5 literal values take precedence over the original
        // Python constants (25/40 deg) - see DESIGN.md decision 4.
        Self {
            starlink_deg: 5.0,
            oneweb_deg: 10.0,
            other_deg: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RangeBoundsKm {
    pub min: f64,
    pub max: f64,
}

impl Default for RangeBoundsKm {
    fn default() -> Self {
        Self {
            min: 200.0,
            max: 2000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeographicBounds {
    pub min_lat_deg: f64,
    pub max_lat_deg: f64,
    pub min_lon_deg: f64,
    pub max_lon_deg: f64,
}

impl Default for GeographicBounds {
    fn default() -> Self {
        Self {
            min_lat_deg: -90.0,
            max_lat_deg: 90.0,
            min_lon_deg: -180.0,
            max_lon_deg: 180.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AhpWeights {
    pub signal: f64,
    pub geometry: f64,
    pub stability: f64,
}

impl Default for AhpWeights {
    fn default() -> Self {
        Self {
            signal: 0.5,
            geometry: 0.3,
            stability: 0.2,
        }
    }
}

impl AhpWeights {
    pub fn sum(&self) -> f64 {
        self.signal + self.geometry + self.stability
    }

    pub fn is_normalised(&self) -> bool {
        (self.sum() - 1.0).abs() < 1e-9
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EventThresholds {
    pub a4_dbm: f64,
    pub a5_t1_dbm: f64,
    pub a5_t2_dbm: f64,
    pub d2_t1_km: f64,
    pub d2_t2_km: f64,
    pub hys_db: f64,
    pub hys_km: f64,
    pub ttt_ms: u64,
}

impl Default for EventThresholds {
    fn default() -> Self {
        Self {
            a4_dbm: -100.0,
            a5_t1_dbm: -110.0,
            a5_t2_dbm: -95.0,
            d2_t1_km: 1500.0,
            d2_t2_km: 2000.0,
            hys_db: 2.0,
            hys_km: 50.0,
            ttt_ms: 640,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolTarget {
    pub min: u32,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolTargets {
    pub starlink: PoolTarget,
    pub oneweb: PoolTarget,
}

impl Default for PoolTargets {
    fn default() -> Self {
        Self {
            starlink: PoolTarget {
                min: 10,
                max: None,
            },
            oneweb: PoolTarget { min: 3, max: None },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoverageThresholds {
    pub starlink: f64,
    pub oneweb: f64,
}

impl Default for CoverageThresholds {
    fn default() -> Self {
        Self {
            starlink: 0.95,
            oneweb: 0.85,
        }
    }
}

/// Full recognised configuration surface, per SPEC_FULL.md §6. Every field
/// has a spec-documented default so a bare `{}` config file is valid.
/// Not enumerated among the named "configuration keys" in SPEC_FULL.md §6
/// (which lists filter/threshold knobs only), but C3's geometry contract is
/// unusable without one - every scenario in spec.md §8 states it explicitly
/// (e.g. S1's "observer at (24.9441N, 121.3714E, 35m)"). Defaults to that
/// NTPU coordinate so a bare `{}` config still runs end-to-end.
fn default_observer() -> GeodeticPosition {
    GeodeticPosition {
        lat_deg: 24.9441,
        lon_deg: 121.3714,
        alt_km: 0.035,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sampling_interval_s: f64,
    #[serde(default = "default_observer")]
    pub observer: GeodeticPosition,
    pub elevation_thresholds: ElevationThresholds,
    pub range_bounds_km: RangeBoundsKm,
    pub geographic_bounds: GeographicBounds,
    pub min_service_window_minutes: f64,
    pub min_feasibility_score: f64,
    pub ahp_weights: AhpWeights,
    pub event_thresholds: EventThresholds,
    pub pool_targets: PoolTargets,
    pub coverage_thresholds: CoverageThresholds,
    pub workers: usize,
    pub observation_window_minutes: f64,
    /// Pins the serving satellite used by event detection (C8) instead of
    /// the default max-RSRP heuristic. A3/A4/D2 are symmetric in the
    /// serving/neighbor roles they scan, but A5 is a dual-threshold gate on
    /// a *specific* serving link and is unreachable from the max-RSRP
    /// default whenever the intended serving satellite isn't the
    /// strongest one in view.
    pub serving_sat_id: Option<String>,
    /// Extra unrecognised keys are preserved so they can be echoed back
    /// into output `metadata` without being silently dropped.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sampling_interval_s: 30.0,
            observer: default_observer(),
            elevation_thresholds: ElevationThresholds::default(),
            range_bounds_km: RangeBoundsKm::default(),
            geographic_bounds: GeographicBounds::default(),
            min_service_window_minutes: 2.0,
            min_feasibility_score: 0.6,
            ahp_weights: AhpWeights::default(),
            event_thresholds: EventThresholds::default(),
            pool_targets: PoolTargets::default(),
            coverage_thresholds: CoverageThresholds::default(),
            workers: 8,
            observation_window_minutes: 120.0,
            serving_sat_id: None,
            extra: BTreeMap::new(),
        }
    }
}
