//! Weighted composite link-feasibility scoring. Grounded on
//! `candidate-selector::scorer`'s explicit-weight-constant,
//! sub-score-then-compose style.

use orbit_model::config::{AhpWeights, PipelineConfig};
use orbit_model::SatelliteSnapshot;

/// Optimal distance band for the geometry sub-score, km.
const OPTIMAL_DISTANCE_MIN_KM: f64 = 500.0;
const OPTIMAL_DISTANCE_MAX_KM: f64 = 1500.0;

const RSRP_MIN_DBM: f64 = -120.0;
const RSRP_MAX_DBM: f64 = -60.0;
const SINR_MIN_DB: f64 = -10.0;
const SINR_MAX_DB: f64 = 30.0;
const LINK_MARGIN_REFERENCE_DB: f64 = 50.0;

#[derive(Debug, Clone, Copy)]
pub struct LinkScore {
    pub signal: f64,
    pub geometry: f64,
    pub stability: f64,
    pub overall: f64,
}

fn normalise(value: f64, min: f64, max: f64) -> f64 {
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

fn signal_subscore(snapshot: &SatelliteSnapshot) -> f64 {
    snapshot
        .rsrp_dbm
        .map(|rsrp| normalise(rsrp, RSRP_MIN_DBM, RSRP_MAX_DBM))
        .unwrap_or(0.0)
}

/// Combines elevation (higher is better) and proximity to the optimal
/// 500-1500 km distance band.
fn geometry_subscore(snapshot: &SatelliteSnapshot) -> f64 {
    let Some(angles) = snapshot.look_angles else {
        return 0.0;
    };
    let elevation_score = normalise(angles.elevation_deg, 0.0, 90.0);

    let distance_score = if angles.range_km < OPTIMAL_DISTANCE_MIN_KM {
        normalise(angles.range_km, 0.0, OPTIMAL_DISTANCE_MIN_KM)
    } else if angles.range_km > OPTIMAL_DISTANCE_MAX_KM {
        1.0 - normalise(angles.range_km, OPTIMAL_DISTANCE_MAX_KM, OPTIMAL_DISTANCE_MAX_KM * 2.0)
    } else {
        1.0
    };

    (elevation_score + distance_score.clamp(0.0, 1.0)) / 2.0
}

fn stability_subscore(snapshot: &SatelliteSnapshot) -> f64 {
    let sinr_score = snapshot
        .sinr_db
        .map(|s| normalise(s, SINR_MIN_DB, SINR_MAX_DB))
        .unwrap_or(0.0);
    let margin_score = snapshot
        .link_margin_db
        .map(|m| normalise(m, 0.0, LINK_MARGIN_REFERENCE_DB))
        .unwrap_or(0.0);
    (sinr_score + margin_score) / 2.0
}

pub fn score_snapshot(snapshot: &SatelliteSnapshot, weights: AhpWeights) -> LinkScore {
    let signal = signal_subscore(snapshot);
    let geometry = geometry_subscore(snapshot);
    let stability = stability_subscore(snapshot);
    let overall = weights.signal * signal + weights.geometry * geometry + weights.stability * stability;

    LinkScore {
        signal,
        geometry,
        stability,
        overall,
    }
}

/// A satellite is feasible iff its composite score clears
/// `min_feasibility_score` (default 0.6) and its accumulated service-window
/// duration clears `min_service_window_minutes`.
pub fn is_feasible(score: &LinkScore, service_window_minutes_sum: f64, config: &PipelineConfig) -> bool {
    score.overall >= config.min_feasibility_score
        && service_window_minutes_sum >= config.min_service_window_minutes
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_model::{GeodeticPosition, LookAngles, Vec3, VisibilityFlags};
    use chrono::{TimeZone, Utc};

    fn snapshot(rsrp: f64, sinr: f64, margin: f64, elevation: f64, range: f64) -> SatelliteSnapshot {
        SatelliteSnapshot {
            sat_id: "sat-1".to_string(),
            t: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            position_teme: Vec3::new(0.0, 0.0, 0.0),
            velocity_teme: Vec3::new(0.0, 0.0, 0.0),
            position_itrf: None,
            position_wgs84: Some(GeodeticPosition {
                lat_deg: 0.0,
                lon_deg: 0.0,
                alt_km: 550.0,
            }),
            look_angles: Some(LookAngles {
                elevation_deg: elevation,
                azimuth_deg: 0.0,
                range_km: range,
            }),
            visibility_flags: VisibilityFlags::default(),
            rsrp_dbm: Some(rsrp),
            sinr_db: Some(sinr),
            rsrq_db: None,
            link_margin_db: Some(margin),
        }
    }

    #[test]
    fn ahp_weights_sum_to_one() {
        let weights = AhpWeights::default();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
        assert!(weights.is_normalised());
    }

    #[test]
    fn strong_signal_scores_higher_than_weak() {
        let strong = snapshot(-65.0, 25.0, 45.0, 60.0, 900.0);
        let weak = snapshot(-118.0, -8.0, 2.0, 6.0, 1950.0);
        let weights = AhpWeights::default();
        let strong_score = score_snapshot(&strong, weights);
        let weak_score = score_snapshot(&weak, weights);
        assert!(strong_score.overall > weak_score.overall);
    }

    #[test]
    fn feasibility_requires_both_score_and_window_gates() {
        let strong = snapshot(-65.0, 25.0, 45.0, 60.0, 900.0);
        let weights = AhpWeights::default();
        let score = score_snapshot(&strong, weights);
        let config = PipelineConfig::default();
        assert!(is_feasible(&score, 5.0, &config));
        assert!(!is_feasible(&score, 0.5, &config));
    }
}
