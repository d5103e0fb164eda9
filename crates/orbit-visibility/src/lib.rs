//! Elevation/range/geographic visibility gates and pass-window extraction.
//! Grounded on `original_source/visibility_filter.py`'s gate ordering and
//! window/service-window/statistics pipeline.

use orbit_model::config::PipelineConfig;
use orbit_model::{
    Constellation, SatelliteSnapshot, SatelliteTimeSeries, ServiceQualityGrade, ServiceWindow,
    VisibilityFlags, VisibilityStatistics, VisibilityWindow,
};

/// Minimum number of snapshots a visibility window must contain to become
/// a service window, alongside the duration gate.
const MIN_SERVICE_WINDOW_SNAPSHOTS: usize = 3;

fn elevation_threshold_deg(config: &PipelineConfig, constellation: Constellation) -> f64 {
    match constellation {
        Constellation::Starlink => config.elevation_thresholds.starlink_deg,
        Constellation::Oneweb => config.elevation_thresholds.oneweb_deg,
        Constellation::Other => config.elevation_thresholds.other_deg,
    }
}

/// Applies the three gates in order - elevation, then range, then
/// geographic bounds - to every snapshot in `series`, setting each
/// snapshot's `visibility_flags` in place. Earlier failures still compute
/// later flags (the gates are independent booleans); "skip later work" in
/// the spec refers to not bothering with signal/link computation once a
/// snapshot has already failed, which downstream stages enforce by reading
/// `is_connectable()` before doing further work.
pub fn apply_visibility_gates(series: &mut SatelliteTimeSeries, config: &PipelineConfig) {
    let threshold = elevation_threshold_deg(config, series.constellation);
    for snapshot in &mut series.snapshots {
        snapshot.visibility_flags = gate_snapshot(snapshot, config, threshold);
    }
}

fn gate_snapshot(
    snapshot: &SatelliteSnapshot,
    config: &PipelineConfig,
    elevation_threshold_deg: f64,
) -> VisibilityFlags {
    let Some(angles) = snapshot.look_angles else {
        return VisibilityFlags::default();
    };

    let elevation_ok = angles.elevation_deg >= elevation_threshold_deg;
    let range_ok = angles.range_km >= config.range_bounds_km.min
        && angles.range_km <= config.range_bounds_km.max;

    let geographic_ok = match snapshot.position_wgs84 {
        Some(pos) => {
            let b = config.geographic_bounds;
            pos.lat_deg >= b.min_lat_deg
                && pos.lat_deg <= b.max_lat_deg
                && pos.lon_deg >= b.min_lon_deg
                && pos.lon_deg <= b.max_lon_deg
        }
        None => false,
    };

    VisibilityFlags {
        elevation_ok,
        range_ok,
        geographic_ok,
    }
}

/// Coalesces consecutive passing snapshots into visibility windows.
pub fn extract_visibility_windows(series: &SatelliteTimeSeries) -> Vec<VisibilityWindow> {
    let mut windows = Vec::new();
    let mut current: Vec<SatelliteSnapshot> = Vec::new();

    for snapshot in &series.snapshots {
        if snapshot.is_connectable() {
            current.push(snapshot.clone());
        } else if !current.is_empty() {
            windows.push(close_window(&series.sat_id, std::mem::take(&mut current)));
        }
    }
    if !current.is_empty() {
        windows.push(close_window(&series.sat_id, current));
    }

    windows
}

fn close_window(sat_id: &str, snapshots: Vec<SatelliteSnapshot>) -> VisibilityWindow {
    let start_t = snapshots.first().expect("non-empty").t;
    let end_t = snapshots.last().expect("non-empty").t;
    let duration_minutes = (end_t - start_t).num_milliseconds() as f64 / 60_000.0;
    let max_elevation_deg = snapshots
        .iter()
        .filter_map(|s| s.look_angles.map(|a| a.elevation_deg))
        .fold(f64::MIN, f64::max);

    VisibilityWindow {
        sat_id: sat_id.to_string(),
        start_t,
        end_t,
        duration_minutes,
        max_elevation_deg,
        snapshots,
    }
}

/// Service windows require `duration_minutes >= min_service_window_minutes`
/// (default 2.0) and `|snapshots| >= 3`.
pub fn filter_service_windows(
    windows: &[VisibilityWindow],
    config: &PipelineConfig,
) -> Vec<ServiceWindow> {
    windows
        .iter()
        .filter(|w| {
            w.duration_minutes >= config.min_service_window_minutes
                && w.snapshots.len() >= MIN_SERVICE_WINDOW_SNAPSHOTS
        })
        .map(|w| ServiceWindow {
            sat_id: w.sat_id.clone(),
            start_t: w.start_t,
            end_t: w.end_t,
            duration_minutes: w.duration_minutes,
            max_elevation_deg: w.max_elevation_deg,
        })
        .collect()
}

/// Computes per-satellite visibility statistics, including the A-F quality
/// grade rubric from SPEC_FULL.md §4.5.
pub fn compute_statistics(sat_id: &str, windows: &[VisibilityWindow]) -> VisibilityStatistics {
    let total_visible_minutes: f64 = windows.iter().map(|w| w.duration_minutes).sum();
    let window_count = windows.len();
    let max_elevation_deg = windows
        .iter()
        .map(|w| w.max_elevation_deg)
        .fold(f64::MIN, f64::max);
    let next_pass_time = windows.first().map(|w| w.start_t);

    let avg_window_minutes = if window_count > 0 {
        total_visible_minutes / window_count as f64
    } else {
        0.0
    };
    let coverage_over_24h = total_visible_minutes / (24.0 * 60.0);

    let grade = grade_for(avg_window_minutes, coverage_over_24h);

    VisibilityStatistics {
        sat_id: sat_id.to_string(),
        total_visible_minutes,
        window_count,
        max_elevation_deg: if max_elevation_deg == f64::MIN {
            0.0
        } else {
            max_elevation_deg
        },
        next_pass_time,
        service_quality_grade: grade,
    }
}

fn grade_for(avg_window_minutes: f64, coverage_over_24h: f64) -> ServiceQualityGrade {
    if avg_window_minutes >= 10.0 && coverage_over_24h >= 0.15 {
        ServiceQualityGrade::A
    } else if avg_window_minutes >= 7.0 && coverage_over_24h >= 0.10 {
        ServiceQualityGrade::B
    } else if avg_window_minutes >= 5.0 && coverage_over_24h >= 0.05 {
        ServiceQualityGrade::C
    } else if avg_window_minutes >= 3.0 && coverage_over_24h >= 0.02 {
        ServiceQualityGrade::D
    } else {
        ServiceQualityGrade::F
    }
}
