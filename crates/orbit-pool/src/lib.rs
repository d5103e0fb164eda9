//! Per-time-point dynamic satellite pool verification. Grounded verbatim on
//! `original_source/satellite_pool_verifier.py`: the pool is counted at
//! every time-point across the union of all satellites' timestamps, never
//! by a single static tally of "satellites that pass somewhere".

use chrono::{DateTime, Utc};
use orbit_model::config::{CoverageThresholds, PoolTarget};
use orbit_model::error::PipelineError;
use orbit_model::{Constellation, SatelliteTimeSeries};
use std::collections::BTreeMap;

const CRITICAL_GAP_DURATION_MINUTES: f64 = 10.0;
const WARNING_GAP_DURATION_MINUTES: f64 = 5.0;
const WARNING_VISIBLE_RATIO: f64 = 0.5;
const MIN_PERIOD_COVERAGE_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapSeverity {
    Critical,
    Warning,
    Minor,
}

#[derive(Debug, Clone)]
pub struct CoverageGap {
    pub start_t: DateTime<Utc>,
    pub end_t: DateTime<Utc>,
    pub duration_minutes: f64,
    pub min_visible_count: u32,
    pub severity: GapSeverity,
}

#[derive(Debug, Clone)]
pub struct PeriodCompleteness {
    pub time_span_minutes: f64,
    pub expected_period_minutes: f64,
    pub coverage_ratio: f64,
    pub is_complete: bool,
}

#[derive(Debug, Clone)]
pub struct PoolVerificationResult {
    pub constellation: Constellation,
    pub total_points: usize,
    pub met_points: usize,
    pub coverage_rate: f64,
    pub target_met: bool,
    pub average_visible: f64,
    pub min_visible: u32,
    pub max_visible: u32,
    pub gaps: Vec<CoverageGap>,
    pub period_completeness: PeriodCompleteness,
}

/// Verifies one constellation's dynamic pool. Fails fast with
/// `InsufficientCoverage` if the time-point span does not cover at least
/// 0.9x the constellation's orbital period - the guard against using only
/// a short snapshot, per SPEC_FULL.md §4.9 point 6.
pub fn verify_pool(
    series_list: &[SatelliteTimeSeries],
    constellation: Constellation,
    target: PoolTarget,
    coverage_thresholds: &CoverageThresholds,
) -> Result<PoolVerificationResult, PipelineError> {
    let relevant: Vec<&SatelliteTimeSeries> = series_list
        .iter()
        .filter(|s| s.constellation == constellation)
        .collect();

    if relevant.is_empty() {
        return Err(PipelineError::InsufficientCoverage(format!(
            "no time series available for {constellation:?}"
        )));
    }

    // Union of all timestamps across all satellites of this constellation.
    let mut all_timestamps: BTreeMap<DateTime<Utc>, u32> = BTreeMap::new();
    for series in &relevant {
        for snapshot in &series.snapshots {
            let entry = all_timestamps.entry(snapshot.t).or_insert(0);
            if snapshot.is_connectable() {
                *entry += 1;
            } else {
                all_timestamps.entry(snapshot.t).or_insert(0);
            }
        }
    }

    if all_timestamps.is_empty() {
        return Err(PipelineError::InsufficientCoverage(
            "no timestamps collected across satellites".to_string(),
        ));
    }

    let total_points = all_timestamps.len();
    let threshold = coverage_threshold(constellation, coverage_thresholds);

    let mut met_points = 0usize;
    let mut visible_counts = Vec::with_capacity(total_points);
    for (&_t, &count) in &all_timestamps {
        let met = count >= target.min && target.max.map(|m| count <= m).unwrap_or(true);
        if met {
            met_points += 1;
        }
        visible_counts.push(count);
    }

    let coverage_rate = met_points as f64 / total_points as f64;
    let target_met = coverage_rate >= threshold;

    let average_visible = visible_counts.iter().sum::<u32>() as f64 / total_points as f64;
    let min_visible = *visible_counts.iter().min().unwrap();
    let max_visible = *visible_counts.iter().max().unwrap();

    let gaps = identify_gaps(&all_timestamps, target);
    let period_completeness = validate_orbital_period_coverage(&all_timestamps, constellation);

    if !period_completeness.is_complete {
        return Err(PipelineError::InsufficientCoverage(format!(
            "incomplete_period_coverage: span {:.1} min covers only {:.1}% of the {:.1}-min {:?} period",
            period_completeness.time_span_minutes,
            period_completeness.coverage_ratio * 100.0,
            period_completeness.expected_period_minutes,
            constellation,
        )));
    }

    Ok(PoolVerificationResult {
        constellation,
        total_points,
        met_points,
        coverage_rate,
        target_met,
        average_visible,
        min_visible,
        max_visible,
        gaps,
        period_completeness,
    })
}

fn coverage_threshold(constellation: Constellation, thresholds: &CoverageThresholds) -> f64 {
    match constellation {
        Constellation::Starlink => thresholds.starlink,
        Constellation::Oneweb => thresholds.oneweb,
        Constellation::Other => thresholds.starlink.min(thresholds.oneweb),
    }
}

fn identify_gaps(
    all_timestamps: &BTreeMap<DateTime<Utc>, u32>,
    target: PoolTarget,
) -> Vec<CoverageGap> {
    let mut gaps = Vec::new();
    let mut gap_start: Option<DateTime<Utc>> = None;
    let mut gap_min_visible = u32::MAX;
    let mut prev_t: Option<DateTime<Utc>> = None;

    for (&t, &count) in all_timestamps {
        let met = count >= target.min;
        if !met {
            if gap_start.is_none() {
                gap_start = Some(t);
                gap_min_visible = count;
            } else {
                gap_min_visible = gap_min_visible.min(count);
            }
            prev_t = Some(t);
        } else if let Some(start) = gap_start.take() {
            let end = prev_t.unwrap_or(start);
            gaps.push(close_gap(start, end, gap_min_visible, target));
            gap_min_visible = u32::MAX;
        }
    }

    if let Some(start) = gap_start {
        let end = prev_t.unwrap_or(start);
        gaps.push(close_gap(start, end, gap_min_visible, target));
    }

    gaps
}

fn close_gap(start: DateTime<Utc>, end: DateTime<Utc>, min_visible: u32, target: PoolTarget) -> CoverageGap {
    let duration_minutes = (end - start).num_milliseconds() as f64 / 60_000.0;
    let severity = assess_gap_severity(min_visible, duration_minutes, target);
    CoverageGap {
        start_t: start,
        end_t: end,
        duration_minutes,
        min_visible_count: min_visible,
        severity,
    }
}

fn assess_gap_severity(min_visible: u32, duration_minutes: f64, target: PoolTarget) -> GapSeverity {
    if min_visible == 0 || duration_minutes > CRITICAL_GAP_DURATION_MINUTES {
        GapSeverity::Critical
    } else if (min_visible as f64) < target.min as f64 * WARNING_VISIBLE_RATIO
        || duration_minutes > WARNING_GAP_DURATION_MINUTES
    {
        GapSeverity::Warning
    } else {
        GapSeverity::Minor
    }
}

fn validate_orbital_period_coverage(
    all_timestamps: &BTreeMap<DateTime<Utc>, u32>,
    constellation: Constellation,
) -> PeriodCompleteness {
    let first = *all_timestamps.keys().next().unwrap();
    let last = *all_timestamps.keys().next_back().unwrap();
    let time_span_minutes = (last - first).num_milliseconds() as f64 / 60_000.0;
    let expected_period_minutes = constellation.orbital_period_minutes();
    let coverage_ratio = time_span_minutes / expected_period_minutes;

    PeriodCompleteness {
        time_span_minutes,
        expected_period_minutes,
        coverage_ratio,
        is_complete: coverage_ratio >= MIN_PERIOD_COVERAGE_RATIO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use orbit_model::{
        GeodeticPosition, LookAngles, SatelliteSnapshot, Vec3, VisibilityFlags,
    };

    fn make_snapshot(t: DateTime<Utc>, visible: bool) -> SatelliteSnapshot {
        SatelliteSnapshot {
            sat_id: "x".to_string(),
            t,
            position_teme: Vec3::new(0.0, 0.0, 0.0),
            velocity_teme: Vec3::new(0.0, 0.0, 0.0),
            position_itrf: None,
            position_wgs84: Some(GeodeticPosition {
                lat_deg: 0.0,
                lon_deg: 0.0,
                alt_km: 550.0,
            }),
            look_angles: Some(LookAngles {
                elevation_deg: 30.0,
                azimuth_deg: 0.0,
                range_km: 900.0,
            }),
            visibility_flags: VisibilityFlags {
                elevation_ok: visible,
                range_ok: visible,
                geographic_ok: visible,
            },
            rsrp_dbm: Some(-80.0),
            sinr_db: Some(10.0),
            rsrq_db: None,
            link_margin_db: Some(20.0),
        }
    }

    /// The canonical "static counting bug" regression: 100 satellites each
    /// individually visible at some point, but staggered so that at no
    /// single instant are >= 10 simultaneously visible.
    #[test]
    fn pool_is_verified_per_time_point_not_by_static_count() {
        let epoch = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        // 100 time-points spanning >= 0.9 * 95 min at 30s sampling (190
        // points covers 95 min).
        let n_points = 190usize;
        let mut series_list = Vec::new();

        for sat_idx in 0..100u32 {
            let mut snapshots = Vec::with_capacity(n_points);
            for k in 0..n_points {
                // Each satellite is visible at exactly one staggered point,
                // guaranteeing no instant has >= 10 simultaneous.
                let visible = k == sat_idx as usize % n_points;
                let t = epoch + Duration::seconds(30 * k as i64);
                snapshots.push(make_snapshot(t, visible));
            }
            series_list.push(SatelliteTimeSeries {
                sat_id: format!("sat-{sat_idx}"),
                constellation: Constellation::Starlink,
                epoch,
                sampling_interval_s: 30.0,
                snapshots,
            });
        }

        let result = verify_pool(
            &series_list,
            Constellation::Starlink,
            PoolTarget { min: 10, max: None },
            &CoverageThresholds::default(),
        )
        .expect("period coverage satisfied");

        assert!(!result.target_met, "coverage rate was {}", result.coverage_rate);
        assert_eq!(result.coverage_rate, 0.0);
    }

    #[test]
    fn incomplete_period_is_rejected() {
        let epoch = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        // Only 60 minutes of data, well under 0.9 * 95 min for Starlink.
        let n_points = 121usize;
        let mut snapshots = Vec::with_capacity(n_points);
        for k in 0..n_points {
            let t = epoch + Duration::seconds(30 * k as i64);
            snapshots.push(make_snapshot(t, true));
        }
        let series_list = vec![SatelliteTimeSeries {
            sat_id: "sat-0".to_string(),
            constellation: Constellation::Starlink,
            epoch,
            sampling_interval_s: 30.0,
            snapshots,
        }];

        let result = verify_pool(
            &series_list,
            Constellation::Starlink,
            PoolTarget { min: 1, max: None },
            &CoverageThresholds::default(),
        );

        assert!(matches!(result, Err(PipelineError::InsufficientCoverage(_))));
    }
}
