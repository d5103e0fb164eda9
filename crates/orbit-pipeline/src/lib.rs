//! Stage sequencing, validation gates, statistics aggregation, and artifact
//! writing. Grounded on `candidate-selector/src/main.rs`'s load -> transform
//! -> write shape, generalised from one pass to the full C1-C11 sequence
//! with a validation gate between each stage.

use chrono::{DateTime, Utc};
use orbit_model::config::PipelineConfig;
use orbit_model::error::PipelineError;
use orbit_model::input::TleCatalog;
use orbit_model::stats::StatsCollector;
use orbit_model::{
    Constellation, EventRecord, SatelliteTimeSeries, ServiceWindow, VisibilityStatistics,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// One entry in a stage's `validation_results`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub check: String,
    pub passed: bool,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub results: Vec<ValidationResult>,
    pub all_passed: bool,
}

impl ValidationSummary {
    fn from_results(results: Vec<ValidationResult>) -> Self {
        let all_passed = results.iter().all(|r| r.passed);
        Self { results, all_passed }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactMetadata {
    pub processing_ms: u128,
    pub counts: BTreeMap<String, u64>,
    pub config_echo: PipelineConfig,
    pub academic_grade: String,
}

/// `{stage, data, metadata, validation}`, per SPEC_FULL.md §6.
#[derive(Debug, Serialize)]
pub struct StageArtifact<T: Serialize> {
    pub stage: String,
    pub data: T,
    pub metadata: ArtifactMetadata,
    pub validation: ValidationSummary,
}

/// Writes `stage<N>_output_<timestamp>.json` plus the matching
/// `validation_snapshots/stage<N>_validation.json` summary. The timestamp
/// is fixed once per pipeline run, not re-derived per stage, so every
/// artifact of one run shares the same filename suffix.
pub struct ArtifactWriter {
    output_dir: PathBuf,
    run_timestamp: String,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>, started_at: DateTime<Utc>) -> Self {
        Self {
            output_dir: output_dir.into(),
            run_timestamp: started_at.format("%Y%m%d_%H%M%S").to_string(),
        }
    }

    pub fn write_stage<T: Serialize>(
        &self,
        stage_number: u32,
        artifact: &StageArtifact<T>,
    ) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.output_dir).map_err(|e| PipelineError::ValidationFailed {
            check: "output_dir_writable".to_string(),
            detail: e.to_string(),
        })?;
        let validation_dir = self.output_dir.join("validation_snapshots");
        fs::create_dir_all(&validation_dir).map_err(|e| PipelineError::ValidationFailed {
            check: "validation_dir_writable".to_string(),
            detail: e.to_string(),
        })?;

        let output_path = self.output_dir.join(format!(
            "stage{stage_number}_output_{}.json",
            self.run_timestamp
        ));
        let validation_path =
            validation_dir.join(format!("stage{stage_number}_validation.json"));

        write_json_pretty(&output_path, artifact)?;
        write_json_pretty(&validation_path, &artifact.validation)?;
        Ok(())
    }
}

fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let file = fs::File::create(path).map_err(|e| PipelineError::ValidationFailed {
        check: "artifact_write".to_string(),
        detail: format!("{}: {e}", path.display()),
    })?;
    serde_json::to_writer_pretty(file, value).map_err(|e| PipelineError::ValidationFailed {
        check: "artifact_serialize".to_string(),
        detail: e.to_string(),
    })
}

fn academic_grade(validation: &ValidationSummary) -> String {
    if validation.all_passed {
        "A".to_string()
    } else {
        "F".to_string()
    }
}

fn metadata_for(
    started: Instant,
    counts: BTreeMap<String, u64>,
    config: &PipelineConfig,
    validation: &ValidationSummary,
) -> ArtifactMetadata {
    ArtifactMetadata {
        processing_ms: started.elapsed().as_millis(),
        counts,
        config_echo: config.clone(),
        academic_grade: academic_grade(validation),
    }
}

/// Loads and validates the Stage-1 input artifact (academic-compliance gate
/// included). Thin re-export so CLI code has one entry point per stage.
pub fn load_input(path: &Path) -> Result<TleCatalog, PipelineError> {
    orbit_model::input::load_catalog(path)
}

/// Stage 2: propagation (C2/C4) + frame transforms (C1) + look angles (C3).
/// Every snapshot that fails the WGS84 iterative solve is dropped and
/// counted rather than left half-populated.
pub fn run_stage2(
    catalog: &TleCatalog,
    config: &PipelineConfig,
    stats: &StatsCollector,
) -> Result<(Vec<SatelliteTimeSeries>, StageArtifact<Value>), PipelineError> {
    let started = Instant::now();
    let batcher_config = orbit_batcher::BatcherConfig {
        workers: config.workers,
        ..orbit_batcher::BatcherConfig::default()
    };

    let mut series_list = orbit_batcher::propagate_all(
        &catalog.tle_data,
        config.sampling_interval_s,
        &batcher_config,
        stats,
    )?;

    for series in &mut series_list {
        for snapshot in &mut series.snapshots {
            let (pos_itrf, _vel_itrf) =
                orbit_time::to_itrf(snapshot.position_teme, snapshot.velocity_teme, snapshot.t);

            match orbit_time::to_wgs84(pos_itrf) {
                Ok(coords) => {
                    snapshot.position_itrf = Some(pos_itrf);
                    snapshot.position_wgs84 = Some(orbit_model::GeodeticPosition {
                        lat_deg: coords.lat_deg,
                        lon_deg: coords.lon_deg,
                        alt_km: coords.alt_km,
                    });
                    snapshot.look_angles =
                        Some(orbit_geometry::look_angles(config.observer, pos_itrf));
                }
                Err(_) => {
                    stats.inc_frame_transform_failure();
                }
            }
        }
    }

    let checks = vec![ValidationResult {
        check: "at_least_one_satellite_propagated".to_string(),
        passed: !series_list.is_empty(),
        rationale: format!("{} satellites produced a time series", series_list.len()),
    }];
    let validation = ValidationSummary::from_results(checks);
    if !validation.all_passed {
        return Err(PipelineError::ValidationFailed {
            check: "stage2".to_string(),
            detail: "no satellite produced a usable time series".to_string(),
        });
    }

    let snapshot_count: u64 = series_list.iter().map(|s| s.snapshots.len() as u64).sum();
    let mut counts = BTreeMap::new();
    counts.insert("satellites".to_string(), series_list.len() as u64);
    counts.insert("snapshots".to_string(), snapshot_count);

    let metadata = metadata_for(started, counts, config, &validation);
    let artifact = StageArtifact {
        stage: "stage2_propagation_frames".to_string(),
        data: serde_json::to_value(&series_list).map_err(|e| PipelineError::ValidationFailed {
            check: "stage2_serialize".to_string(),
            detail: e.to_string(),
        })?,
        metadata,
        validation,
    };

    Ok((series_list, artifact))
}

#[derive(Debug, Clone, Serialize)]
pub struct SatelliteFeasibility {
    pub sat_id: String,
    pub constellation: Constellation,
    pub windows: Vec<ServiceWindow>,
    pub statistics: VisibilityStatistics,
    pub link_score: Option<orbit_link_score_shim::LinkScoreShim>,
    pub feasible: bool,
}

/// `orbit_link::LinkScore` doesn't derive `Serialize` (it lives in a crate
/// that has no `serde` dependency of its own); this module is the thin
/// serialisable mirror used only for artifact output.
mod orbit_link_score_shim {
    use serde::Serialize;

    #[derive(Debug, Clone, Copy, Serialize)]
    pub struct LinkScoreShim {
        pub signal: f64,
        pub geometry: f64,
        pub stability: f64,
        pub overall: f64,
    }

    impl From<orbit_link::LinkScore> for LinkScoreShim {
        fn from(s: orbit_link::LinkScore) -> Self {
            Self {
                signal: s.signal,
                geometry: s.geometry,
                stability: s.stability,
                overall: s.overall,
            }
        }
    }
}

/// Stage 3: visibility gates (C5) + signal estimation (C7) + feasibility
/// scoring (C6). Signal parameters are only computed for snapshots that
/// already passed the visibility gates - the spec's "earlier failures skip
/// later work" ordering.
pub fn run_stage3(
    series_list: &mut [SatelliteTimeSeries],
    config: &PipelineConfig,
) -> StageArtifact<Vec<SatelliteFeasibility>> {
    let started = Instant::now();
    let mut reports = Vec::with_capacity(series_list.len());

    for series in series_list.iter_mut() {
        orbit_visibility::apply_visibility_gates(series, config);

        for snapshot in &mut series.snapshots {
            if !snapshot.is_connectable() {
                continue;
            }
            let Some(angles) = snapshot.look_angles else {
                continue;
            };
            let estimate =
                orbit_signal::estimate_signal(angles.elevation_deg, angles.range_km, series.constellation);
            snapshot.rsrp_dbm = Some(estimate.rsrp_dbm);
            snapshot.sinr_db = Some(estimate.sinr_db);
            snapshot.rsrq_db = Some(estimate.rsrq_db);
            snapshot.link_margin_db = Some(estimate.link_margin_db);
        }

        let windows = orbit_visibility::extract_visibility_windows(series);
        let service_windows = orbit_visibility::filter_service_windows(&windows, config);
        let statistics = orbit_visibility::compute_statistics(&series.sat_id, &windows);

        let service_window_minutes_sum: f64 =
            service_windows.iter().map(|w| w.duration_minutes).sum();

        let link_score = series
            .visible_snapshots()
            .max_by(|a, b| {
                a.look_angles
                    .map(|x| x.elevation_deg)
                    .unwrap_or(f64::MIN)
                    .partial_cmp(&b.look_angles.map(|x| x.elevation_deg).unwrap_or(f64::MIN))
                    .unwrap()
            })
            .map(|best| orbit_link::score_snapshot(best, config.ahp_weights));

        let feasible = link_score
            .map(|score| orbit_link::is_feasible(&score, service_window_minutes_sum, config))
            .unwrap_or(false);

        reports.push(SatelliteFeasibility {
            sat_id: series.sat_id.clone(),
            constellation: series.constellation,
            windows: service_windows,
            statistics,
            link_score: link_score.map(Into::into),
            feasible,
        });
    }

    let feasible_count = reports.iter().filter(|r| r.feasible).count();
    let validation = ValidationSummary::from_results(vec![ValidationResult {
        check: "ahp_weights_normalised".to_string(),
        passed: config.ahp_weights.is_normalised(),
        rationale: format!("signal+geometry+stability = {}", config.ahp_weights.sum()),
    }]);

    let mut counts = BTreeMap::new();
    counts.insert("satellites_evaluated".to_string(), reports.len() as u64);
    counts.insert("feasible_satellites".to_string(), feasible_count as u64);

    let metadata = metadata_for(started, counts, config, &validation);
    StageArtifact {
        stage: "stage3_visibility_link_signal".to_string(),
        data: reports,
        metadata,
        validation,
    }
}

/// Stage 4: 3GPP event detection (C8), restricted to the feasible subset -
/// the feasible set, not the merely-visible set, defines the dynamic pool
/// per spec.md §4.6.
pub fn run_stage4(
    series_list: &[SatelliteTimeSeries],
    feasibility: &[SatelliteFeasibility],
    config: &PipelineConfig,
    serving_pin: Option<&str>,
) -> StageArtifact<Vec<EventRecord>> {
    let started = Instant::now();
    let feasible_ids: std::collections::HashSet<&str> = feasibility
        .iter()
        .filter(|r| r.feasible)
        .map(|r| r.sat_id.as_str())
        .collect();

    let feasible_series: Vec<SatelliteTimeSeries> = series_list
        .iter()
        .filter(|s| feasible_ids.contains(s.sat_id.as_str()))
        .cloned()
        .collect();

    let events = orbit_events::detect_events(&feasible_series, &config.event_thresholds, serving_pin);

    let validation = ValidationSummary::from_results(vec![ValidationResult {
        check: "events_non_decreasing_in_time".to_string(),
        passed: events.windows(2).all(|w| w[0].t <= w[1].t),
        rationale: format!("{} events emitted", events.len()),
    }]);

    let mut counts = BTreeMap::new();
    counts.insert("feasible_satellites".to_string(), feasible_series.len() as u64);
    counts.insert("events".to_string(), events.len() as u64);

    let metadata = metadata_for(started, counts, config, &validation);
    StageArtifact {
        stage: "stage4_events".to_string(),
        data: events,
        metadata,
        validation,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolReport {
    pub starlink: Option<PoolReportShim>,
    pub oneweb: Option<PoolReportShim>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolReportShim {
    pub total_points: usize,
    pub met_points: usize,
    pub coverage_rate: f64,
    pub target_met: bool,
    pub average_visible: f64,
    pub min_visible: u32,
    pub max_visible: u32,
    pub gap_count: usize,
}

impl From<orbit_pool::PoolVerificationResult> for PoolReportShim {
    fn from(r: orbit_pool::PoolVerificationResult) -> Self {
        Self {
            total_points: r.total_points,
            met_points: r.met_points,
            coverage_rate: r.coverage_rate,
            target_met: r.target_met,
            average_visible: r.average_visible,
            min_visible: r.min_visible,
            max_visible: r.max_visible,
            gap_count: r.gaps.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Stage5Output {
    pub pool: PoolReport,
    pub handover_decisions: Vec<orbit_model::decision::HandoverDecision>,
    pub rl_sample_counts: BTreeMap<String, usize>,
}

/// Stage 5: dynamic-pool verification (C9) + handover evaluation (C10) +
/// RL dataset sample counts (C11), restricted to the feasible subset.
pub fn run_stage5(
    series_list: &[SatelliteTimeSeries],
    feasibility: &[SatelliteFeasibility],
    config: &PipelineConfig,
) -> Result<StageArtifact<Stage5Output>, PipelineError> {
    let started = Instant::now();
    let feasible_ids: std::collections::HashSet<&str> = feasibility
        .iter()
        .filter(|r| r.feasible)
        .map(|r| r.sat_id.as_str())
        .collect();

    let feasible_series: Vec<SatelliteTimeSeries> = series_list
        .iter()
        .filter(|s| feasible_ids.contains(s.sat_id.as_str()))
        .cloned()
        .collect();

    let starlink = if feasible_series.iter().any(|s| s.constellation == Constellation::Starlink) {
        Some(
            orbit_pool::verify_pool(
                &feasible_series,
                Constellation::Starlink,
                config.pool_targets.starlink,
                &config.coverage_thresholds,
            )?
            .into(),
        )
    } else {
        None
    };

    let oneweb = if feasible_series.iter().any(|s| s.constellation == Constellation::Oneweb) {
        Some(
            orbit_pool::verify_pool(
                &feasible_series,
                Constellation::Oneweb,
                config.pool_targets.oneweb,
                &config.coverage_thresholds,
            )?
            .into(),
        )
    } else {
        None
    };

    let mut handover_decisions = Vec::new();
    let mut dqn_count = 0usize;
    let mut a3c_count = 0usize;

    if let Some(serving_series) = feasible_series
        .iter()
        .max_by_key(|s| s.visible_snapshots().count())
    {
        let candidates: Vec<_> = feasible_series
            .iter()
            .filter(|s| s.sat_id != serving_series.sat_id)
            .filter_map(|s| s.visible_snapshots().last().cloned())
            .collect();

        for serving_snapshot in serving_series.visible_snapshots() {
            let decision = orbit_handover::evaluate_handover(
                format!("{}-{}", serving_series.sat_id, serving_snapshot.t.timestamp_millis()),
                serving_snapshot.t,
                serving_snapshot,
                &candidates,
                config,
            );
            handover_decisions.push(decision);
        }

        for snapshot in serving_series.visible_snapshots() {
            if orbit_rl::build_state_vector(snapshot).is_some() {
                dqn_count += 1;
                a3c_count += 1;
            }
        }
    }

    let mut rl_sample_counts = BTreeMap::new();
    rl_sample_counts.insert("dqn".to_string(), dqn_count);
    rl_sample_counts.insert("a3c".to_string(), a3c_count);
    rl_sample_counts.insert("ppo".to_string(), dqn_count);
    rl_sample_counts.insert("sac".to_string(), dqn_count);

    let validation = ValidationSummary::from_results(vec![ValidationResult {
        check: "period_completeness_validated".to_string(),
        passed: true,
        rationale: "verify_pool returns InsufficientCoverage before reaching this point otherwise"
            .to_string(),
    }]);

    let mut counts = BTreeMap::new();
    counts.insert("handover_decisions".to_string(), handover_decisions.len() as u64);
    counts.insert("rl_samples".to_string(), dqn_count as u64);

    let metadata = metadata_for(started, counts, config, &validation);
    Ok(StageArtifact {
        stage: "stage5_pool_handover_rl".to_string(),
        data: Stage5Output {
            pool: PoolReport { starlink, oneweb },
            handover_decisions,
            rl_sample_counts,
        },
        metadata,
        validation,
    })
}

/// Runs stages 2-5 end to end, writing every intermediate artifact under
/// `output_dir`. Halts at the first stage that returns an error - no stage
/// runs against a partially-valid predecessor.
pub fn run_all(
    input_path: &Path,
    config: &PipelineConfig,
    output_dir: &Path,
    started_at: DateTime<Utc>,
) -> Result<StatsCollector, PipelineError> {
    let stats = StatsCollector::new();
    let writer = ArtifactWriter::new(output_dir, started_at);

    let catalog = load_input(input_path)?;

    // `orbit_batcher::propagate_all` records `satellites_in` itself.
    let (mut series_list, stage2_artifact) = run_stage2(&catalog, config, &stats)?;
    writer.write_stage(2, &stage2_artifact)?;

    let stage3_artifact = run_stage3(&mut series_list, config);
    writer.write_stage(3, &stage3_artifact)?;

    let stage4_artifact = run_stage4(
        &series_list,
        &stage3_artifact.data,
        config,
        config.serving_sat_id.as_deref(),
    );
    writer.write_stage(4, &stage4_artifact)?;

    let stage5_artifact = run_stage5(&series_list, &stage3_artifact.data, config)?;
    writer.write_stage(5, &stage5_artifact)?;

    tracing::info!(
        satellites_in = stats.snapshot().satellites_in,
        satellites_out = stats.snapshot().satellites_out,
        "pipeline run complete"
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use orbit_model::TleRecord;
    use tempfile_shim::TempDir;

    /// Minimal `tempfile`-shaped helper so this crate doesn't need a
    /// dev-dependency just for one test's scratch directory - uses the
    /// process-unique pid plus a counter for uniqueness instead of a real
    /// random source.
    mod tempfile_shim {
        use std::path::PathBuf;
        use std::sync::atomic::{AtomicU64, Ordering};

        static COUNTER: AtomicU64 = AtomicU64::new(0);

        pub struct TempDir(pub PathBuf);

        impl TempDir {
            pub fn new(label: &str) -> Self {
                let n = COUNTER.fetch_add(1, Ordering::Relaxed);
                let path = std::env::temp_dir().join(format!("orbit-pipeline-test-{label}-{n}"));
                std::fs::create_dir_all(&path).unwrap();
                Self(path)
            }
        }

        impl Drop for TempDir {
            fn drop(&mut self) {
                let _ = std::fs::remove_dir_all(&self.0);
            }
        }
    }

    fn iss_like_tle(norad_id: u32, constellation: Constellation) -> TleRecord {
        TleRecord {
            norad_id,
            constellation,
            line1: "1 25544U 98067A   25001.00000000  .00001000  00000-0  10000-4 0  9990".to_string(),
            line2: "2 25544  51.6400 000.0000 0001000  00.0000 000.0000 15.50000000000010".to_string(),
            epoch_datetime: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    /// S1: a single Starlink-like overpass should propagate, frame-transform,
    /// and yield at least one visibility window with no failures recorded.
    #[test]
    fn s1_single_overpass_yields_a_visibility_window() {
        let catalog = TleCatalog {
            tle_data: vec![iss_like_tle(25544, Constellation::Starlink)],
            metadata: Value::Null,
        };
        let config = PipelineConfig::default();
        let stats = StatsCollector::new();

        let (mut series_list, _artifact) = run_stage2(&catalog, &config, &stats).unwrap();
        assert_eq!(stats.snapshot().frame_transform_failures, 0);

        let stage3 = run_stage3(&mut series_list, &config);
        let report = &stage3.data[0];
        assert!(
            !report.windows.is_empty() || report.statistics.window_count > 0,
            "expected at least one visibility window for an overhead pass"
        );
    }

    /// S4: academic-compliance rejection happens before any stage runs, and
    /// before any output artifact is written.
    #[test]
    fn s4_academic_compliance_violation_blocks_before_any_stage() {
        let dir = tempfile_shim::TempDir::new("s4");
        let input_path = dir.0.join("input.json");
        let bad_input = serde_json::json!({
            "tle_data": [{
                "norad_id": 1,
                "constellation": "starlink",
                "line1": "1 25544U 98067A   25001.00000000  .00001000  00000-0  10000-4 0  9990",
                "line2": "2 25544  51.6400 000.0000 0001000  00.0000 000.0000 15.50000000000010",
                "epoch_datetime": "2025-01-01T00:00:00Z",
            }],
            "metadata": { "calculation_base_time": "2025-01-01T00:00:00Z" },
        });
        std::fs::write(&input_path, bad_input.to_string()).unwrap();

        let output_dir = dir.0.join("out");
        let config = PipelineConfig::default();
        let result = run_all(
            &input_path,
            &config,
            &output_dir,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        );

        assert!(matches!(result, Err(PipelineError::AcademicComplianceViolation(_))));
        assert!(!output_dir.exists(), "no artifact should be written on a Stage-1 rejection");
    }

    /// S5 analogue: a too-short observation window must surface
    /// `InsufficientCoverage` from Stage 5 rather than a silently-passing
    /// pool report.
    #[test]
    fn incomplete_observation_window_fails_stage5() {
        let catalog = TleCatalog {
            tle_data: (0..12)
                .map(|i| iss_like_tle(30000 + i, Constellation::Starlink))
                .collect(),
            metadata: Value::Null,
        };
        let mut config = PipelineConfig::default();
        config.pool_targets.starlink.min = 10;
        let stats = StatsCollector::new();

        let (mut series_list, _artifact) = run_stage2(&catalog, &config, &stats).unwrap();
        // Truncate every series to 10 minutes of data, well under 0.9 * 95
        // minutes for Starlink.
        for series in &mut series_list {
            let epoch = series.epoch;
            series.snapshots.retain(|s| (s.t - epoch).num_seconds() < 600);
        }
        let stage3 = run_stage3(&mut series_list, &config);
        let result = run_stage5(&series_list, &stage3.data, &config);
        assert!(matches!(result, Err(PipelineError::InsufficientCoverage(_))));
    }

    /// S3: serving RSRP -108 -> -112 dBm while neighbor goes -112 -> -92 dBm
    /// should yield exactly one A5 at the second sample. Unreachable through
    /// the max-RSRP default (the neighbor outscores the intended serving sat
    /// at t2), so `config.serving_sat_id` pins the role.
    #[test]
    fn s3_pinned_serving_sat_yields_exactly_one_a5_at_crossing() {
        use orbit_model::{GeodeticPosition, LookAngles, SatelliteSnapshot, Vec3, VisibilityFlags};

        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let t1 = t0 + chrono::Duration::seconds(30);

        let snap = |sat_id: &str, t: DateTime<Utc>, rsrp: f64| SatelliteSnapshot {
            sat_id: sat_id.to_string(),
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
                elevation_ok: true,
                range_ok: true,
                geographic_ok: true,
            },
            rsrp_dbm: Some(rsrp),
            sinr_db: Some(10.0),
            rsrq_db: None,
            link_margin_db: Some(20.0),
        };

        let serving_series = SatelliteTimeSeries {
            sat_id: "serving".to_string(),
            constellation: Constellation::Starlink,
            epoch: t0,
            sampling_interval_s: 30.0,
            snapshots: vec![snap("serving", t0, -108.0), snap("serving", t1, -112.0)],
        };
        let neighbor_series = SatelliteTimeSeries {
            sat_id: "neighbor".to_string(),
            constellation: Constellation::Starlink,
            epoch: t0,
            sampling_interval_s: 30.0,
            snapshots: vec![snap("neighbor", t0, -112.0), snap("neighbor", t1, -92.0)],
        };
        let series_list = vec![serving_series, neighbor_series];

        let feasibility: Vec<SatelliteFeasibility> = series_list
            .iter()
            .map(|s| SatelliteFeasibility {
                sat_id: s.sat_id.clone(),
                constellation: s.constellation,
                windows: Vec::new(),
                statistics: VisibilityStatistics {
                    sat_id: s.sat_id.clone(),
                    total_visible_minutes: 1.0,
                    window_count: 1,
                    max_elevation_deg: 30.0,
                    next_pass_time: None,
                    service_quality_grade: orbit_model::ServiceQualityGrade::A,
                },
                link_score: None,
                feasible: true,
            })
            .collect();

        let mut config = PipelineConfig::default();
        config.serving_sat_id = Some("serving".to_string());

        let artifact = run_stage4(&series_list, &feasibility, &config, config.serving_sat_id.as_deref());
        let a5_events: Vec<_> = artifact
            .data
            .iter()
            .filter(|e| e.event_type == orbit_model::EventType::A5)
            .collect();

        assert_eq!(a5_events.len(), 1);
        assert_eq!(a5_events[0].t, t1);
        assert_eq!(a5_events[0].serving_sat_id, "serving");
        assert_eq!(a5_events[0].neighbor_sat_id, "neighbor");
    }
}
