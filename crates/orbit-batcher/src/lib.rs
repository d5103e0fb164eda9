//! Work partitioning across a CPU thread pool, with an optional
//! feature-flagged accelerator path behind the same interface. Grounded on
//! `sx9-foundation-core::geo_resolver`'s `rayon::prelude::*` usage,
//! generalised from a single geo-resolution workload to per-satellite
//! orbital propagation.

use orbit_model::error::PipelineError;
use orbit_model::stats::StatsCollector;
use orbit_model::{SatelliteTimeSeries, TleRecord};
use orbit_propagation::PooledPropagator;
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Activation threshold for the (feature-flagged) accelerator path; below
/// this many total propagation points the offload overhead dominates and
/// the CPU path is used regardless of the feature flag.
pub const ACCELERATOR_ACTIVATION_THRESHOLD: usize = 100_000;

#[derive(Debug, Clone, Copy)]
pub struct BatcherConfig {
    pub workers: usize,
    pub chunk_timeout: Duration,
    pub batch_timeout: Duration,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            chunk_timeout: Duration::from_secs(60),
            batch_timeout: Duration::from_secs(600),
        }
    }
}

impl BatcherConfig {
    pub fn worker_count(&self, hardware_concurrency: usize) -> usize {
        self.workers.min(hardware_concurrency).max(1)
    }
}

/// Propagates every TLE's full time series, partitioned across a worker
/// pool sized `min(8, hardware_concurrency)`, chunked `max(1, n/workers)`.
/// Output is merged and sorted by `(satellite_id, t)` regardless of the
/// order workers complete in.
pub fn propagate_all(
    tles: &[TleRecord],
    sampling_interval_s: f64,
    config: &BatcherConfig,
    stats: &StatsCollector,
) -> Result<Vec<SatelliteTimeSeries>, PipelineError> {
    let batch_start = Instant::now();
    stats.inc_satellites_in(tles.len() as u64);

    let hardware_concurrency = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let workers = config.worker_count(hardware_concurrency);
    let chunk_size = (tles.len() / workers.max(1)).max(1);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| PipelineError::StageTimeout {
            stage: format!("failed to build worker pool: {e}"),
        })?;

    let estimated_points: usize = tles
        .iter()
        .map(|t| {
            let period_min = t.period_minutes().unwrap_or(95.0);
            ((period_min * 60.0 / sampling_interval_s).ceil() as usize).max(1)
        })
        .sum();

    if estimated_points > ACCELERATOR_ACTIVATION_THRESHOLD {
        tracing::info!(
            estimated_points,
            "above accelerator activation threshold; accelerator feature not compiled in, falling back to CPU path"
        );
    }

    let chunks: Vec<&[TleRecord]> = tles.chunks(chunk_size).collect();

    let results: Vec<Result<Vec<SatelliteTimeSeries>, PipelineError>> = pool.install(|| {
        chunks
            .par_iter()
            .map(|chunk| propagate_chunk(chunk, sampling_interval_s, config.chunk_timeout, stats))
            .collect()
    });

    if batch_start.elapsed() > config.batch_timeout {
        return Err(PipelineError::StageTimeout {
            stage: "propagation_batch".to_string(),
        });
    }

    let mut merged = Vec::new();
    for r in results {
        merged.extend(r?);
    }

    merged.sort_by(|a, b| a.sat_id.cmp(&b.sat_id));
    for series in &mut merged {
        series.snapshots.sort_by_key(|s| s.t);
    }

    Ok(merged)
}

fn propagate_chunk(
    chunk: &[TleRecord],
    sampling_interval_s: f64,
    chunk_timeout: Duration,
    stats: &StatsCollector,
) -> Result<Vec<SatelliteTimeSeries>, PipelineError> {
    let chunk_start = Instant::now();
    let mut out = Vec::with_capacity(chunk.len());

    for tle in chunk {
        if chunk_start.elapsed() > chunk_timeout {
            return Err(PipelineError::StageTimeout {
                stage: "propagation_chunk".to_string(),
            });
        }

        let propagator = match PooledPropagator::from_tle(tle) {
            Ok(p) => p,
            Err(_) => {
                stats.inc_propagation_failure();
                continue;
            }
        };

        let series: Vec<_> = propagator.propagate_series(tle, sampling_interval_s);
        let snapshots: Vec<_> = series
            .into_iter()
            .filter_map(|(snap, status)| {
                if status.is_ok() {
                    Some(snap)
                } else {
                    stats.inc_propagation_failure();
                    None
                }
            })
            .collect();

        stats.inc_snapshots(snapshots.len() as u64);
        if !snapshots.is_empty() {
            stats.inc_satellites_out();
            out.push(SatelliteTimeSeries {
                sat_id: tle.sat_id(),
                constellation: tle.constellation,
                epoch: tle.epoch_datetime,
                sampling_interval_s,
                snapshots,
            });
        }
    }

    Ok(out)
}

/// Placeholder for the device-accelerated flattened-buffer path, gated
/// behind the `accelerator` feature. The CPU path above is always the
/// reference implementation; all property tests run against it alone.
#[cfg(feature = "accelerator")]
pub mod accelerator {
    use super::*;

    /// Flattens `(positions, times)` into contiguous buffers suitable for
    /// SIMD-lane batch processing, falling back transparently (with an
    /// instrumented event, not silently) if the offload cannot proceed.
    pub fn propagate_flattened(
        tles: &[TleRecord],
        sampling_interval_s: f64,
        config: &BatcherConfig,
        stats: &StatsCollector,
    ) -> Result<Vec<SatelliteTimeSeries>, PipelineError> {
        tracing::warn!("accelerator path unavailable in this build; falling back to CPU path");
        propagate_all(tles, sampling_interval_s, config, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use orbit_model::Constellation;

    fn tle(id: u32) -> TleRecord {
        TleRecord {
            norad_id: id,
            constellation: Constellation::Starlink,
            line1: "1 25544U 98067A   25001.00000000  .00001000  00000-0  10000-4 0  9990".to_string(),
            line2: "2 25544  51.6400 000.0000 0001000  00.0000 000.0000 15.50000000000010".to_string(),
            epoch_datetime: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn output_is_sorted_by_satellite_id_then_time() {
        let tles: Vec<_> = (0..5).map(tle).collect();
        let stats = StatsCollector::new();
        let config = BatcherConfig::default();
        let result = propagate_all(&tles, 30.0, &config, &stats).expect("propagation succeeds");

        let ids: Vec<_> = result.iter().map(|s| s.sat_id.clone()).collect();
        let mut sorted_ids = ids.clone();
        sorted_ids.sort();
        assert_eq!(ids, sorted_ids);

        for series in &result {
            let times: Vec<_> = series.snapshots.iter().map(|s| s.t).collect();
            let mut sorted_times = times.clone();
            sorted_times.sort();
            assert_eq!(times, sorted_times);
        }
    }

    #[test]
    fn worker_count_is_capped_at_eight() {
        let config = BatcherConfig::default();
        assert_eq!(config.worker_count(64), 8);
        assert_eq!(config.worker_count(2), 2);
    }
}
