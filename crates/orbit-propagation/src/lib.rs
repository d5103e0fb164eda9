//! SGP4/SDP4 propagation (Hoots & Roehrich 1980, Vallado 2006). No
//! simplified model is used - this crate is a thin, honest wrapper around
//! the `sgp4` crate, the same one the teacher's `orbital-mechanics` crate
//! depends on.

use chrono::{DateTime, Utc};
use orbit_model::{SatelliteSnapshot, TleRecord, Vec3, VisibilityFlags};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum PropagationError {
    #[error("invalid TLE for satellite {sat_id}: {detail}")]
    InvalidTle { sat_id: String, detail: String },
    #[error("sgp4 constants could not be derived for satellite {sat_id}: {detail}")]
    ConstantsFailed { sat_id: String, detail: String },
}

pub type Result<T> = std::result::Result<T, PropagationError>;

/// SGP4 propagation outcome. A non-`Ok` status yields no usable position;
/// the caller drops the satellite and increments a counter rather than
/// treating partial output as valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationStatus {
    Ok,
    MeanEccentricityOutOfRange,
    MeanMotionNegative,
    PerturbedEccentricityOutOfRange,
    SemiLatusRectumNegative,
    SubOrbital,
    Decayed,
}

impl PropagationStatus {
    pub fn is_ok(self) -> bool {
        matches!(self, PropagationStatus::Ok)
    }

    pub fn code(self) -> &'static str {
        match self {
            PropagationStatus::Ok => "ok",
            PropagationStatus::MeanEccentricityOutOfRange => "mean_eccentricity_out_of_range",
            PropagationStatus::MeanMotionNegative => "mean_motion_negative",
            PropagationStatus::PerturbedEccentricityOutOfRange => {
                "perturbed_eccentricity_out_of_range"
            }
            PropagationStatus::SemiLatusRectumNegative => "semi_latus_rectum_negative",
            PropagationStatus::SubOrbital => "sub_orbital",
            PropagationStatus::Decayed => "decayed",
        }
    }

    fn classify(message: &str) -> Self {
        let m = message.to_ascii_lowercase();
        if m.contains("eccentricity") && m.contains("perturbed") {
            PropagationStatus::PerturbedEccentricityOutOfRange
        } else if m.contains("eccentricity") {
            PropagationStatus::MeanEccentricityOutOfRange
        } else if m.contains("mean motion") {
            PropagationStatus::MeanMotionNegative
        } else if m.contains("semilatus") || m.contains("semi-latus") || m.contains("semi latus") {
            PropagationStatus::SemiLatusRectumNegative
        } else if m.contains("decay") {
            PropagationStatus::Decayed
        } else if m.contains("sub-orbital") || m.contains("suborbital") {
            PropagationStatus::SubOrbital
        } else {
            PropagationStatus::SemiLatusRectumNegative
        }
    }
}

/// A pooled SGP4 constants set for one TLE. Constants are derived once and
/// reused across a batch of target times - distinct `PooledPropagator`
/// instances never share mutable state.
pub struct PooledPropagator {
    sat_id: String,
    epoch_utc: DateTime<Utc>,
    constants: sgp4::Constants,
}

impl PooledPropagator {
    pub fn from_tle(tle: &TleRecord) -> Result<Self> {
        let elements = sgp4::Elements::from_tle(
            Some(tle.sat_id()),
            tle.line1.as_bytes(),
            tle.line2.as_bytes(),
        )
        .map_err(|e| PropagationError::InvalidTle {
            sat_id: tle.sat_id(),
            detail: e.to_string(),
        })?;

        let constants =
            sgp4::Constants::from_elements(&elements).map_err(|e| PropagationError::ConstantsFailed {
                sat_id: tle.sat_id(),
                detail: e.to_string(),
            })?;

        Ok(Self {
            sat_id: tle.sat_id(),
            epoch_utc: tle.epoch_datetime,
            constants,
        })
    }

    /// `propagate(tle, t) -> (pos_km, vel_km_s, status)`.
    pub fn propagate(&self, t: DateTime<Utc>) -> (Vec3, Vec3, PropagationStatus) {
        let minutes_since_epoch =
            (t - self.epoch_utc).num_milliseconds() as f64 / 60_000.0;

        match self.constants.propagate(minutes_since_epoch) {
            Ok(prediction) => {
                let pos = Vec3::new(
                    prediction.position[0],
                    prediction.position[1],
                    prediction.position[2],
                );
                let vel = Vec3::new(
                    prediction.velocity[0],
                    prediction.velocity[1],
                    prediction.velocity[2],
                );
                (pos, vel, PropagationStatus::Ok)
            }
            Err(e) => {
                let status = PropagationStatus::classify(&e.to_string());
                warn!(sat_id = %self.sat_id, status = status.code(), "sgp4 propagation failed");
                (Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0), status)
            }
        }
    }

    /// Derives `N`/`dt` from the TLE's mean motion so the series covers at
    /// least one orbital period, then propagates across it.
    pub fn propagate_series(
        &self,
        tle: &TleRecord,
        sampling_interval_s: f64,
    ) -> Vec<(SatelliteSnapshot, PropagationStatus)> {
        let period_minutes = tle.period_minutes().unwrap_or(95.0);
        let window_s = period_minutes * 60.0;
        let n = ((window_s / sampling_interval_s).ceil() as usize).max(1);

        (0..n)
            .map(|k| {
                let t = self.epoch_utc
                    + chrono::Duration::milliseconds((k as f64 * sampling_interval_s * 1000.0) as i64);
                let (pos, vel, status) = self.propagate(t);
                let snapshot = SatelliteSnapshot {
                    sat_id: self.sat_id.clone(),
                    t,
                    position_teme: pos,
                    velocity_teme: vel,
                    position_itrf: None,
                    position_wgs84: None,
                    look_angles: None,
                    visibility_flags: VisibilityFlags::default(),
                    rsrp_dbm: None,
                    sinr_db: None,
                    rsrq_db: None,
                    link_margin_db: None,
                };
                (snapshot, status)
            })
            .collect()
    }
}

/// `propagate_batch(tle, [t0..tn]) -> [snapshots]`. Non-`ok` statuses are
/// filtered out here; callers that need the failure count should use
/// `PooledPropagator::propagate_series` directly.
pub fn propagate_batch(tle: &TleRecord, sampling_interval_s: f64) -> Result<Vec<SatelliteSnapshot>> {
    let propagator = PooledPropagator::from_tle(tle)?;
    Ok(propagator
        .propagate_series(tle, sampling_interval_s)
        .into_iter()
        .filter_map(|(snap, status)| status.is_ok().then_some(snap))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn iss_like_tle() -> TleRecord {
        TleRecord {
            norad_id: 25544,
            constellation: orbit_model::Constellation::Other,
            line1: "1 25544U 98067A   25001.00000000  .00001000  00000-0  10000-4 0  9990".to_string(),
            line2: "2 25544  51.6400 000.0000 0001000  00.0000 000.0000 15.50000000000010".to_string(),
            epoch_datetime: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn propagates_series_without_panicking() {
        let tle = iss_like_tle();
        let result = propagate_batch(&tle, 30.0);
        assert!(result.is_ok());
    }

    #[test]
    fn mean_motion_decodes_to_leo_period() {
        let tle = iss_like_tle();
        let period = tle.period_minutes().expect("mean motion present");
        assert!((90.0..100.0).contains(&period));
    }
}
