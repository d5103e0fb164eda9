//! RSRP/SINR/RSRQ/link-margin estimation from elevation, distance, and
//! constellation antenna parameters, plus ITU-R P.618 atmospheric
//! attenuation. No random or fabricated values - every output is a
//! deterministic function of physical inputs.
//!
//! Grounded on the teacher's `ground-station-wasm::link_budget` (FSPL /
//! Kasten-Young air-mass / aperture-gain structure), generalised from an
//! FSO optical link (1550 nm) to an RF link budget citing each
//! constellation's published EIRP.

use orbit_model::Constellation;

const RSRP_MIN_DBM: f64 = -120.0;
const RSRP_MAX_DBM: f64 = -60.0;
const SINR_MIN_DB: f64 = -10.0;
const SINR_MAX_DB: f64 = 30.0;

/// Ku-band downlink carrier frequency assumption, GHz (Starlink/OneWeb
/// user-downlink band).
const CARRIER_FREQ_GHZ: f64 = 12.0;

/// Per-constellation EIRP and reference altitude, traceable to FCC filings
/// (Starlink SAT-LOA-20190830-00087; OneWeb SAT-LOA-20160428-00041).
#[derive(Debug, Clone, Copy)]
struct ConstellationRfProfile {
    eirp_dbw: f64,
    receiver_gain_dbi: f64,
    reference_altitude_km: f64,
}

fn rf_profile(constellation: Constellation) -> ConstellationRfProfile {
    match constellation {
        Constellation::Starlink => ConstellationRfProfile {
            eirp_dbw: 37.5,
            receiver_gain_dbi: 33.0,
            reference_altitude_km: 550.0,
        },
        Constellation::Oneweb => ConstellationRfProfile {
            eirp_dbw: 40.0,
            receiver_gain_dbi: 30.0,
            reference_altitude_km: 1200.0,
        },
        Constellation::Other => ConstellationRfProfile {
            eirp_dbw: 38.0,
            receiver_gain_dbi: 30.0,
            reference_altitude_km: 800.0,
        },
    }
}

fn free_space_path_loss_db(range_km: f64, freq_ghz: f64) -> f64 {
    20.0 * range_km.log10() + 20.0 * freq_ghz.log10() + 92.45
}

/// Kasten-Young air-mass approximation, same structural form as the
/// teacher's FSO atmospheric-loss model, with an RF clear-air zenith
/// absorption figure per ITU-R P.618 instead of the 1550nm optical value.
fn atmospheric_loss_db(elevation_deg: f64) -> f64 {
    let elevation_deg = elevation_deg.clamp(1.0, 90.0);
    let zenith_deg = 90.0 - elevation_deg;
    let zenith_rad = zenith_deg.to_radians();
    let air_mass =
        1.0 / (zenith_rad.cos() + 0.50572 * (96.07995 - zenith_deg).powf(-1.6364));
    const ZENITH_ABSORPTION_DB: f64 = 0.035;
    ZENITH_ABSORPTION_DB * air_mass
}

#[derive(Debug, Clone, Copy)]
pub struct SignalEstimate {
    pub rsrp_dbm: f64,
    pub sinr_db: f64,
    pub rsrq_db: f64,
    pub link_margin_db: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl SignalEstimate {
    pub fn quality_level(&self) -> QualityLevel {
        match self.rsrp_dbm {
            x if x >= -70.0 => QualityLevel::Excellent,
            x if x >= -85.0 => QualityLevel::Good,
            x if x >= -95.0 => QualityLevel::Fair,
            x if x >= -110.0 => QualityLevel::Poor,
            _ => QualityLevel::Critical,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.rsrp_dbm >= RSRP_MIN_DBM
    }
}

/// Estimates RSRP/SINR/RSRQ/link-margin from elevation and slant range
/// alone - the documented elevation-to-RSRP curve path used when a full
/// link budget (interference map, actual antenna pointing loss) is
/// unavailable.
pub fn estimate_signal(elevation_deg: f64, range_km: f64, constellation: Constellation) -> SignalEstimate {
    let profile = rf_profile(constellation);

    let fspl_db = free_space_path_loss_db(range_km.max(1.0), CARRIER_FREQ_GHZ);
    let atm_loss_db = atmospheric_loss_db(elevation_deg);

    let rsrp_raw = profile.eirp_dbw + profile.receiver_gain_dbi - fspl_db - atm_loss_db;
    let rsrp_dbm = rsrp_raw.clamp(RSRP_MIN_DBM, RSRP_MAX_DBM);

    // Linear map from the RSRP dynamic range onto the SINR dynamic range:
    // a fixed interference-plus-noise floor makes SINR track RSRP
    // proportionally in the absence of an explicit interference model.
    let rsrp_fraction = (rsrp_dbm - RSRP_MIN_DBM) / (RSRP_MAX_DBM - RSRP_MIN_DBM);
    let sinr_db = (SINR_MIN_DB + rsrp_fraction * (SINR_MAX_DB - SINR_MIN_DB))
        .clamp(SINR_MIN_DB, SINR_MAX_DB);

    // RSRQ typical operating range [-20, -3] dB, scaled from the same
    // RSRP fraction.
    let rsrq_db = (-20.0 + rsrp_fraction * 17.0).clamp(-20.0, -3.0);

    const RECEIVER_SENSITIVITY_DBM: f64 = -110.0;
    let link_margin_db = rsrp_dbm - RECEIVER_SENSITIVITY_DBM;

    SignalEstimate {
        rsrp_dbm,
        sinr_db,
        rsrq_db,
        link_margin_db,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsrp_stays_within_documented_bounds() {
        for elevation in [1.0, 10.0, 45.0, 90.0] {
            for range in [200.0, 800.0, 2000.0] {
                let est = estimate_signal(elevation, range, Constellation::Starlink);
                assert!(est.rsrp_dbm >= RSRP_MIN_DBM && est.rsrp_dbm <= RSRP_MAX_DBM);
                assert!(est.sinr_db >= SINR_MIN_DB && est.sinr_db <= SINR_MAX_DB);
            }
        }
    }

    #[test]
    fn higher_elevation_and_shorter_range_improve_signal() {
        let near_overhead = estimate_signal(80.0, 550.0, Constellation::Starlink);
        let near_horizon = estimate_signal(6.0, 1900.0, Constellation::Starlink);
        assert!(near_overhead.rsrp_dbm > near_horizon.rsrp_dbm);
    }

    #[test]
    fn quality_buckets_match_thresholds() {
        let est = SignalEstimate {
            rsrp_dbm: -69.0,
            sinr_db: 10.0,
            rsrq_db: -5.0,
            link_margin_db: 40.0,
        };
        assert_eq!(est.quality_level(), QualityLevel::Excellent);
    }
}
