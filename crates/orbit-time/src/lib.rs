//! Time scale and reference-frame conversions: UT1/UTC/TT bookkeeping and
//! TEME -> ITRF -> WGS84 transforms.
//!
//! No IERS polar-motion/dUT1 table is consumed here - the transform is
//! Earth-rotation-angle only (GMST), which the source docs call out as
//! appropriate when such tables are unavailable, capped at sub-km accuracy.
//! See DESIGN.md decision 1.

use chrono::{DateTime, Utc};
use orbit_model::Vec3;
use thiserror::Error;

/// WGS84 ellipsoid semi-major axis, km.
pub const WGS84_A_KM: f64 = 6378.137;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// Earth angular velocity, rad/s.
pub const EARTH_ANGULAR_VELOCITY_RAD_S: f64 = 7.292_115_0e-5;

const WGS84_E2: f64 = 2.0 * WGS84_F - WGS84_F * WGS84_F;
const MAX_GEODETIC_ITERATIONS: usize = 5;
const GEODETIC_CONVERGENCE_RAD: f64 = 1e-11;

#[derive(Error, Debug)]
pub enum TimeError {
    #[error("time {0} lies outside the supplied IERS table range")]
    TimeOutOfRange(DateTime<Utc>),
    #[error("geodetic latitude solve did not converge within {0} iterations")]
    FrameTransformNonConvergent(usize),
}

pub type Result<T> = std::result::Result<T, TimeError>;

/// Greenwich Mean Sidereal Time at `t_utc`, in radians, normalised to
/// `[0, 2*pi)`. IAU 1982 polynomial (Vallado 2013 eq. 3-47), grounded on
/// the teacher's `unix_to_gmst`, generalised from `f64` Unix seconds to
/// `DateTime<Utc>` with sub-second precision.
pub fn gmst_radians(t_utc: DateTime<Utc>) -> f64 {
    let unix_s = t_utc.timestamp() as f64 + t_utc.timestamp_subsec_nanos() as f64 * 1e-9;
    let jd = unix_s / 86400.0 + 2_440_587.5;
    let t = (jd - 2_451_545.0) / 36525.0;

    let mut gmst_sec = 67_310.548_41
        + (876_600.0 * 3600.0 + 8_640_184.812_866) * t
        + 0.093_104 * t * t
        - 6.2e-6 * t * t * t;

    gmst_sec %= 86_400.0;
    if gmst_sec < 0.0 {
        gmst_sec += 86_400.0;
    }

    let gmst_deg = gmst_sec * (360.0 / 86_400.0);
    gmst_deg.to_radians()
}

/// Transforms a TEME position/velocity pair into ITRF at `t_utc` by
/// rotating through the Earth rotation angle (GMST) only - see module docs
/// for the documented polar-motion/precession/nutation omission.
///
/// `v_itrf = R * v_teme - omega x r_itrf`, per the angular-velocity
/// correction required whenever differentiating a rotating-frame position.
pub fn to_itrf(pos_teme: Vec3, vel_teme: Vec3, t_utc: DateTime<Utc>) -> (Vec3, Vec3) {
    let theta = gmst_radians(t_utc);
    let (s, c) = theta.sin_cos();

    let rotate = |v: Vec3| Vec3::new(v.x * c + v.y * s, -v.x * s + v.y * c, v.z);

    let pos_itrf = rotate(pos_teme);
    let vel_rotated = rotate(vel_teme);

    let omega_cross_r = Vec3::new(
        -EARTH_ANGULAR_VELOCITY_RAD_S * pos_itrf.y,
        EARTH_ANGULAR_VELOCITY_RAD_S * pos_itrf.x,
        0.0,
    );
    let vel_itrf = Vec3::new(
        vel_rotated.x - omega_cross_r.x,
        vel_rotated.y - omega_cross_r.y,
        vel_rotated.z - omega_cross_r.z,
    );

    (pos_itrf, vel_itrf)
}

/// Inverse of `to_itrf`'s rotation: ITRF -> TEME at `t_utc`.
pub fn from_itrf(pos_itrf: Vec3, t_utc: DateTime<Utc>) -> Vec3 {
    let theta = gmst_radians(t_utc);
    let (s, c) = theta.sin_cos();
    Vec3::new(
        pos_itrf.x * c - pos_itrf.y * s,
        pos_itrf.x * s + pos_itrf.y * c,
        pos_itrf.z,
    )
}

#[derive(Debug, Clone, Copy)]
pub struct GeodeticCoords {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_km: f64,
}

/// Iterative geodetic latitude solve against the WGS84 ellipsoid.
/// Converges when `|delta_lat| < 1e-11 rad` within `<= 5` iterations.
pub fn to_wgs84(pos_itrf: Vec3) -> Result<GeodeticCoords> {
    let x = pos_itrf.x;
    let y = pos_itrf.y;
    let z = pos_itrf.z;

    let lon = y.atan2(x);
    let p = (x * x + y * y).sqrt();

    let mut lat = z.atan2(p * (1.0 - WGS84_E2));
    let mut converged = false;

    for _ in 0..MAX_GEODETIC_ITERATIONS {
        let sin_lat = lat.sin();
        let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let lat_new = (z + WGS84_E2 * n * sin_lat).atan2(p);
        if (lat_new - lat).abs() < GEODETIC_CONVERGENCE_RAD {
            lat = lat_new;
            converged = true;
            break;
        }
        lat = lat_new;
    }

    if !converged {
        return Err(TimeError::FrameTransformNonConvergent(
            MAX_GEODETIC_ITERATIONS,
        ));
    }

    let sin_lat = lat.sin();
    let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let alt = if lat.cos().abs() > 1e-12 {
        p / lat.cos() - n
    } else {
        z.abs() - n * (1.0 - WGS84_E2)
    };

    Ok(GeodeticCoords {
        lat_deg: lat.to_degrees(),
        lon_deg: lon.to_degrees(),
        alt_km: alt,
    })
}

/// Geodetic WGS84 -> ECEF/ITRF, used to place the ground observer in the
/// same frame as the propagated satellite position.
pub fn geodetic_to_ecef(coords: GeodeticCoords) -> Vec3 {
    let lat = coords.lat_deg.to_radians();
    let lon = coords.lon_deg.to_radians();
    let sin_lat = lat.sin();
    let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    let x = (n + coords.alt_km) * lat.cos() * lon.cos();
    let y = (n + coords.alt_km) * lat.cos() * lon.sin();
    let z = (n * (1.0 - WGS84_E2) + coords.alt_km) * sin_lat;

    Vec3::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn gmst_is_normalised() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let g = gmst_radians(t);
        assert!((0.0..std::f64::consts::TAU).contains(&g));
    }

    #[test]
    fn ecef_round_trip_is_submeter() {
        let coords = GeodeticCoords {
            lat_deg: 24.9441,
            lon_deg: 121.3714,
            alt_km: 0.035,
        };
        let ecef = geodetic_to_ecef(coords);
        let back = to_wgs84(ecef).expect("must converge");
        let ecef2 = geodetic_to_ecef(back);
        let diff = ecef.sub(&ecef2).norm() * 1000.0;
        assert!(diff < 1.0, "round trip error {diff} m exceeds 1 m");
    }

    proptest! {
        #[test]
        fn geodetic_round_trip_holds_globally(
            lat in -89.9f64..89.9,
            lon in -180.0f64..180.0,
            alt in 0.0f64..2000.0,
        ) {
            let coords = GeodeticCoords { lat_deg: lat, lon_deg: lon, alt_km: alt };
            let ecef = geodetic_to_ecef(coords);
            let back = to_wgs84(ecef).expect("must converge");
            let ecef2 = geodetic_to_ecef(back);
            let diff_m = ecef.sub(&ecef2).norm() * 1000.0;
            prop_assert!(diff_m < 1.0);
        }
    }
}
