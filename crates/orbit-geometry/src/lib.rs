//! Observer-relative look angles. Grounded on the teacher's
//! `calculate_look_angles` (ENU/SEZ rotation), generalised from its
//! `Nano9` fixed-point arithmetic to plain `f64` and from a GMST=0
//! simplification to the proper `orbit_time::to_itrf` transform.

use orbit_model::{GeodeticPosition, LookAngles, Vec3};
use orbit_time::{geodetic_to_ecef, GeodeticCoords};

/// Below this horizontal-component magnitude (km) the satellite is treated
/// as directly overhead and azimuth is defined as 0 deg.
const OVERHEAD_EPSILON_KM: f64 = 1e-9;

/// Computes elevation/azimuth/range for a satellite at ECEF `sat_ecef` as
/// seen from an observer at geodetic `(lat, lon, alt)`.
pub fn look_angles(observer: GeodeticPosition, sat_ecef: Vec3) -> LookAngles {
    let observer_ecef = geodetic_to_ecef(GeodeticCoords {
        lat_deg: observer.lat_deg,
        lon_deg: observer.lon_deg,
        alt_km: observer.alt_km,
    });

    let delta = sat_ecef.sub(&observer_ecef);
    let range_km = delta.norm();

    let lat = observer.lat_deg.to_radians();
    let lon = observer.lon_deg.to_radians();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();

    // Rotate the ECEF relative vector into the local ENU basis.
    let east = -sin_lon * delta.x + cos_lon * delta.y;
    let north = -sin_lat * cos_lon * delta.x - sin_lat * sin_lon * delta.y + cos_lat * delta.z;
    let up = cos_lat * cos_lon * delta.x + cos_lat * sin_lon * delta.y + sin_lat * delta.z;

    let horizontal = (east * east + north * north).sqrt();

    let elevation_deg = up.atan2(horizontal).to_degrees();
    let azimuth_deg = if horizontal < OVERHEAD_EPSILON_KM {
        0.0
    } else {
        let az = east.atan2(north).to_degrees();
        if az < 0.0 {
            az + 360.0
        } else {
            az
        }
    };

    LookAngles {
        elevation_deg,
        azimuth_deg,
        range_km,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directly_overhead_has_zero_azimuth_and_ninety_elevation() {
        let observer = GeodeticPosition {
            lat_deg: 24.9441,
            lon_deg: 121.3714,
            alt_km: 0.035,
        };
        let observer_ecef = geodetic_to_ecef(GeodeticCoords {
            lat_deg: observer.lat_deg,
            lon_deg: observer.lon_deg,
            alt_km: observer.alt_km,
        });
        // Place the satellite straight up along the observer's own zenith
        // direction at 550 km altitude.
        let zenith = GeodeticCoords {
            lat_deg: observer.lat_deg,
            lon_deg: observer.lon_deg,
            alt_km: observer.alt_km + 550.0,
        };
        let sat_ecef = geodetic_to_ecef(zenith);
        let angles = look_angles(observer, sat_ecef);
        assert!((angles.elevation_deg - 90.0).abs() < 1e-6);
        assert_eq!(angles.azimuth_deg, 0.0);
        assert!((angles.range_km - 550.0).abs() < 1e-3);
        let _ = observer_ecef;
    }

    #[test]
    fn azimuth_is_always_in_0_360() {
        let observer = GeodeticPosition {
            lat_deg: 10.0,
            lon_deg: -50.0,
            alt_km: 0.0,
        };
        for lon_offset in [-30.0, -5.0, 5.0, 30.0, 170.0, -170.0] {
            let sat = geodetic_to_ecef(GeodeticCoords {
                lat_deg: observer.lat_deg + 2.0,
                lon_deg: observer.lon_deg + lon_offset,
                alt_km: 550.0,
            });
            let angles = look_angles(observer, sat);
            assert!((0.0..360.0).contains(&angles.azimuth_deg));
        }
    }

    #[test]
    fn range_matches_euclidean_distance() {
        let observer = GeodeticPosition {
            lat_deg: 24.9441,
            lon_deg: 121.3714,
            alt_km: 0.035,
        };
        let observer_ecef = geodetic_to_ecef(GeodeticCoords {
            lat_deg: observer.lat_deg,
            lon_deg: observer.lon_deg,
            alt_km: observer.alt_km,
        });
        let sat_ecef = Vec3::new(4000.0, 3000.0, 5000.0);
        let angles = look_angles(observer, sat_ecef);
        let expected = sat_ecef.sub(&observer_ecef).norm();
        assert!((angles.range_km - expected).abs() < 1e-6);
    }
}
