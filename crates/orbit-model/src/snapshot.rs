use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn sub(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeodeticPosition {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_km: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LookAngles {
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    pub range_km: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VisibilityFlags {
    pub elevation_ok: bool,
    pub range_ok: bool,
    pub geographic_ok: bool,
}

impl VisibilityFlags {
    pub fn is_visible(&self) -> bool {
        self.elevation_ok && self.range_ok && self.geographic_ok
    }
}

/// One satellite's state at a single instant, annotated progressively by
/// C2 (position_teme/velocity_teme), C1 (position_itrf/position_wgs84), C3
/// (look_angles/visibility_flags), and C7 (rsrp_dbm/sinr_db).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteSnapshot {
    pub sat_id: String,
    pub t: DateTime<Utc>,
    pub position_teme: Vec3,
    pub velocity_teme: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_itrf: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_wgs84: Option<GeodeticPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub look_angles: Option<LookAngles>,
    pub visibility_flags: VisibilityFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsrp_dbm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sinr_db: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsrq_db: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_margin_db: Option<f64>,
}

impl SatelliteSnapshot {
    pub fn is_connectable(&self) -> bool {
        self.visibility_flags.is_visible()
    }
}
