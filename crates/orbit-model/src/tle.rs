use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Constellation {
    Starlink,
    Oneweb,
    Other,
}

impl Constellation {
    /// Nominal orbital period in minutes, used by the period-completeness
    /// gate and the RL dataset builder.
    pub fn orbital_period_minutes(self) -> f64 {
        match self {
            Constellation::Starlink => 95.0,
            Constellation::Oneweb => 110.0,
            Constellation::Other => 100.0,
        }
    }

    pub fn parse(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "starlink" => Constellation::Starlink,
            "oneweb" => Constellation::Oneweb,
            _ => Constellation::Other,
        }
    }
}

/// A single Two-Line-Element record. `epoch_datetime` is authoritative and
/// is never overridden by any pipeline-wide "base time" - there is no such
/// thing; each satellite propagates from its own epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TleRecord {
    pub norad_id: u32,
    pub constellation: Constellation,
    pub line1: String,
    pub line2: String,
    pub epoch_datetime: DateTime<Utc>,
}

impl TleRecord {
    pub fn sat_id(&self) -> String {
        format!("sat-{}", self.norad_id)
    }

    /// Mean motion in revolutions/day, decoded from TLE line 2 columns 52-63
    /// (1-indexed), and the resulting orbital period in minutes.
    pub fn mean_motion_rev_per_day(&self) -> Option<f64> {
        let field = self.line2.get(52..63)?;
        field.trim().parse::<f64>().ok()
    }

    pub fn period_minutes(&self) -> Option<f64> {
        let mm = self.mean_motion_rev_per_day()?;
        if mm <= 0.0 {
            None
        } else {
            Some(1440.0 / mm)
        }
    }
}
