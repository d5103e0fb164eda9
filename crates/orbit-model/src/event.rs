use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    A3,
    A4,
    A5,
    D2,
}

impl EventType {
    pub const fn standard_reference(self) -> &'static str {
        "3GPP TS 38.331 §5.5.4"
    }

    /// Tie-break priority at equal `t`: higher sorts first. A5 > D2 > A4 > A3.
    pub const fn tie_break_priority(self) -> u8 {
        match self {
            EventType::A5 => 3,
            EventType::D2 => 2,
            EventType::A4 => 1,
            EventType::A3 => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: String,
    pub event_type: EventType,
    pub t: DateTime<Utc>,
    pub serving_sat_id: String,
    pub neighbor_sat_id: String,
    pub measurements: BTreeMap<String, f64>,
    pub trigger_margin: f64,
    pub standard_reference: String,
    pub time_to_trigger_ms: u64,
}
