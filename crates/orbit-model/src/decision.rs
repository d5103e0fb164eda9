use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub sat_id: String,
    pub signal_score: f64,
    pub geometry_score: f64,
    pub stability_score: f64,
    pub overall_score: f64,
    pub rsrp_improvement_db: f64,
    pub distance_change_km: f64,
    pub feasible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoverDecision {
    pub decision_id: String,
    pub t: DateTime<Utc>,
    pub recommend_handover: bool,
    pub target_sat_id: Option<String>,
    pub confidence: f64,
    pub reasoning: BTreeMap<String, bool>,
    pub candidate_evaluations: Vec<CandidateEvaluation>,
}
