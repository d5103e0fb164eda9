//! AHP-weighted handover candidate evaluation. Weights and decision
//! thresholds grounded verbatim on
//! `original_source/handover_constants.py::HandoverDecisionWeights`.

use chrono::{DateTime, Utc};
use orbit_link::score_snapshot;
use orbit_model::config::PipelineConfig;
use orbit_model::decision::{CandidateEvaluation, HandoverDecision};
use orbit_model::SatelliteSnapshot;
use std::collections::BTreeMap;

const HANDOVER_SCORE_THRESHOLD: f64 = 0.6;
const MIN_RSRP_IMPROVEMENT_DB: f64 = 3.0;
const MAX_DISTANCE_CHANGE_KM: f64 = 500.0;

/// Evaluates every candidate against the currently serving satellite and
/// recommends a handover iff the best candidate's overall score clears
/// 0.6, its RSRP improvement exceeds 3 dB, its distance change stays under
/// 500 km, and it independently clears the feasibility threshold.
pub fn evaluate_handover(
    decision_id: String,
    t: DateTime<Utc>,
    serving: &SatelliteSnapshot,
    candidates: &[SatelliteSnapshot],
    config: &PipelineConfig,
) -> HandoverDecision {
    let serving_rsrp = serving.rsrp_dbm.unwrap_or(f64::NEG_INFINITY);
    let serving_range = serving.look_angles.map(|a| a.range_km).unwrap_or(f64::INFINITY);

    let mut evaluations: Vec<CandidateEvaluation> = candidates
        .iter()
        .map(|candidate| {
            let score = score_snapshot(candidate, config.ahp_weights);
            let candidate_rsrp = candidate.rsrp_dbm.unwrap_or(f64::NEG_INFINITY);
            let candidate_range = candidate
                .look_angles
                .map(|a| a.range_km)
                .unwrap_or(f64::INFINITY);

            CandidateEvaluation {
                sat_id: candidate.sat_id.clone(),
                signal_score: score.signal,
                geometry_score: score.geometry,
                stability_score: score.stability,
                overall_score: score.overall,
                rsrp_improvement_db: candidate_rsrp - serving_rsrp,
                distance_change_km: (candidate_range - serving_range).abs(),
                feasible: score.overall >= config.min_feasibility_score,
            }
        })
        .collect();

    evaluations.sort_by(|a, b| b.overall_score.partial_cmp(&a.overall_score).unwrap());

    let best = evaluations.first().cloned();
    let mut reasoning = BTreeMap::new();

    let (recommend_handover, target_sat_id, confidence) = match &best {
        Some(best) => {
            let score_above_threshold = best.overall_score > HANDOVER_SCORE_THRESHOLD;
            let rsrp_improvement_sufficient = best.rsrp_improvement_db > MIN_RSRP_IMPROVEMENT_DB;
            let distance_change_acceptable = best.distance_change_km < MAX_DISTANCE_CHANGE_KM;
            let candidate_feasible = best.feasible;

            reasoning.insert("score_above_threshold".to_string(), score_above_threshold);
            reasoning.insert("rsrp_improvement_sufficient".to_string(), rsrp_improvement_sufficient);
            reasoning.insert("distance_change_acceptable".to_string(), distance_change_acceptable);
            reasoning.insert("candidate_feasible".to_string(), candidate_feasible);

            let recommend = score_above_threshold
                && rsrp_improvement_sufficient
                && distance_change_acceptable
                && candidate_feasible;

            (
                recommend,
                recommend.then(|| best.sat_id.clone()),
                best.overall_score.clamp(0.0, 1.0),
            )
        }
        None => (false, None, 0.0),
    };

    HandoverDecision {
        decision_id,
        t,
        recommend_handover,
        target_sat_id,
        confidence,
        reasoning,
        candidate_evaluations: std::mem::take(&mut evaluations),
    }
}
