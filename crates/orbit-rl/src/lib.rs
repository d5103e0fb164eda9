//! State/action/reward encoding for DQN/A3C/PPO/SAC handover-policy
//! training. State-vector field order grounded on
//! `original_source/state_action_encoder.py::build_state_vector`; reward
//! composition grounded on
//! `original_source/reward_calculator.py::calculate_reward`. Unlike that
//! source, which always maps a handover action to a single fixed index,
//! the 5-way action space here distinguishes each of the four named
//! candidates - see DESIGN.md / SPEC_FULL.md REDESIGN FLAGS.

use orbit_model::SatelliteSnapshot;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const STATE_DIM: usize = 7;
pub const ACTION_DIM: usize = 5;
pub const DQN_REPLAY_BUFFER_SIZE: usize = 100_000;
pub const PPO_CLIP_EPSILON: f64 = 0.2;
pub const SAC_ALPHA: f64 = 0.2;

pub type StateVector = [f64; STATE_DIM];

/// `[lat, lon, alt, rsrp, elevation, distance, sinr]`. Returns `None` when
/// any required field is missing, matching the source's fail-closed
/// behaviour rather than substituting a default.
pub fn build_state_vector(snapshot: &SatelliteSnapshot) -> Option<StateVector> {
    let wgs84 = snapshot.position_wgs84?;
    let angles = snapshot.look_angles?;
    let rsrp = snapshot.rsrp_dbm?;
    let sinr = snapshot.sinr_db?;

    Some([
        wgs84.lat_deg,
        wgs84.lon_deg,
        wgs84.alt_km,
        rsrp,
        angles.elevation_deg,
        angles.range_km,
        sinr,
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    Maintain,
    HandoverCandidate(u8),
}

impl Action {
    /// 0 = maintain, 1..=4 = ho_candidate_1..4.
    pub fn index(self) -> usize {
        match self {
            Action::Maintain => 0,
            Action::HandoverCandidate(n) => n as usize,
        }
    }

    pub fn one_hot(self) -> [f64; ACTION_DIM] {
        let mut v = [0.0; ACTION_DIM];
        v[self.index()] = 1.0;
        v
    }
}

/// Fixed, documented per-action linear weights over the 7-dim state,
/// deterministic - no learned or random parameters.
const POLICY_WEIGHTS: [[f64; STATE_DIM]; ACTION_DIM] = [
    [0.0, 0.0, 0.0, 0.4, 0.3, -0.2, 0.1],
    [0.0, 0.0, 0.0, 0.5, 0.2, -0.3, 0.1],
    [0.0, 0.0, 0.0, 0.45, 0.25, -0.25, 0.15],
    [0.0, 0.0, 0.0, 0.4, 0.3, -0.2, 0.2],
    [0.0, 0.0, 0.0, 0.35, 0.35, -0.15, 0.1],
];

fn normalise_state(state: &StateVector) -> StateVector {
    let ranges = [
        (-90.0, 90.0),
        (-180.0, 180.0),
        (0.0, 2000.0),
        (-120.0, -60.0),
        (0.0, 90.0),
        (0.0, 2000.0),
        (-10.0, 30.0),
    ];
    let mut out = [0.0; STATE_DIM];
    for i in 0..STATE_DIM {
        let (min, max) = ranges[i];
        out[i] = ((state[i] - min) / (max - min)).clamp(0.0, 1.0);
    }
    out
}

fn softmax(logits: &[f64; ACTION_DIM]) -> [f64; ACTION_DIM] {
    let max = logits.iter().cloned().fold(f64::MIN, f64::max);
    let exps: Vec<f64> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    let mut out = [0.0; ACTION_DIM];
    for (i, e) in exps.iter().enumerate() {
        out[i] = e / sum;
    }
    out
}

/// Deterministic policy logits: a softmax over fixed linear combinations
/// of normalised state features. No random action generation.
pub fn policy_action_probs(state: &StateVector) -> [f64; ACTION_DIM] {
    let normalised = normalise_state(state);
    let mut logits = [0.0; ACTION_DIM];
    for (a, weights) in POLICY_WEIGHTS.iter().enumerate() {
        logits[a] = normalised.iter().zip(weights.iter()).map(|(s, w)| s * w).sum();
    }
    softmax(&logits)
}

/// A deterministic, state-hash-derived perturbation bounded to +/-5% of
/// full scale - simulating 3GPP TS 38.133 measurement uncertainty without
/// calling into any random-number generator.
fn state_hash_noise(state: &StateVector, action_index: usize) -> f64 {
    let mut hasher = DefaultHasher::new();
    for v in state {
        v.to_bits().hash(&mut hasher);
    }
    action_index.hash(&mut hasher);
    let h = hasher.finish();
    let fraction = (h % 10_000) as f64 / 10_000.0; // [0, 1)
    (fraction - 0.5) * 0.1 // [-0.05, 0.05]
}

/// PPO's "perturbed policy": the same deterministic logits with bounded
/// per-action noise applied before the softmax, re-normalised.
pub fn ppo_perturbed_action_probs(state: &StateVector) -> [f64; ACTION_DIM] {
    let normalised = normalise_state(state);
    let mut logits = [0.0; ACTION_DIM];
    for (a, weights) in POLICY_WEIGHTS.iter().enumerate() {
        let base: f64 = normalised.iter().zip(weights.iter()).map(|(s, w)| s * w).sum();
        logits[a] = base + state_hash_noise(state, a);
    }
    softmax(&logits)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RewardComponents {
    pub qos_gain: f64,
    pub interruption_penalty: f64,
    pub handover_cost: f64,
    pub quality_score: f64,
    pub total: f64,
}

/// `reward = qos_gain - 0.5*interruption - 0.1*ho_cost + quality_score`,
/// with each penalty component pre-signed so the total is a plain sum,
/// matching `reward_calculator.py::calculate_reward`'s structure.
pub fn compute_reward(
    current_rsrp_dbm: f64,
    next_rsrp_dbm: f64,
    next_is_usable: bool,
    next_quality_score: f64,
    action: Action,
) -> RewardComponents {
    let qos_gain = ((next_rsrp_dbm - current_rsrp_dbm) / 20.0).max(0.0);
    let interruption_penalty = if next_is_usable { 0.0 } else { -0.5 };
    let handover_cost = if matches!(action, Action::HandoverCandidate(_)) {
        -0.1
    } else {
        0.0
    };
    let quality_score = next_quality_score.clamp(0.0, 1.0);
    let total = qos_gain + interruption_penalty + handover_cost + quality_score;

    RewardComponents {
        qos_gain,
        interruption_penalty,
        handover_cost,
        quality_score,
        total,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DqnTransition {
    pub state: StateVector,
    pub action: usize,
    pub reward: f64,
    pub next_state: StateVector,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct A3cSample {
    pub state: StateVector,
    pub action_probs: [f64; ACTION_DIM],
    pub value: f64,
    pub advantage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PpoSample {
    pub state: StateVector,
    pub action_probs: [f64; ACTION_DIM],
    pub log_prob: f64,
    pub value: f64,
    pub advantage: f64,
    pub clip_epsilon: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SacSample {
    pub state: StateVector,
    pub action_probs: [f64; ACTION_DIM],
    pub soft_q: f64,
    pub entropy: f64,
    pub alpha: f64,
}

/// Builds one transition and its four algorithm-specific derived samples
/// from a (state, action, reward, next_state) tuple. `return_estimate` is
/// the Monte-Carlo or bootstrapped return `R` used for the advantage.
pub fn build_samples(
    state: StateVector,
    action: Action,
    reward: RewardComponents,
    next_state: StateVector,
    done: bool,
    return_estimate: f64,
) -> (DqnTransition, A3cSample, PpoSample, SacSample) {
    let action_probs = policy_action_probs(&state);
    // No learned critic: the value estimate is the immediate reward itself,
    // so the advantage reduces to `return_estimate - reward`.
    let value = reward.total;
    let advantage = return_estimate - value;

    let dqn = DqnTransition {
        state,
        action: action.index(),
        reward: reward.total,
        next_state,
        done,
    };

    let a3c = A3cSample {
        state,
        action_probs,
        value,
        advantage,
    };

    let perturbed = ppo_perturbed_action_probs(&state);
    let log_prob = perturbed[action.index()].max(f64::MIN_POSITIVE).ln();
    let ppo = PpoSample {
        state,
        action_probs: perturbed,
        log_prob,
        value,
        advantage,
        clip_epsilon: PPO_CLIP_EPSILON,
    };

    let entropy = -action_probs
        .iter()
        .map(|p| if *p > 0.0 { p * p.ln() } else { 0.0 })
        .sum::<f64>();
    let soft_q = value - SAC_ALPHA * entropy;
    let sac = SacSample {
        state,
        action_probs,
        soft_q,
        entropy,
        alpha: SAC_ALPHA,
    };

    (dqn, a3c, ppo, sac)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_STATE: StateVector = [24.9, 121.3, 550.0, -80.0, 45.0, 900.0, 12.0];

    #[test]
    fn action_probs_sum_to_one() {
        let probs = policy_action_probs(&SAMPLE_STATE);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn policy_is_deterministic_across_calls() {
        let a = policy_action_probs(&SAMPLE_STATE);
        let b = policy_action_probs(&SAMPLE_STATE);
        assert_eq!(a, b);
    }

    #[test]
    fn ppo_perturbation_is_bounded_and_deterministic() {
        let base = policy_action_probs(&SAMPLE_STATE);
        let perturbed_a = ppo_perturbed_action_probs(&SAMPLE_STATE);
        let perturbed_b = ppo_perturbed_action_probs(&SAMPLE_STATE);
        assert_eq!(perturbed_a, perturbed_b);
        for i in 0..ACTION_DIM {
            assert!((perturbed_a[i] - base[i]).abs() < 0.5);
        }
    }

    #[test]
    fn reward_components_sum_to_total() {
        let r = compute_reward(-90.0, -70.0, true, 0.8, Action::HandoverCandidate(2));
        let expected = r.qos_gain + r.interruption_penalty + r.handover_cost + r.quality_score;
        assert!((r.total - expected).abs() < 1e-12);
        assert_eq!(r.handover_cost, -0.1);
    }

    #[test]
    fn samples_are_byte_identical_across_runs() {
        let next_state = [25.0, 121.4, 550.0, -75.0, 50.0, 850.0, 14.0];
        let reward = compute_reward(-90.0, -75.0, true, 0.7, Action::Maintain);
        let (dqn_a, a3c_a, ppo_a, sac_a) =
            build_samples(SAMPLE_STATE, Action::Maintain, reward, next_state, false, 0.5);
        let (dqn_b, a3c_b, ppo_b, sac_b) =
            build_samples(SAMPLE_STATE, Action::Maintain, reward, next_state, false, 0.5);

        assert_eq!(dqn_a.reward, dqn_b.reward);
        assert_eq!(a3c_a.advantage, a3c_b.advantage);
        assert_eq!(ppo_a.log_prob, ppo_b.log_prob);
        assert_eq!(sac_a.soft_q, sac_b.soft_q);
    }
}
