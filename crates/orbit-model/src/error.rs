use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error kinds for the pipeline, per the stage-to-stage error
/// handling contract. Every non-`Ok` exit writes one of these as a single
/// JSON object on stderr.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("required input missing: {0}")]
    InputMissing(PathBuf),

    #[error("malformed input: {0}")]
    InputMalformed(String),

    #[error("academic compliance violation: {0}")]
    AcademicComplianceViolation(String),

    #[error("propagation failure for satellite {sat_id}: {code}")]
    PropagationFailure { sat_id: String, code: String },

    #[error("frame transform did not converge for satellite {sat_id} at t={t}")]
    FrameTransformNonConvergent { sat_id: String, t: String },

    #[error("stage {stage} exceeded its time budget")]
    StageTimeout { stage: String },

    #[error("validation failed: {check}")]
    ValidationFailed { check: String, detail: String },

    #[error("insufficient coverage: {0}")]
    InsufficientCoverage(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Process exit code per the CLI contract in SPEC_FULL.md §6.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::InputMissing(_) => 3,
            PipelineError::InputMalformed(_) => 3,
            PipelineError::AcademicComplianceViolation(_) => 1,
            PipelineError::PropagationFailure { .. } => 2,
            PipelineError::FrameTransformNonConvergent { .. } => 2,
            PipelineError::StageTimeout { .. } => 2,
            PipelineError::ValidationFailed { .. } => 1,
            PipelineError::InsufficientCoverage(_) => 1,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            PipelineError::InputMissing(_) => "InputMissing",
            PipelineError::InputMalformed(_) => "InputMalformed",
            PipelineError::AcademicComplianceViolation(_) => "AcademicComplianceViolation",
            PipelineError::PropagationFailure { .. } => "PropagationFailure",
            PipelineError::FrameTransformNonConvergent { .. } => "FrameTransformNonConvergent",
            PipelineError::StageTimeout { .. } => "StageTimeout",
            PipelineError::ValidationFailed { .. } => "ValidationFailed",
            PipelineError::InsufficientCoverage(_) => "InsufficientCoverage",
        }
    }

    /// The stderr JSON contract: `{error_kind, location, detail, remediation_hint}`.
    pub fn to_report(&self, location: &str) -> ErrorReport {
        ErrorReport {
            error_kind: self.kind_name().to_string(),
            location: location.to_string(),
            detail: self.to_string(),
            remediation_hint: self.remediation_hint(),
        }
    }

    fn remediation_hint(&self) -> String {
        match self {
            PipelineError::InputMissing(p) => {
                format!("provide the input file at {}", p.display())
            }
            PipelineError::InputMalformed(_) => {
                "check the input JSON against the documented TLE catalog schema".to_string()
            }
            PipelineError::AcademicComplianceViolation(_) => {
                "remove unified-time-base fields; every TLE must carry its own epoch_datetime"
                    .to_string()
            }
            PipelineError::PropagationFailure { .. } => {
                "the affected satellite was dropped; verify its TLE is well-formed".to_string()
            }
            PipelineError::FrameTransformNonConvergent { .. } => {
                "the affected snapshot was dropped; check observer coordinates".to_string()
            }
            PipelineError::StageTimeout { .. } => {
                "increase --workers or reduce the observation window".to_string()
            }
            PipelineError::ValidationFailed { .. } => {
                "see the validation_snapshots artifact for the full check report".to_string()
            }
            PipelineError::InsufficientCoverage(_) => {
                "widen the observation window so it spans at least 0.9x the constellation period"
                    .to_string()
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub error_kind: String,
    pub location: String,
    pub detail: String,
    pub remediation_hint: String,
}
