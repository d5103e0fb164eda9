use crate::error::{PipelineError, Result};
use crate::tle::TleRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Metadata keys whose presence indicates a unified-time-base bug: a single
/// "base time" shared across satellites instead of each TLE's own epoch.
const FORBIDDEN_METADATA_KEYS: &[&str] = &[
    "calculation_base_time",
    "primary_epoch_time",
    "unified_time_base",
];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TleCatalog {
    pub tle_data: Vec<TleRecord>,
    #[serde(default)]
    pub metadata: Value,
}

/// Loads and validates the Stage-1 input artifact. Fails fast - no empty
/// fallback is ever returned in place of a real error.
pub fn load_catalog(path: &Path) -> Result<TleCatalog> {
    if !path.exists() {
        return Err(PipelineError::InputMissing(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::InputMalformed(format!("cannot read {}: {e}", path.display())))?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| PipelineError::InputMalformed(format!("invalid JSON: {e}")))?;

    check_academic_compliance(&value)?;

    let catalog: TleCatalog = serde_json::from_value(value)
        .map_err(|e| PipelineError::InputMalformed(format!("schema violation: {e}")))?;

    if catalog.tle_data.is_empty() {
        return Err(PipelineError::InputMalformed(
            "tle_data is empty".to_string(),
        ));
    }

    Ok(catalog)
}

/// Rejects any input whose `metadata` object carries a unified-time-base
/// field. Each TLE's own `epoch_datetime` is the only authoritative
/// propagation origin.
fn check_academic_compliance(value: &Value) -> Result<()> {
    if let Some(metadata) = value.get("metadata").and_then(Value::as_object) {
        for key in FORBIDDEN_METADATA_KEYS {
            if metadata.contains_key(*key) {
                return Err(PipelineError::AcademicComplianceViolation(format!(
                    "metadata.{key} is present; no unified time base is permitted"
                )));
            }
        }
    }

    if let Some(entries) = value.get("tle_data").and_then(Value::as_array) {
        for (i, entry) in entries.iter().enumerate() {
            let has_epoch = entry
                .get("epoch_datetime")
                .map(|v| !v.is_null())
                .unwrap_or(false);
            if !has_epoch {
                return Err(PipelineError::AcademicComplianceViolation(format!(
                    "tle_data[{i}] is missing epoch_datetime"
                )));
            }
        }
    }

    Ok(())
}
