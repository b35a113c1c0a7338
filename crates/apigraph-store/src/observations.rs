//! Observation file reading.
//!
//! Accepts either a JSON array of observations or JSON Lines (one
//! observation object per non-blank line).

use crate::errors::{io_error, spec_parse_error, Result};
use apigraph_core::errors::ApiGraphError;
use apigraph_core::model::Observation;
use std::path::Path;

/// Parse observation text.
///
/// # Errors
///
/// `ParseError` naming the offending line for JSON Lines input.
pub fn parse_observations(text: &str) -> std::result::Result<Vec<Observation>, ApiGraphError> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| ApiGraphError::ParseError {
            location: Some(format!("line {}, column {}", e.line(), e.column())),
            reason: e.to_string(),
        });
    }
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let obs = serde_json::from_str(line).map_err(|e| ApiGraphError::ParseError {
            location: Some(format!("line {}", idx + 1)),
            reason: e.to_string(),
        })?;
        out.push(obs);
    }
    Ok(out)
}

/// Read and parse an observation file.
///
/// # Errors
///
/// `Io` when the file cannot be read, `Parse` when its content is malformed.
pub fn read_observations_file(path: &Path) -> Result<Vec<Observation>> {
    let text = std::fs::read_to_string(path).map_err(|e| io_error("read_observations", path, e))?;
    let observations = parse_observations(&text).map_err(|e| spec_parse_error(path, e))?;
    tracing::debug!(
        path = %path.display(),
        count = observations.len(),
        "Read observations"
    );
    Ok(observations)
}
