//! Error helpers for analyzer invocation

use apigraph_core::errors::{ApiGraphError, ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// A comparison side or graph could not be resolved
///
/// The underlying failure, if any, is kept as the source so callers see
/// both "which side" and "why".
pub fn missing_input(side: &str, reason: impl Into<String>, cause: Option<ExError>) -> ExError {
    let err: ExError = ApiGraphError::MissingInput {
        side: side.to_string(),
        reason: reason.into(),
    }
    .into();
    match cause {
        Some(cause) => err.with_source(cause),
        None => err,
    }
}

/// Tool parameters did not match the analyzer's contract
pub fn invalid_params(analyzer: &str, reason: impl Into<String>) -> ExError {
    ExError::from(ApiGraphError::InvalidParameters {
        reason: reason.into(),
    })
    .with_op(analyzer.to_string())
}

/// Report serialization failed
pub fn report_serialization(analyzer: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(analyzer.to_string())
        .with_message(format!("failed to serialize report: {}", err))
}
