//! Error handling for apigraph-store
//!
//! Wraps apigraph-core ExError with store-specific helpers

use apigraph_core::errors::{ApiGraphError, ExError, ExErrorKind};
use std::path::Path;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a storage error for a graph file
pub fn storage_error(path: &Path, reason: impl Into<String>) -> ExError {
    ApiGraphError::StorageError {
        path: path.display().to_string(),
        reason: reason.into(),
    }
    .into()
}

/// Create an IO error
pub fn io_error(operation: &str, path: &Path, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_location(path.display().to_string())
        .with_message(err.to_string())
}

/// Create a serialization error
pub fn serialization_error(operation: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Attach the source file to a spec or observation parse failure
pub fn spec_parse_error(path: &Path, err: ApiGraphError) -> ExError {
    let ex: ExError = err.into();
    let message = format!("{}: {}", path.display(), ex.message());
    ex.with_op("ingest_file").with_message(message)
}

/// Reject a graph name that cannot be used as a file stem
pub fn invalid_graph_name(name: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("graph_name")
        .with_message(format!(
            "invalid graph name '{}': use letters, digits, '.', '_' or '-' and do not start with '.'",
            name
        ))
}

/// A lock was poisoned by a panicking writer
pub fn lock_poisoned(operation: &str) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(operation.to_string())
        .with_message("graph cache lock poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_kind_and_location() {
        let err = storage_error(Path::new("/data/petstore.json"), "corrupt document");
        assert_eq!(err.kind(), ExErrorKind::Storage);
        assert_eq!(err.location(), Some("/data/petstore.json"));
    }

    #[test]
    fn test_spec_parse_error_keeps_kind_and_names_file() {
        let err = spec_parse_error(
            Path::new("specs/v2.yaml"),
            ApiGraphError::UnsupportedFormat {
                version: "1.2".to_string(),
            },
        );
        assert_eq!(err.kind(), ExErrorKind::UnsupportedFormat);
        assert!(err.message().starts_with("specs/v2.yaml: "));
    }
}
