use apigraph_core::errors::{ApiGraphError, ExError, ExErrorKind};

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (ExErrorKind::Parse, "ERR_PARSE"),
        (ExErrorKind::UnsupportedFormat, "ERR_UNSUPPORTED_FORMAT"),
        (ExErrorKind::DuplicateEndpoint, "ERR_DUPLICATE_ENDPOINT"),
        (ExErrorKind::DuplicateParameter, "ERR_DUPLICATE_PARAMETER"),
        (ExErrorKind::MissingInput, "ERR_MISSING_INPUT"),
        (ExErrorKind::InvalidInput, "ERR_INVALID_INPUT"),
        (ExErrorKind::UnknownAnalyzer, "ERR_UNKNOWN_ANALYZER"),
        (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
        (ExErrorKind::Storage, "ERR_STORAGE"),
        (ExErrorKind::Io, "ERR_IO"),
        (ExErrorKind::Serialization, "ERR_SERIALIZATION"),
        (ExErrorKind::Config, "ERR_CONFIG"),
        (ExErrorKind::Internal, "ERR_INTERNAL"),
    ];
    for (kind, expected_code) in kinds {
        assert_eq!(kind.code(), expected_code);
    }
}

#[test]
fn test_duplicate_endpoint_carries_endpoint() {
    let err = ApiGraphError::DuplicateEndpoint {
        key: "GET /users/{id}".to_string(),
    };
    let ex: ExError = err.into();
    assert_eq!(ex.kind(), ExErrorKind::DuplicateEndpoint);
    assert_eq!(ex.endpoint(), Some("GET /users/{id}"));
    assert!(ex.kind().is_ingestion_failure());
}

#[test]
fn test_storage_error_carries_path() {
    let err = ApiGraphError::StorageError {
        path: "/tmp/graphs/petstore.json".to_string(),
        reason: "disk full".to_string(),
    };
    let ex: ExError = err.into();
    assert_eq!(ex.kind(), ExErrorKind::Storage);
    assert_eq!(ex.location(), Some("/tmp/graphs/petstore.json"));
    assert!(ex.message().contains("disk full"));
}

#[test]
fn test_missing_input_message_names_side() {
    let err = ApiGraphError::MissingInput {
        side: "new".to_string(),
        reason: "snapshot 'v2' not found".to_string(),
    };
    assert_eq!(err.to_string(), "Missing input for 'new': snapshot 'v2' not found");
    let ex: ExError = err.into();
    assert_eq!(ex.code(), "ERR_MISSING_INPUT");
}

#[test]
fn test_parse_error_without_location() {
    let err = ApiGraphError::ParseError {
        location: None,
        reason: "empty document".to_string(),
    };
    assert_eq!(err.to_string(), "Parse error: empty document");
    let ex: ExError = err.into();
    assert_eq!(ex.location(), None);
}

#[test]
fn test_source_chain_is_exposed() {
    use std::error::Error as _;
    let inner = ExError::new(ExErrorKind::Io).with_message("permission denied");
    let outer = ExError::new(ExErrorKind::Storage)
        .with_op("save_graph")
        .with_source(inner);
    let source = outer.source().expect("source");
    assert!(source.to_string().contains("ERR_IO"));
    assert_eq!(outer.source_error().map(ExError::kind), Some(ExErrorKind::Io));
}
