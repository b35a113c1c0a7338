use apigraph_core_types::RequestId;
use thiserror::Error;

/// Result type alias using ApiGraphError
pub type Result<T> = std::result::Result<T, ApiGraphError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers can match on
/// programmatically and that tool front-ends can return verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Ingestion
    /// Malformed specification or observation document
    Parse,
    /// Specification version tag is missing or not supported
    UnsupportedFormat,
    /// The same endpoint key appears twice in one ingestion pass
    DuplicateEndpoint,
    /// The same parameter name appears twice on one endpoint
    DuplicateParameter,

    // Analyzer invocation
    /// A required graph/spec side could not be resolved
    MissingInput,
    /// Tool parameters are not shaped as the analyzer expects
    InvalidInput,
    /// No analyzer is registered under the requested name
    UnknownAnalyzer,
    /// A named graph does not exist in the store
    NotFound,

    // Persistence
    /// Graph persistence read/write failure
    Storage,
    Io,
    Serialization,

    // Configuration
    Config,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Parse => "ERR_PARSE",
            ExErrorKind::UnsupportedFormat => "ERR_UNSUPPORTED_FORMAT",
            ExErrorKind::DuplicateEndpoint => "ERR_DUPLICATE_ENDPOINT",
            ExErrorKind::DuplicateParameter => "ERR_DUPLICATE_PARAMETER",
            ExErrorKind::MissingInput => "ERR_MISSING_INPUT",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::UnknownAnalyzer => "ERR_UNKNOWN_ANALYZER",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Storage => "ERR_STORAGE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// True for kinds that fail an ingestion call (the graph store is left untouched)
    pub fn is_ingestion_failure(&self) -> bool {
        matches!(
            self,
            ExErrorKind::Parse
                | ExErrorKind::UnsupportedFormat
                | ExErrorKind::DuplicateEndpoint
                | ExErrorKind::DuplicateParameter
        )
    }
}

/// Canonical structured error type
///
/// Carries the classification used for programmatic handling plus the
/// context needed to debug a failure (operation, endpoint, document location).
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    endpoint: Option<String>,
    location: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            endpoint: None,
            location: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add endpoint key context (rendered as `METHOD /path`)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Add document location context (pointer path or line/column)
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the endpoint context, if any
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Get the document location, if any
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(endpoint) = &self.endpoint {
            write!(f, " (endpoint: {})", endpoint)?;
        }
        if let Some(location) = &self.location {
            write!(f, " (at: {})", location)?;
        }
        if let Some(source) = &self.source {
            write!(f, "; caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for graph construction and analysis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiGraphError {
    // ===== Ingestion =====
    /// Malformed document structure
    #[error("Parse error{}: {reason}", .location.as_ref().map(|l| format!(" at {l}")).unwrap_or_default())]
    ParseError {
        location: Option<String>,
        reason: String,
    },

    /// The document declares a spec version this engine does not accept
    #[error("Unsupported specification format: {version}")]
    UnsupportedFormat { version: String },

    /// Two operations normalize to the same endpoint key
    #[error("Duplicate endpoint in one ingestion pass: {key}")]
    DuplicateEndpoint { key: String },

    /// Two parameters share a name on one endpoint
    #[error("Duplicate parameter '{name}' on endpoint {endpoint}")]
    DuplicateParameter { endpoint: String, name: String },

    // ===== Analyzer =====
    /// A required side of a comparison could not be resolved
    #[error("Missing input for '{side}': {reason}")]
    MissingInput { side: String, reason: String },

    /// Tool parameters are malformed
    #[error("Invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    /// No analyzer registered under this name
    #[error("Unknown analyzer: {name}")]
    UnknownAnalyzer { name: String },

    /// Named graph is not present in the store
    #[error("Graph not found: {name}")]
    GraphNotFound { name: String },

    // ===== Persistence / config =====
    /// Graph persistence failure
    #[error("Storage error at {path}: {reason}")]
    StorageError { path: String, reason: String },

    /// Configuration rejected
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Conversion from ApiGraphError to ExError
///
/// Keeps the domain enum ergonomic for pattern matching inside the core
/// while the store and engine layers speak `ExError`.
impl From<ApiGraphError> for ExError {
    fn from(err: ApiGraphError) -> Self {
        let message = err.to_string();
        match err {
            ApiGraphError::ParseError { location, .. } => {
                let e = ExError::new(ExErrorKind::Parse).with_message(message);
                match location {
                    Some(location) => e.with_location(location),
                    None => e,
                }
            }
            ApiGraphError::UnsupportedFormat { .. } => {
                ExError::new(ExErrorKind::UnsupportedFormat).with_message(message)
            }
            ApiGraphError::DuplicateEndpoint { key } => ExError::new(ExErrorKind::DuplicateEndpoint)
                .with_endpoint(key)
                .with_message(message),
            ApiGraphError::DuplicateParameter { endpoint, .. } => {
                ExError::new(ExErrorKind::DuplicateParameter)
                    .with_endpoint(endpoint)
                    .with_message(message)
            }
            ApiGraphError::MissingInput { .. } => {
                ExError::new(ExErrorKind::MissingInput).with_message(message)
            }
            ApiGraphError::InvalidParameters { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }
            ApiGraphError::UnknownAnalyzer { .. } => {
                ExError::new(ExErrorKind::UnknownAnalyzer).with_message(message)
            }
            ApiGraphError::GraphNotFound { .. } => {
                ExError::new(ExErrorKind::NotFound).with_message(message)
            }
            ApiGraphError::StorageError { path, .. } => ExError::new(ExErrorKind::Storage)
                .with_location(path)
                .with_message(message),
            ApiGraphError::InvalidConfig { .. } => {
                ExError::new(ExErrorKind::Config).with_message(message)
            }
        }
    }
}
