//! Pure, synchronous kernel of the API knowledge graph.
//!
//! Builds a canonical model of an HTTP API surface from specification
//! documents or live samples and compares models structurally. Nothing here
//! performs network or file I/O apart from configuration loading.

pub use apigraph_core_types;

pub mod builder;
pub mod config;
pub mod dependency;
pub mod diff;
pub mod drift;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod normalize;

pub use config::EngineConfig;
pub use errors::{ApiGraphError, ExError, ExErrorKind, Result};
pub use model::{
    ChangeKind, ChangeRecord, EndpointDescriptor, EndpointKey, HttpMethod, KnowledgeGraph,
    Observation, ResourceEdge, SchemaNode, Severity,
};
