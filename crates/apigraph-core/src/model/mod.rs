pub mod change;
pub mod endpoint;
pub mod graph;
pub mod key;
pub mod observation;
pub mod schema;

pub use change::{ChangeKind, ChangeRecord, Severity};
pub use endpoint::{EndpointDescriptor, EndpointMetadata, ParameterDescriptor, ParameterLocation};
pub use graph::{
    Confidence, EdgeType, InsertOutcome, KnowledgeGraph, MatchRule, MergeSummary,
    NormalizationNote, NoteReason, ResourceEdge,
};
pub use key::{EndpointKey, HttpMethod};
pub use observation::Observation;
pub use schema::{ScalarKind, SchemaNode};
