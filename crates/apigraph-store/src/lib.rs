//! apigraph Store - Knowledge Graph persistence
//!
//! Provides:
//! - JSON graph documents written atomically (temp→rename)
//! - Snapshot-at-load reads shared as `Arc<KnowledgeGraph>`
//! - Spec and live-sample ingestion with a per-graph pass counter
//! - Canonical SHA-256 graph digests

pub mod errors;
pub mod observations;
pub mod persist;
pub mod store;

pub use errors::Result;
pub use observations::{parse_observations, read_observations_file};
pub use store::{GraphStore, IngestReport, MergePolicy};
