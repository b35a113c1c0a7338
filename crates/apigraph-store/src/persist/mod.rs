//! Graph persistence
//!
//! Provides:
//! - The persisted JSON document format
//! - Atomic temp→rename writes
//! - Canonical SHA-256 graph digests

mod atomic;
mod format;

pub use atomic::atomic_write;
pub use format::{graph_digest, PersistedEndpoint, PersistedGraph};
