//! The three registered analyzers.

pub mod breaking;
pub mod dependency;
pub mod drift;

pub use breaking::{BreakingChangeAnalyzer, BreakingChangeParams, GraphSource};
pub use dependency::{DependencyAnalyzer, DependencyParams};
pub use drift::{DriftAnalyzer, DriftParams};
