//! apigraph Engine - Analyzer orchestration
//!
//! Provides the `Analyzer` capability interface, an explicit registry, and
//! the breaking-change, drift and dependency analyzers with their reports.
//!
//! ## Logging Ownership
//!
//! `AnalyzerRegistry::invoke` owns lifecycle logging for tool calls
//! (`log_op_start!` / `log_op_end!` / `log_op_error!` with a request id).
//! Analyzers themselves use only `tracing::debug!()`.

pub mod analyzer;
pub mod analyzers;
pub mod errors;
pub mod report;

pub use analyzer::{Analyzer, AnalyzerInfo, AnalyzerRegistry};
pub use errors::Result;
pub use report::{BreakingChangeReport, DependencyReport, DriftReport};
