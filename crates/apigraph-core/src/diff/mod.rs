//! Structural diff engine.
//!
//! Compares two endpoint-descriptor sets (or two schema trees) and produces an
//! ordered, severity-classified list of [`ChangeRecord`]s.
//!
//! ## Entry point
//!
//! ```ignore
//! use apigraph_core::diff::{diff_graphs, DiffReport};
//!
//! let records = diff_graphs(&old, &new);
//! let report = DiffReport::new(records);
//! println!("{}", report.summary_line());
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: identical inputs produce identical ordered output.
//! - **Idempotence**: a graph diffed against itself yields no records.
//! - **Total**: structurally incomparable nodes degrade to `informational`
//!   records; comparison never fails.
//!
//! [`ChangeRecord`]: crate::model::ChangeRecord

pub mod engine;
pub mod human_summary;
pub mod model;

pub use engine::{diff_descriptors, diff_endpoint, diff_graphs, diff_schema, BodyRole, SchemaDiffMode};
pub use human_summary::{render_human_summary, summary_line};
pub use model::{ChangeCounts, DiffReport, EndpointSeverity};
