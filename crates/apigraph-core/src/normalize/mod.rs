//! Schema Normalizer
//!
//! Converts heterogeneous type declarations into the canonical [`SchemaNode`]
//! tree. Two inputs are supported:
//!
//! - [`declared`]: JSON-Schema-like declarations from specification documents
//!   (`type`/`properties`/`items`/`required`, `$ref`, `allOf`, `enum`).
//! - [`observed`]: sampled JSON values from live traffic, inferred to the
//!   narrowest consistent node and merged across samples.
//!
//! Both are pure and bounded by a configurable depth; anything deeper
//! collapses to `Unknown` and is reported through a [`NormalizationNote`].
//!
//! [`SchemaNode`]: crate::model::SchemaNode
//! [`NormalizationNote`]: crate::model::NormalizationNote

pub mod declared;
pub mod observed;

pub use declared::{normalize_declared, DeclaredNormalizer};
pub use observed::{infer_value, SampleInference};

/// Append a child segment to a dotted field path.
pub(crate) fn join_path(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", base, segment)
    }
}

/// Field path for the element of an array at `base`.
pub(crate) fn items_path(base: &str) -> String {
    format!("{}[]", base)
}
