//! Canonical schema tree.
//!
//! Every type declaration (from a spec or from a sampled JSON value) is
//! normalized into a [`SchemaNode`] at the ingestion boundary. Trees are
//! immutable once built; comparison never mutates them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Leaf type of a scalar schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
    Null,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Number => "number",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Null => "null",
        }
    }
}

/// Tagged schema variant with a `kind` discriminator in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SchemaNode {
    Scalar {
        #[serde(rename = "type")]
        scalar: ScalarKind,
        /// Allowed literal values (canonical JSON text), when declared via `enum`/`const`.
        #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
        values: Option<BTreeSet<String>>,
    },
    Array {
        items: Box<SchemaNode>,
    },
    Object {
        #[serde(default)]
        fields: BTreeMap<String, SchemaNode>,
        #[serde(default)]
        required: BTreeSet<String>,
    },
    /// Untyped, absent, truncated or structurally incomparable.
    Unknown,
}

impl SchemaNode {
    pub fn scalar(kind: ScalarKind) -> Self {
        SchemaNode::Scalar {
            scalar: kind,
            values: None,
        }
    }

    pub fn string() -> Self {
        Self::scalar(ScalarKind::String)
    }

    pub fn number() -> Self {
        Self::scalar(ScalarKind::Number)
    }

    pub fn boolean() -> Self {
        Self::scalar(ScalarKind::Boolean)
    }

    pub fn enumeration<I, S>(kind: ScalarKind, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SchemaNode::Scalar {
            scalar: kind,
            values: Some(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn array(items: SchemaNode) -> Self {
        SchemaNode::Array {
            items: Box::new(items),
        }
    }

    /// Object node; `required` names must be a subset of `fields`.
    pub fn object<F, R, S>(fields: F, required: R) -> Self
    where
        F: IntoIterator<Item = (S, SchemaNode)>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SchemaNode::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    pub fn empty_object() -> Self {
        SchemaNode::Object {
            fields: BTreeMap::new(),
            required: BTreeSet::new(),
        }
    }

    /// Short type label used in change descriptions.
    pub fn type_label(&self) -> String {
        match self {
            SchemaNode::Scalar { scalar, .. } => scalar.as_str().to_string(),
            SchemaNode::Array { items } => format!("array<{}>", items.type_label()),
            SchemaNode::Object { .. } => "object".to_string(),
            SchemaNode::Unknown => "unknown".to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SchemaNode::Unknown)
    }

    /// Whether this is an object declaring at least one required field.
    pub fn has_required_fields(&self) -> bool {
        matches!(self, SchemaNode::Object { required, .. } if !required.is_empty())
    }

    /// Nesting depth (leaves are depth 1).
    pub fn depth(&self) -> usize {
        match self {
            SchemaNode::Scalar { .. } | SchemaNode::Unknown => 1,
            SchemaNode::Array { items } => 1 + items.depth(),
            SchemaNode::Object { fields, .. } => {
                1 + fields.values().map(SchemaNode::depth).max().unwrap_or(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_uses_kind_discriminator() {
        let node = SchemaNode::object(
            [("id", SchemaNode::string()), ("tags", SchemaNode::array(SchemaNode::string()))],
            ["id"],
        );
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "object",
                "fields": {
                    "id": {"kind": "scalar", "type": "string"},
                    "tags": {"kind": "array", "items": {"kind": "scalar", "type": "string"}}
                },
                "required": ["id"]
            })
        );
        let back: SchemaNode = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_unknown_serializes_bare() {
        let value = serde_json::to_value(SchemaNode::Unknown).unwrap();
        assert_eq!(value, json!({"kind": "unknown"}));
    }

    #[test]
    fn test_depth() {
        let nested = SchemaNode::object(
            [("a", SchemaNode::object([("b", SchemaNode::number())], Vec::<&str>::new()))],
            Vec::<&str>::new(),
        );
        assert_eq!(nested.depth(), 3);
        assert_eq!(SchemaNode::array(SchemaNode::number()).type_label(), "array<number>");
    }
}
