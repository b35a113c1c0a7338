use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use super::{items_path, join_path};
use crate::model::{NormalizationNote, NoteReason, ScalarKind, SchemaNode};

/// Normalizes declared schemas against one source document.
///
/// The document is used to resolve local `$ref` pointers such as
/// `#/components/schemas/User` or `#/definitions/User`. Notes accumulate
/// across calls and are drained with [`DeclaredNormalizer::take_notes`].
pub struct DeclaredNormalizer<'doc> {
    document: &'doc Value,
    max_depth: usize,
    notes: Vec<NormalizationNote>,
}

impl<'doc> DeclaredNormalizer<'doc> {
    pub fn new(document: &'doc Value, max_depth: usize) -> Self {
        Self {
            document,
            max_depth,
            notes: Vec::new(),
        }
    }

    /// Normalize `schema` declared on `endpoint` at `field_path`.
    pub fn normalize(&mut self, schema: &Value, endpoint: &str, field_path: &str) -> SchemaNode {
        self.normalize_at(schema, endpoint, field_path, 1)
    }

    /// Resolve a local JSON pointer reference (`#/a/b`).
    pub fn resolve_ref(&self, reference: &str) -> Option<&'doc Value> {
        let pointer = reference.strip_prefix('#')?;
        if pointer.is_empty() {
            return Some(self.document);
        }
        self.document.pointer(pointer)
    }

    pub fn notes(&self) -> &[NormalizationNote] {
        &self.notes
    }

    pub fn take_notes(&mut self) -> Vec<NormalizationNote> {
        std::mem::take(&mut self.notes)
    }

    fn note(&mut self, endpoint: &str, field_path: &str, reason: NoteReason, detail: impl Into<String>) {
        let detail = detail.into();
        if reason == NoteReason::DepthLimit {
            tracing::warn!(
                endpoint = endpoint,
                field_path = field_path,
                max_depth = self.max_depth,
                "schema truncated at depth limit"
            );
        }
        self.notes.push(NormalizationNote {
            endpoint: endpoint.to_string(),
            field_path: field_path.to_string(),
            reason,
            detail,
        });
    }

    fn normalize_at(&mut self, schema: &Value, endpoint: &str, path: &str, depth: usize) -> SchemaNode {
        if depth > self.max_depth {
            self.note(
                endpoint,
                path,
                NoteReason::DepthLimit,
                format!("nesting deeper than {} collapsed to unknown", self.max_depth),
            );
            return SchemaNode::Unknown;
        }
        let Some(obj) = schema.as_object() else {
            return SchemaNode::Unknown;
        };

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            return match self.resolve_ref(reference) {
                Some(target) => self.normalize_at(target, endpoint, path, depth + 1),
                None => {
                    self.note(
                        endpoint,
                        path,
                        NoteReason::UnresolvedReference,
                        format!("reference '{}' not found", reference),
                    );
                    SchemaNode::Unknown
                }
            };
        }

        if let Some(members) = obj.get("allOf").and_then(Value::as_array) {
            return self.normalize_all_of(obj, members, endpoint, path, depth);
        }

        for keyword in ["oneOf", "anyOf"] {
            if let Some(branches) = obj.get(keyword).and_then(Value::as_array) {
                // `anyOf: [X, {type: null}]` is a nullable X, not a real union.
                let non_null: Vec<&Value> = branches.iter().filter(|b| !is_null_schema(b)).collect();
                if non_null.len() == 1 {
                    return self.normalize_at(non_null[0], endpoint, path, depth + 1);
                }
                self.note(
                    endpoint,
                    path,
                    NoteReason::CompositeSchema,
                    format!("{} with {} branches is not compared structurally", keyword, branches.len()),
                );
                return SchemaNode::Unknown;
            }
        }
        if obj.contains_key("not") {
            self.note(endpoint, path, NoteReason::CompositeSchema, "negated schema");
            return SchemaNode::Unknown;
        }

        match declared_type(obj) {
            DeclaredType::Named(name) => self.typed(obj, name, endpoint, path, depth),
            DeclaredType::Union(count) => {
                self.note(
                    endpoint,
                    path,
                    NoteReason::CompositeSchema,
                    format!("type union of {} kinds", count),
                );
                SchemaNode::Unknown
            }
            DeclaredType::Absent => {
                if obj.contains_key("properties") {
                    self.typed(obj, "object", endpoint, path, depth)
                } else if obj.contains_key("items") {
                    self.typed(obj, "array", endpoint, path, depth)
                } else if let Some(kind) = enum_kind(obj) {
                    scalar_with_values(kind, obj)
                } else {
                    SchemaNode::Unknown
                }
            }
        }
    }

    fn typed(&mut self, obj: &Map<String, Value>, name: &str, endpoint: &str, path: &str, depth: usize) -> SchemaNode {
        match name {
            "string" => scalar_with_values(ScalarKind::String, obj),
            "integer" | "number" => scalar_with_values(ScalarKind::Number, obj),
            "boolean" => scalar_with_values(ScalarKind::Boolean, obj),
            "null" => SchemaNode::scalar(ScalarKind::Null),
            "array" => {
                let items = match obj.get("items") {
                    Some(items) => self.normalize_at(items, endpoint, &items_path(path), depth + 1),
                    None => SchemaNode::Unknown,
                };
                SchemaNode::array(items)
            }
            "object" => {
                let mut fields = BTreeMap::new();
                if let Some(props) = obj.get("properties").and_then(Value::as_object) {
                    for (name, prop) in props {
                        let child = self.normalize_at(prop, endpoint, &join_path(path, name), depth + 1);
                        fields.insert(name.clone(), child);
                    }
                }
                let required: BTreeSet<String> = obj
                    .get("required")
                    .and_then(Value::as_array)
                    .map(|names| {
                        names
                            .iter()
                            .filter_map(Value::as_str)
                            .filter(|n| fields.contains_key(*n))
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                SchemaNode::Object { fields, required }
            }
            _ => SchemaNode::Unknown,
        }
    }

    fn normalize_all_of(
        &mut self,
        obj: &Map<String, Value>,
        members: &[Value],
        endpoint: &str,
        path: &str,
        depth: usize,
    ) -> SchemaNode {
        let mut parts: Vec<SchemaNode> = members
            .iter()
            .map(|m| self.normalize_at(m, endpoint, path, depth + 1))
            .collect();
        // Sibling keywords next to `allOf` contribute like one more member.
        let mut rest = obj.clone();
        rest.remove("allOf");
        if rest.contains_key("properties") || rest.contains_key("type") {
            parts.push(self.normalize_at(&Value::Object(rest), endpoint, path, depth));
        }
        let mut merged: Option<SchemaNode> = None;
        for part in parts {
            merged = Some(match merged {
                None => part,
                Some(acc) => match merge_all_of(acc, part) {
                    Some(node) => node,
                    None => {
                        self.note(
                            endpoint,
                            path,
                            NoteReason::CompositeSchema,
                            "allOf members have incompatible kinds",
                        );
                        return SchemaNode::Unknown;
                    }
                },
            });
        }
        merged.unwrap_or(SchemaNode::Unknown)
    }
}

/// Normalize a standalone schema; `$ref`s resolve against the schema itself.
pub fn normalize_declared(schema: &Value, max_depth: usize) -> (SchemaNode, Vec<NormalizationNote>) {
    let mut normalizer = DeclaredNormalizer::new(schema, max_depth);
    let node = normalizer.normalize(schema, "", "");
    (node, normalizer.take_notes())
}

enum DeclaredType<'a> {
    Named(&'a str),
    Union(usize),
    Absent,
}

/// Read `type`, treating `["string", "null"]` as a nullable string.
fn declared_type(obj: &Map<String, Value>) -> DeclaredType<'_> {
    match obj.get("type") {
        Some(Value::String(name)) => DeclaredType::Named(name.as_str()),
        Some(Value::Array(names)) => {
            let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
            let non_null: Vec<&str> = names.iter().copied().filter(|n| *n != "null").collect();
            match (non_null.len(), names.len()) {
                (0, 0) => DeclaredType::Absent,
                (0, _) => DeclaredType::Named("null"),
                (1, _) => DeclaredType::Named(non_null[0]),
                (n, _) => DeclaredType::Union(n),
            }
        }
        _ => DeclaredType::Absent,
    }
}

fn is_null_schema(schema: &Value) -> bool {
    matches!(schema.get("type").and_then(Value::as_str), Some("null"))
}

fn enum_kind(obj: &Map<String, Value>) -> Option<ScalarKind> {
    let first = obj
        .get("enum")
        .and_then(Value::as_array)
        .and_then(|v| v.iter().find(|x| !x.is_null()))
        .or_else(|| obj.get("const"))?;
    match first {
        Value::String(_) => Some(ScalarKind::String),
        Value::Number(_) => Some(ScalarKind::Number),
        Value::Bool(_) => Some(ScalarKind::Boolean),
        _ => None,
    }
}

fn scalar_with_values(kind: ScalarKind, obj: &Map<String, Value>) -> SchemaNode {
    let values: Option<BTreeSet<String>> = match (obj.get("enum"), obj.get("const")) {
        (Some(Value::Array(values)), _) => Some(
            values
                .iter()
                .filter(|v| !v.is_null())
                .map(Value::to_string)
                .collect(),
        ),
        (_, Some(constant)) => Some(std::iter::once(constant.to_string()).collect()),
        _ => None,
    };
    SchemaNode::Scalar {
        scalar: kind,
        values,
    }
}

/// Merge two `allOf` members. Objects union fields and required sets; equal
/// scalars intersect their enumerations. Anything else is incompatible.
fn merge_all_of(a: SchemaNode, b: SchemaNode) -> Option<SchemaNode> {
    match (a, b) {
        (SchemaNode::Unknown, other) | (other, SchemaNode::Unknown) => Some(other),
        (
            SchemaNode::Object {
                fields: mut fa,
                required: mut ra,
            },
            SchemaNode::Object {
                fields: fb,
                required: rb,
            },
        ) => {
            for (name, node) in fb {
                let merged = match fa.remove(&name) {
                    Some(existing) => merge_all_of(existing, node)?,
                    None => node,
                };
                fa.insert(name, merged);
            }
            ra.extend(rb);
            Some(SchemaNode::Object {
                fields: fa,
                required: ra,
            })
        }
        (
            SchemaNode::Scalar {
                scalar: ka,
                values: va,
            },
            SchemaNode::Scalar {
                scalar: kb,
                values: vb,
            },
        ) if ka == kb => {
            let values = match (va, vb) {
                (Some(x), Some(y)) => Some(x.intersection(&y).cloned().collect()),
                (x, None) => x,
                (None, y) => y,
            };
            Some(SchemaNode::Scalar { scalar: ka, values })
        }
        (SchemaNode::Array { items: ia }, SchemaNode::Array { items: ib }) => {
            Some(SchemaNode::array(merge_all_of(*ia, *ib)?))
        }
        _ => None,
    }
}
