use serde_json::Value;
use std::collections::BTreeMap;

use crate::model::{ScalarKind, SchemaNode};

/// Accumulated shape of one or more samples.
///
/// Keeps "no information yet" apart from "samples disagree", which both
/// end up as `Unknown` but merge differently.
#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Empty,
    Null,
    Scalar(ScalarKind),
    Array(Box<Shape>),
    Object {
        fields: BTreeMap<String, Shape>,
        seen: BTreeMap<String, usize>,
        samples: usize,
    },
    Conflict,
}

impl Shape {
    fn merge(self, other: Shape) -> Shape {
        match (self, other) {
            (Shape::Empty, x) | (x, Shape::Empty) => x,
            (Shape::Conflict, _) | (_, Shape::Conflict) => Shape::Conflict,
            (Shape::Null, x) | (x, Shape::Null) => x,
            (Shape::Scalar(a), Shape::Scalar(b)) if a == b => Shape::Scalar(a),
            (Shape::Array(a), Shape::Array(b)) => Shape::Array(Box::new(a.merge(*b))),
            (
                Shape::Object {
                    mut fields,
                    mut seen,
                    samples,
                },
                Shape::Object {
                    fields: other_fields,
                    seen: other_seen,
                    samples: other_samples,
                },
            ) => {
                for (name, shape) in other_fields {
                    let merged = match fields.remove(&name) {
                        Some(existing) => existing.merge(shape),
                        None => shape,
                    };
                    fields.insert(name, merged);
                }
                for (name, count) in other_seen {
                    *seen.entry(name).or_insert(0) += count;
                }
                Shape::Object {
                    fields,
                    seen,
                    samples: samples + other_samples,
                }
            }
            _ => Shape::Conflict,
        }
    }

    fn into_node(self) -> SchemaNode {
        match self {
            Shape::Empty | Shape::Conflict => SchemaNode::Unknown,
            Shape::Null => SchemaNode::scalar(ScalarKind::Null),
            Shape::Scalar(kind) => SchemaNode::scalar(kind),
            Shape::Array(items) => SchemaNode::array(items.into_node()),
            Shape::Object {
                fields,
                seen,
                samples,
            } => {
                let required = seen
                    .into_iter()
                    .filter(|(_, count)| *count == samples)
                    .map(|(name, _)| name)
                    .collect();
                SchemaNode::Object {
                    fields: fields.into_iter().map(|(k, v)| (k, v.into_node())).collect(),
                    required,
                }
            }
        }
    }
}

/// Incremental inference over response samples for one endpoint and status.
#[derive(Debug, Clone)]
pub struct SampleInference {
    max_depth: usize,
    shape: Shape,
    samples: usize,
    truncated: bool,
}

impl SampleInference {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            shape: Shape::Empty,
            samples: 0,
            truncated: false,
        }
    }

    pub fn add(&mut self, value: &Value) {
        let sample = self.shape_of(value, 1);
        let current = std::mem::replace(&mut self.shape, Shape::Empty);
        self.shape = current.merge(sample);
        self.samples += 1;
    }

    pub fn sample_count(&self) -> usize {
        self.samples
    }

    /// Whether any sample nested deeper than the configured bound.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn finish(self) -> SchemaNode {
        self.shape.into_node()
    }

    fn shape_of(&mut self, value: &Value, depth: usize) -> Shape {
        if depth > self.max_depth {
            self.truncated = true;
            return Shape::Conflict;
        }
        match value {
            Value::Null => Shape::Null,
            Value::Bool(_) => Shape::Scalar(ScalarKind::Boolean),
            // Integers and floats both infer as `number`.
            Value::Number(_) => Shape::Scalar(ScalarKind::Number),
            Value::String(_) => Shape::Scalar(ScalarKind::String),
            Value::Array(items) => {
                let mut element = Shape::Empty;
                for item in items {
                    let next = self.shape_of(item, depth + 1);
                    element = element.merge(next);
                }
                Shape::Array(Box::new(element))
            }
            Value::Object(map) => {
                let mut fields = BTreeMap::new();
                let mut seen = BTreeMap::new();
                for (name, v) in map {
                    fields.insert(name.clone(), self.shape_of(v, depth + 1));
                    seen.insert(name.clone(), 1);
                }
                Shape::Object {
                    fields,
                    seen,
                    samples: 1,
                }
            }
        }
    }
}

/// Infer the narrowest node consistent with a single sampled value.
pub fn infer_value(value: &Value, max_depth: usize) -> SchemaNode {
    let mut inference = SampleInference::new(max_depth);
    inference.add(value);
    inference.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_infers_number() {
        assert_eq!(infer_value(&json!(42), 10), SchemaNode::number());
        assert_eq!(infer_value(&json!(4.2), 10), SchemaNode::number());
    }

    #[test]
    fn test_object_fields_all_required_for_single_sample() {
        let node = infer_value(&json!({"id": "u1", "age": 3}), 10);
        assert_eq!(
            node,
            SchemaNode::object(
                [("age", SchemaNode::number()), ("id", SchemaNode::string())],
                ["age", "id"]
            )
        );
    }

    #[test]
    fn test_field_required_only_when_in_every_sample() {
        let mut inf = SampleInference::new(10);
        inf.add(&json!({"id": "a", "nick": "x"}));
        inf.add(&json!({"id": "b"}));
        let node = inf.finish();
        assert_eq!(
            node,
            SchemaNode::object(
                [("id", SchemaNode::string()), ("nick", SchemaNode::string())],
                ["id"]
            )
        );
    }

    #[test]
    fn test_null_merges_into_other_kind() {
        let mut inf = SampleInference::new(10);
        inf.add(&json!({"name": null}));
        inf.add(&json!({"name": "bob"}));
        let node = inf.finish();
        assert_eq!(
            node,
            SchemaNode::object([("name", SchemaNode::string())], ["name"])
        );
    }

    #[test]
    fn test_incompatible_kinds_become_unknown() {
        let mut inf = SampleInference::new(10);
        inf.add(&json!("a"));
        inf.add(&json!(1));
        inf.add(&json!("b"));
        assert_eq!(inf.finish(), SchemaNode::Unknown);
    }

    #[test]
    fn test_empty_array_items_unknown_until_seen() {
        assert_eq!(infer_value(&json!([]), 10), SchemaNode::array(SchemaNode::Unknown));
        let mut inf = SampleInference::new(10);
        inf.add(&json!([]));
        inf.add(&json!([true]));
        assert_eq!(inf.finish(), SchemaNode::array(SchemaNode::boolean()));
    }

    #[test]
    fn test_depth_bound_truncates() {
        let mut inf = SampleInference::new(2);
        inf.add(&json!({"a": {"b": {"c": 1}}}));
        assert!(inf.is_truncated());
        let inner = SchemaNode::object([("b", SchemaNode::Unknown)], ["b"]);
        assert_eq!(inf.finish(), SchemaNode::object([("a", inner)], ["a"]));
    }
}
