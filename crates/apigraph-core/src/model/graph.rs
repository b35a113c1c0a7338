//! The knowledge graph: endpoint descriptors keyed by [`EndpointKey`] plus
//! inferred resource edges and normalization notes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::endpoint::EndpointDescriptor;
use super::key::{EndpointKey, HttpMethod};
use crate::errors::{ApiGraphError, Result};

/// Direction/meaning of a resource edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// `from` produces an identifier that `to` consumes.
    ProvidesIdentifier,
    /// `from` needs a resource produced by `to`.
    RequiresResource,
}

/// Name-reconciliation rule that produced an inferred edge, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Exact,
    Plural,
    CaseFold,
}

/// How much an inferred edge should be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// A producer/consumer relationship between two endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEdge {
    pub from: EndpointKey,
    pub to: EndpointKey,
    pub resource: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<MatchRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

impl ResourceEdge {
    pub fn provides(from: EndpointKey, to: EndpointKey, resource: impl Into<String>) -> Self {
        Self {
            from,
            to,
            resource: resource.into(),
            edge_type: EdgeType::ProvidesIdentifier,
            rule: None,
            confidence: None,
        }
    }

    fn sort_key(&self) -> (&EndpointKey, &EndpointKey, &str, EdgeType) {
        (&self.from, &self.to, self.resource.as_str(), self.edge_type)
    }
}

/// Why a normalization note was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteReason {
    /// Nesting exceeded the configured depth; the subtree collapsed to `Unknown`.
    DepthLimit,
    /// A `$ref` target could not be found; normalized to `Unknown`.
    UnresolvedReference,
    /// `oneOf`/`anyOf`/`not` cannot be compared structurally; normalized to `Unknown`.
    CompositeSchema,
}

/// Precision loss recorded during normalization, surfaced in analyzer output.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationNote {
    pub endpoint: String,
    pub field_path: String,
    pub reason: NoteReason,
    pub detail: String,
}

/// Result of a single insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Existing descriptor came from an older pass and was overwritten.
    Replaced,
    /// Existing descriptor is from a newer pass; the incoming one was dropped.
    KeptExisting,
}

/// Counts reported by [`KnowledgeGraph::merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MergeSummary {
    pub inserted: usize,
    pub replaced: usize,
    pub kept_existing: usize,
}

/// In-memory model of an API surface.
///
/// Analyzers only ever read a graph; mutation happens at ingestion and in the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KnowledgeGraph {
    endpoints: BTreeMap<EndpointKey, EndpointDescriptor>,
    edges: Vec<ResourceEdge>,
    notes: Vec<NormalizationNote>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from descriptors of one ingestion pass.
    ///
    /// # Errors
    ///
    /// `DuplicateEndpoint` when two descriptors share a key, or
    /// `DuplicateParameter` when a descriptor repeats a parameter name.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = EndpointDescriptor>) -> Result<Self> {
        let mut graph = Self::new();
        for d in descriptors {
            graph.insert(d)?;
        }
        Ok(graph)
    }

    /// Insert a descriptor with last-write-wins by ingestion pass.
    ///
    /// # Errors
    ///
    /// `DuplicateEndpoint` when a descriptor with the same key *and* the same
    /// pass is already present, `DuplicateParameter` on an invalid descriptor.
    pub fn insert(&mut self, descriptor: EndpointDescriptor) -> Result<InsertOutcome> {
        descriptor.validate()?;
        match self.endpoints.get(&descriptor.key) {
            None => {
                self.endpoints.insert(descriptor.key.clone(), descriptor);
                Ok(InsertOutcome::Inserted)
            }
            Some(existing) if existing.pass == descriptor.pass => {
                Err(ApiGraphError::DuplicateEndpoint {
                    key: descriptor.key.to_string(),
                })
            }
            Some(existing) if existing.pass > descriptor.pass => Ok(InsertOutcome::KeptExisting),
            Some(_) => {
                // Drop the stale entry first so the incoming template becomes the key.
                self.endpoints.remove(&descriptor.key);
                self.drop_notes_for(&descriptor.key);
                self.endpoints.insert(descriptor.key.clone(), descriptor);
                Ok(InsertOutcome::Replaced)
            }
        }
    }

    /// Merge a graph from a later ingestion pass into this one.
    ///
    /// Endpoints absent from `newer` are kept. Edges are unioned and pruned to
    /// endpoints that still exist.
    pub fn merge(&mut self, newer: KnowledgeGraph) -> MergeSummary {
        let mut summary = MergeSummary::default();
        let KnowledgeGraph {
            endpoints,
            edges,
            notes,
        } = newer;
        let mut accepted = BTreeSet::new();
        for (_, descriptor) in endpoints {
            let key = descriptor.key.clone();
            let outcome = match self.endpoints.get(&key) {
                None => InsertOutcome::Inserted,
                Some(existing) if existing.pass >= descriptor.pass => InsertOutcome::KeptExisting,
                Some(_) => InsertOutcome::Replaced,
            };
            match outcome {
                InsertOutcome::Inserted => summary.inserted += 1,
                InsertOutcome::Replaced => summary.replaced += 1,
                InsertOutcome::KeptExisting => {
                    summary.kept_existing += 1;
                    continue;
                }
            }
            self.endpoints.remove(&key);
            self.drop_notes_for(&key);
            self.endpoints.insert(key.clone(), descriptor);
            accepted.insert(key.to_string());
        }
        self.notes.extend(
            notes
                .into_iter()
                .filter(|n| accepted.contains(&n.endpoint)),
        );
        self.notes.sort();
        self.notes.dedup();

        let mut all_edges = std::mem::take(&mut self.edges);
        all_edges.extend(edges);
        self.set_edges(all_edges);
        summary
    }

    pub fn get(&self, key: &EndpointKey) -> Option<&EndpointDescriptor> {
        self.endpoints.get(key)
    }

    pub fn contains(&self, key: &EndpointKey) -> bool {
        self.endpoints.contains_key(key)
    }

    /// Descriptors in key order.
    pub fn endpoints(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.endpoints.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &EndpointKey> {
        self.endpoints.keys()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Resolve a concrete request path to the most specific declared template.
    ///
    /// Ties on literal-segment count resolve to the lexically smallest key.
    pub fn match_request(&self, method: HttpMethod, concrete_path: &str) -> Option<&EndpointKey> {
        let mut best: Option<(&EndpointKey, usize)> = None;
        for key in self.endpoints.keys().filter(|k| k.method() == method) {
            if let Some(score) = key.match_concrete(concrete_path) {
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((key, score));
                }
            }
        }
        best.map(|(k, _)| k)
    }

    pub fn edges(&self) -> &[ResourceEdge] {
        &self.edges
    }

    /// Replace the edge set; edges are deduplicated, sorted, and pruned to known endpoints.
    pub fn set_edges(&mut self, mut edges: Vec<ResourceEdge>) {
        edges.retain(|e| self.endpoints.contains_key(&e.from) && self.endpoints.contains_key(&e.to));
        edges.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        edges.dedup_by(|a, b| a.sort_key() == b.sort_key());
        self.edges = edges;
    }

    /// `requires_resource` view for a consuming endpoint, derived from stored edges.
    pub fn requirements_of(&self, key: &EndpointKey) -> Vec<ResourceEdge> {
        let mut out: Vec<ResourceEdge> = self
            .edges
            .iter()
            .filter_map(|e| match e.edge_type {
                EdgeType::ProvidesIdentifier if &e.to == key => Some(ResourceEdge {
                    from: e.to.clone(),
                    to: e.from.clone(),
                    resource: e.resource.clone(),
                    edge_type: EdgeType::RequiresResource,
                    rule: e.rule,
                    confidence: e.confidence,
                }),
                EdgeType::RequiresResource if &e.from == key => Some(e.clone()),
                _ => None,
            })
            .collect();
        out.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        out.dedup_by(|a, b| a.sort_key() == b.sort_key());
        out
    }

    pub fn notes(&self) -> &[NormalizationNote] {
        &self.notes
    }

    pub fn add_notes(&mut self, notes: impl IntoIterator<Item = NormalizationNote>) {
        self.notes.extend(notes);
        self.notes.sort();
        self.notes.dedup();
    }

    fn drop_notes_for(&mut self, key: &EndpointKey) {
        self.notes.retain(|n| {
            EndpointKey::parse(&n.endpoint)
                .map(|k| &k != key)
                .unwrap_or(true)
        });
    }
}
