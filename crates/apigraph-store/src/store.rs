//! Directory-backed Knowledge Graph Store.
//!
//! Each named graph lives in `<root>/<name>.json`. Loaded graphs are cached as
//! `Arc<KnowledgeGraph>` snapshots: a writer builds a new graph and swaps the
//! cached `Arc`, so an analysis holding an earlier snapshot never observes a
//! mutation. Writers are serialized by a separate mutex so read-modify-write
//! ingestion cannot interleave.
//!
//! Each cache entry remembers the file's modification time and length; a
//! load whose file no longer matches rereads it, so graphs written by another
//! process sharing the directory are picked up.

use crate::errors::{
    invalid_graph_name, io_error, lock_poisoned, serialization_error, storage_error, Result,
};
use crate::observations::read_observations_file;
use crate::persist::{atomic_write, PersistedGraph};
use apigraph_core::builder::{SampleBuilder, SpecBuilder, SpecVersion};
use apigraph_core::config::NormalizerConfig;
use apigraph_core::errors::{ApiGraphError, ExError};
use apigraph_core::model::{EndpointKey, KnowledgeGraph, MergeSummary, Observation, ResourceEdge};
use apigraph_core::{log_op_end, log_op_error, log_op_start};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;

const GRAPH_EXTENSION: &str = "json";

/// How an ingestion pass combines with an existing graph of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// The ingested document becomes the whole graph.
    #[default]
    Replace,
    /// Endpoints are merged last-write-wins by pass; unseen endpoints are kept.
    Merge,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::Replace => "replace",
            MergePolicy::Merge => "merge",
        }
    }
}

impl FromStr for MergePolicy {
    type Err = ApiGraphError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replace" => Ok(MergePolicy::Replace),
            "merge" => Ok(MergePolicy::Merge),
            other => Err(ApiGraphError::InvalidParameters {
                reason: format!("unknown merge policy '{}' (expected replace or merge)", other),
            }),
        }
    }
}

/// Outcome of one ingestion pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub graph: String,
    pub pass: u64,
    pub policy: MergePolicy,
    /// Dialect of the ingested document; absent for live-sample ingestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<SpecVersion>,
    /// Endpoints in the stored graph after this pass.
    pub endpoints: usize,
    pub merge: MergeSummary,
    /// Sample groups dropped for lack of a successful response.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<EndpointKey>,
    pub notes: usize,
    pub digest: String,
}

/// Identity of a graph file as last read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        Some(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

struct CachedGraph {
    graph: Arc<KnowledgeGraph>,
    stamp: Option<FileStamp>,
}

/// Knowledge Graph Store rooted at a directory.
pub struct GraphStore {
    root: PathBuf,
    normalizer: NormalizerConfig,
    cache: RwLock<BTreeMap<String, CachedGraph>>,
    write_lock: Mutex<()>,
}

impl GraphStore {
    /// Open (and create if needed) a store directory.
    ///
    /// # Errors
    ///
    /// `Io` when the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| io_error("open_store", &root, e))?;
        Ok(Self {
            root,
            normalizer: NormalizerConfig::default(),
            cache: RwLock::new(BTreeMap::new()),
            write_lock: Mutex::new(()),
        })
    }

    /// Use `normalizer` settings for spec and sample ingestion.
    pub fn with_normalizer(mut self, normalizer: NormalizerConfig) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path backing a graph name.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for names that are not safe file stems.
    pub fn graph_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(format!("{}.{}", name, GRAPH_EXTENSION)))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.graph_path(name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Names of stored graphs in lexical order.
    ///
    /// # Errors
    ///
    /// `Io` when the directory cannot be listed.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries =
            std::fs::read_dir(&self.root).map_err(|e| io_error("list_graphs", &self.root, e))?;
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|x| x.to_str()) == Some(GRAPH_EXTENSION))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .filter(|n| validate_name(n).is_ok())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Snapshot of a stored graph.
    ///
    /// # Errors
    ///
    /// `NotFound` when no graph has this name, `Storage` when the file is corrupt.
    pub fn load(&self, name: &str) -> Result<Arc<KnowledgeGraph>> {
        if let Some(graph) = self.cached(name)? {
            return Ok(graph);
        }
        log_op_start!("load_graph", graph = name);
        let start = std::time::Instant::now();

        let result = self.read_from_disk(name).and_then(|(graph, stamp)| {
            let graph = Arc::new(graph);
            self.cache
                .write()
                .map_err(|_| lock_poisoned("load_graph"))?
                .insert(
                    name.to_string(),
                    CachedGraph {
                        graph: graph.clone(),
                        stamp,
                    },
                );
            Ok(graph)
        });

        let elapsed = start.elapsed().as_millis() as u64;
        match &result {
            Ok(graph) => log_op_end!(
                "load_graph",
                duration_ms = elapsed,
                graph = name,
                endpoints = graph.len()
            ),
            Err(e) => {
                let e_clone = e.clone();
                log_op_error!("load_graph", e_clone, duration_ms = elapsed, graph = name);
            }
        }
        result
    }

    /// Persist a graph under `name`, replacing any previous content.
    ///
    /// Returns the digest of the written document.
    ///
    /// # Errors
    ///
    /// `InvalidInput`, `Serialization` or `Io`; on failure the previous file is intact.
    pub fn save(&self, name: &str, graph: KnowledgeGraph) -> Result<String> {
        let _guard = self.write_lock.lock().map_err(|_| lock_poisoned("save_graph"))?;
        self.write_graph(name, graph)
    }

    /// SHA-256 digest of a stored graph's canonical form.
    ///
    /// # Errors
    ///
    /// As [`GraphStore::load`].
    pub fn digest(&self, name: &str) -> Result<String> {
        let graph = self.load(name)?;
        PersistedGraph::from(graph.as_ref())
            .digest()
            .map_err(|e| serialization_error("graph_digest", e))
    }

    /// Ingest specification text into a named graph.
    ///
    /// All-or-nothing: any parse or validation failure leaves the stored
    /// graph untouched.
    ///
    /// # Errors
    ///
    /// `Parse`, `UnsupportedFormat`, `DuplicateEndpoint`, `DuplicateParameter`,
    /// or a persistence error.
    pub fn ingest_spec_str(&self, name: &str, text: &str, policy: MergePolicy) -> Result<IngestReport> {
        log_op_start!("ingest_spec", graph = name, policy = policy.as_str());
        let start = std::time::Instant::now();

        let result = self.ingest_with(name, policy, |pass| {
            let output = SpecBuilder::new(&self.normalizer).build_str(text)?;
            let format = output.version;
            let graph = output.into_graph(pass)?;
            Ok((graph, Some(format), Vec::new()))
        });

        finish_ingest("ingest_spec", name, start, result)
    }

    /// Ingest a specification file.
    ///
    /// # Errors
    ///
    /// `Io` when the file cannot be read; otherwise as [`GraphStore::ingest_spec_str`],
    /// with parse failures naming the file.
    pub fn ingest_spec_file(&self, name: &str, path: &Path, policy: MergePolicy) -> Result<IngestReport> {
        let text = std::fs::read_to_string(path).map_err(|e| io_error("read_spec", path, e))?;
        self.ingest_spec_str(name, &text, policy).map_err(|e| {
            if e.kind().is_ingestion_failure() {
                let message = format!("{}: {}", path.display(), e.message());
                e.with_message(message)
            } else {
                e
            }
        })
    }

    /// Build descriptors from live samples and ingest them into a named graph.
    ///
    /// # Errors
    ///
    /// A persistence error; sample groups without a success are reported in
    /// `excluded`, not failed.
    pub fn ingest_observations(
        &self,
        name: &str,
        observations: &[Observation],
        policy: MergePolicy,
    ) -> Result<IngestReport> {
        log_op_start!(
            "ingest_observations",
            graph = name,
            policy = policy.as_str(),
            observations = observations.len()
        );
        let start = std::time::Instant::now();

        let result = self.ingest_with(name, policy, |pass| {
            let output = SampleBuilder::new(&self.normalizer).build(observations);
            let excluded = output.excluded.clone();
            let graph = output.into_graph(pass)?;
            Ok((graph, None, excluded))
        });

        finish_ingest("ingest_observations", name, start, result)
    }

    /// Ingest an observation file (JSON array or JSON Lines).
    ///
    /// # Errors
    ///
    /// `Io` or `Parse` for the file, otherwise as [`GraphStore::ingest_observations`].
    pub fn ingest_observations_file(
        &self,
        name: &str,
        path: &Path,
        policy: MergePolicy,
    ) -> Result<IngestReport> {
        let observations = read_observations_file(path)?;
        self.ingest_observations(name, &observations, policy)
    }

    /// Replace the edge set of a stored graph.
    ///
    /// # Errors
    ///
    /// As [`GraphStore::load`] and [`GraphStore::save`].
    pub fn replace_edges(&self, name: &str, edges: Vec<ResourceEdge>) -> Result<String> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| lock_poisoned("replace_edges"))?;
        let mut graph = self.load(name)?.as_ref().clone();
        graph.set_edges(edges);
        self.write_graph(name, graph)
    }

    /// Drop cached snapshots so the next load rereads disk.
    pub fn invalidate(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    fn ingest_with<F>(&self, name: &str, policy: MergePolicy, build: F) -> Result<IngestReport>
    where
        F: FnOnce(u64) -> std::result::Result<(KnowledgeGraph, Option<SpecVersion>, Vec<EndpointKey>), ApiGraphError>,
    {
        validate_name(name)?;
        let _guard = self.write_lock.lock().map_err(|_| lock_poisoned("ingest"))?;

        let existing = if self.exists(name) {
            Some(self.load(name)?)
        } else {
            None
        };
        let pass = existing
            .as_ref()
            .and_then(|g| g.endpoints().map(|d| d.pass).max())
            .unwrap_or(0)
            + 1;

        // Nothing touches disk or cache until the incoming graph is fully built.
        let (incoming, format, excluded) = build(pass).map_err(ExError::from)?;

        let (graph, merge) = match (policy, existing) {
            (MergePolicy::Merge, Some(existing)) => {
                let mut graph = existing.as_ref().clone();
                let summary = graph.merge(incoming);
                (graph, summary)
            }
            (_, _) => {
                let summary = MergeSummary {
                    inserted: incoming.len(),
                    ..MergeSummary::default()
                };
                (incoming, summary)
            }
        };
        let endpoints = graph.len();
        let notes = graph.notes().len();
        let digest = self.write_graph(name, graph)?;

        Ok(IngestReport {
            graph: name.to_string(),
            pass,
            policy,
            format,
            endpoints,
            merge,
            excluded,
            notes,
            digest,
        })
    }

    fn write_graph(&self, name: &str, graph: KnowledgeGraph) -> Result<String> {
        let path = self.graph_path(name)?;
        let persisted = PersistedGraph::from(&graph);
        let text = persisted
            .to_json_pretty()
            .map_err(|e| serialization_error("save_graph", e))?;
        let digest = persisted
            .digest()
            .map_err(|e| serialization_error("save_graph", e))?;
        atomic_write(&path, text.as_bytes())?;

        self.cache
            .write()
            .map_err(|_| lock_poisoned("save_graph"))?
            .insert(
                name.to_string(),
                CachedGraph {
                    graph: Arc::new(graph),
                    stamp: FileStamp::of(&path),
                },
            );

        tracing::debug!(graph = name, digest = %digest, size_bytes = text.len(), "Persisted graph");
        Ok(digest)
    }

    /// The cached snapshot, if the file on disk is still the one it came from.
    fn cached(&self, name: &str) -> Result<Option<Arc<KnowledgeGraph>>> {
        let path = self.graph_path(name)?;
        let cache = self.cache.read().map_err(|_| lock_poisoned("load_graph"))?;
        Ok(cache
            .get(name)
            .filter(|entry| entry.stamp.is_some() && entry.stamp == FileStamp::of(&path))
            .map(|entry| entry.graph.clone()))
    }

    fn read_from_disk(&self, name: &str) -> Result<(KnowledgeGraph, Option<FileStamp>)> {
        let path = self.graph_path(name)?;
        if !path.is_file() {
            return Err(ApiGraphError::GraphNotFound {
                name: name.to_string(),
            }
            .into());
        }
        let stamp = FileStamp::of(&path);
        let text = std::fs::read_to_string(&path).map_err(|e| io_error("read_graph", &path, e))?;
        let persisted: PersistedGraph = serde_json::from_str(&text)
            .map_err(|e| storage_error(&path, format!("malformed graph document: {}", e)))?;
        let graph = persisted
            .into_graph()
            .map_err(|e| storage_error(&path, e.to_string()))?;
        Ok((graph, stamp))
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(invalid_graph_name(name))
    }
}

fn finish_ingest(
    op: &'static str,
    name: &str,
    start: std::time::Instant,
    result: Result<IngestReport>,
) -> Result<IngestReport> {
    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(report) => log_op_end!(
            op,
            duration_ms = elapsed,
            graph = name,
            pass = report.pass,
            endpoints = report.endpoints
        ),
        Err(e) => {
            let e_clone = e.clone();
            log_op_error!(op, e_clone, duration_ms = elapsed, graph = name);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SPEC: &str = r#"{
        "openapi": "3.0.3",
        "paths": {
            "/users": {"get": {"responses": {"200": {"description": "ok"}}}}
        }
    }"#;

    #[test]
    fn test_name_validation() {
        assert!(validate_name("petstore-v2.1").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("../escape").is_err());
        assert!(validate_name(".hidden").is_err());
        assert!(validate_name("a/b").is_err());
    }

    #[test]
    fn test_merge_policy_parse() {
        assert_eq!("MERGE".parse::<MergePolicy>().unwrap(), MergePolicy::Merge);
        assert!("upsert".parse::<MergePolicy>().is_err());
    }

    #[test]
    fn test_pass_counter_increments() {
        let dir = TempDir::new().unwrap();
        let store = GraphStore::open(dir.path()).unwrap();
        let first = store.ingest_spec_str("api", SPEC, MergePolicy::Replace).unwrap();
        let second = store.ingest_spec_str("api", SPEC, MergePolicy::Merge).unwrap();
        assert_eq!(first.pass, 1);
        assert_eq!(second.pass, 2);
        assert_eq!(second.merge.replaced, 1);
    }

    #[test]
    fn test_snapshot_survives_later_write() {
        let dir = TempDir::new().unwrap();
        let store = GraphStore::open(dir.path()).unwrap();
        store.ingest_spec_str("api", SPEC, MergePolicy::Replace).unwrap();
        let snapshot = store.load("api").unwrap();

        store.save("api", KnowledgeGraph::new()).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert!(store.load("api").unwrap().is_empty());
    }

    #[test]
    fn test_load_picks_up_write_from_another_store() {
        let dir = TempDir::new().unwrap();
        let reader = GraphStore::open(dir.path()).unwrap();
        let writer = GraphStore::open(dir.path()).unwrap();
        writer.ingest_spec_str("api", SPEC, MergePolicy::Replace).unwrap();
        assert_eq!(reader.load("api").unwrap().len(), 1);

        writer.save("api", KnowledgeGraph::new()).unwrap();

        assert!(reader.load("api").unwrap().is_empty());
    }

    #[test]
    fn test_cached_load_skips_disk_when_file_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = GraphStore::open(dir.path()).unwrap();
        store.ingest_spec_str("api", SPEC, MergePolicy::Replace).unwrap();
        let first = store.load("api").unwrap();
        let second = store.load("api").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
