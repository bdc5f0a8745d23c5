//! In-memory graph backend.
//!
//! Applies the same MERGE semantics as the Cypher statement to plain maps.
//! Used for dry runs (`--backend memory`) and in tests, where write failures
//! can be injected by call number.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use appkg_core::app::{AppRecord, Dimension};

use crate::backend::{Dialect, GraphBackend, WriteMode};
use crate::client::GraphCounts;
use crate::error::StoreError;
use crate::schema::SchemaDeclaration;

#[derive(Default)]
struct MemoryGraph {
    apps: BTreeMap<String, AppRecord>,
    /// Dimension nodes keyed by (dimension, value); the map holds extra
    /// properties (only Developer has any).
    dimensions: BTreeMap<(Dimension, String), BTreeMap<&'static str, String>>,
    edges: BTreeSet<(String, Dimension, String)>,

    declared: Vec<String>,
    declared_names: HashSet<String>,
    labels: HashSet<&'static str>,
    rejected_declarations: HashMap<String, StoreError>,

    write_calls: usize,
    batch_sizes: Vec<usize>,
    failing_calls: HashMap<usize, StoreError>,
    fail_all: Option<StoreError>,
}

impl MemoryGraph {
    fn merge(&mut self, app: &AppRecord) {
        self.apps.insert(app.app_id.clone(), app.clone());

        for dim in Dimension::ALL {
            let value = app.dimension(dim).to_string();
            let props = self.dimensions.entry((dim, value.clone())).or_default();
            if dim == Dimension::Developer {
                props.insert("id", app.developer_id.clone());
                props.insert("url", app.developer_url.clone());
            }
            self.edges.insert((app.app_id.clone(), dim, value));
        }
    }

    fn next_write(&mut self, rows: usize) -> Result<(), StoreError> {
        self.write_calls += 1;
        if let Some(e) = &self.fail_all {
            return Err(e.clone());
        }
        if let Some(e) = self.failing_calls.get(&self.write_calls) {
            return Err(e.clone());
        }
        self.batch_sizes.push(rows);
        Ok(())
    }
}

/// Graph store held in process memory.
pub struct MemoryBackend {
    dialect: Dialect,
    write_mode: WriteMode,
    graph: Mutex<MemoryGraph>,
}

impl MemoryBackend {
    /// Backend with the given write mode; bulk mode declares constraints,
    /// per-row mode declares vertex and edge labels.
    pub fn new(write_mode: WriteMode) -> Self {
        let dialect = match write_mode {
            WriteMode::Bulk => Dialect::Neo4j,
            WriteMode::PerRow => Dialect::TuGraph,
        };
        Self::with_dialect(dialect)
    }

    /// Backend that mimics the given store's schema and write mode.
    pub fn with_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            write_mode: dialect.write_mode(),
            graph: Mutex::new(MemoryGraph::default()),
        }
    }

    fn graph(&self) -> MutexGuard<'_, MemoryGraph> {
        self.graph.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make the named declaration fail with `error`.
    pub fn reject_declaration(&self, name: &str, error: StoreError) {
        self.graph().rejected_declarations.insert(name.to_string(), error);
    }

    /// Make the given write calls (1-based, counting batch and row calls) fail.
    pub fn fail_writes(&self, calls: impl IntoIterator<Item = usize>, error: StoreError) {
        let mut graph = self.graph();
        for call in calls {
            graph.failing_calls.insert(call, error.clone());
        }
    }

    /// Make every write fail.
    pub fn fail_all_writes(&self, error: StoreError) {
        self.graph().fail_all = Some(error);
    }

    /// Names of successfully declared schema objects, in declaration order.
    pub fn declared(&self) -> Vec<String> {
        self.graph().declared.clone()
    }

    /// Number of write calls attempted, failed ones included.
    pub fn write_calls(&self) -> usize {
        self.graph().write_calls
    }

    /// Row count of each accepted write call.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.graph().batch_sizes.clone()
    }

    pub fn app(&self, id: &str) -> Option<AppRecord> {
        self.graph().apps.get(id).cloned()
    }

    /// Properties of a dimension node, if it exists.
    pub fn dimension_node(&self, dim: Dimension, value: &str) -> Option<BTreeMap<&'static str, String>> {
        self.graph().dimensions.get(&(dim, value.to_string())).cloned()
    }

    pub fn app_count(&self) -> usize {
        self.graph().apps.len()
    }

    /// Distinct nodes for one dimension.
    pub fn dimension_count(&self, dim: Dimension) -> usize {
        self.graph().dimensions.keys().filter(|(d, _)| *d == dim).count()
    }

    pub fn node_count(&self) -> usize {
        let graph = self.graph();
        graph.apps.len() + graph.dimensions.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph().edges.len()
    }
}

#[async_trait]
impl GraphBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    fn schema_declarations(&self) -> Vec<SchemaDeclaration> {
        self.dialect.schema_declarations()
    }

    async fn declare(&self, declaration: &SchemaDeclaration) -> Result<(), StoreError> {
        let name = declaration.name();
        let mut graph = self.graph();

        if let Some(e) = graph.rejected_declarations.get(&name) {
            return Err(e.clone());
        }
        if graph.declared_names.contains(&name) {
            return Err(StoreError::AlreadyExists(format!("{} already exists", name)));
        }
        if let Some(missing) = declaration.requires().into_iter().find(|label| !graph.labels.contains(label)) {
            return Err(StoreError::MissingLabel(missing.to_string()));
        }

        if let Some(label) = declaration.provides() {
            graph.labels.insert(label);
        }
        graph.declared_names.insert(name.clone());
        graph.declared.push(name);
        Ok(())
    }

    async fn upsert_batch(&self, rows: &[AppRecord]) -> Result<(), StoreError> {
        let mut graph = self.graph();
        graph.next_write(rows.len())?;
        for row in rows {
            graph.merge(row);
        }
        Ok(())
    }

    async fn upsert_row(&self, row: &AppRecord) -> Result<(), StoreError> {
        let mut graph = self.graph();
        graph.next_write(1)?;
        graph.merge(row);
        Ok(())
    }

    async fn counts(&self) -> Result<GraphCounts, StoreError> {
        Ok(GraphCounts {
            nodes: self.node_count(),
            relationships: self.edge_count(),
        })
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("dialect", &self.dialect)
            .field("apps", &self.app_count())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn app(id: &str, genre: &str) -> AppRecord {
        AppRecord {
            app_id: id.to_string(),
            name: format!("App {}", id),
            rating: 4.5,
            reviews: 10,
            version: "1.0".into(),
            url: String::new(),
            price: 0.0,
            free: true,
            developer: "Acme".into(),
            developer_id: "42".into(),
            developer_url: "https://acme.example".into(),
            genre: genre.to_string(),
            content_rating: "4+".into(),
            price_tier: "Free".into(),
            size_bucket: "Small (<100MB)".into(),
            ios_version: "12.0".into(),
            release_year: "2020".into(),
        }
    }

    #[tokio::test]
    async fn test_merge_deduplicates_nodes_and_edges() {
        let backend = MemoryBackend::new(WriteMode::Bulk);
        let rows = vec![app("1", "Games"), app("2", "Games")];

        backend.upsert_batch(&rows).await.unwrap();
        backend.upsert_batch(&rows).await.unwrap();

        assert_eq!(backend.app_count(), 2);
        assert_eq!(backend.dimension_count(Dimension::Genre), 1);
        // 2 apps + one node per dimension
        assert_eq!(backend.node_count(), 2 + Dimension::ALL.len());
        assert_eq!(backend.edge_count(), 2 * Dimension::ALL.len());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_attributes() {
        let backend = MemoryBackend::new(WriteMode::PerRow);
        backend.upsert_row(&app("1", "Games")).await.unwrap();

        let mut updated = app("1", "Games");
        updated.rating = 3.0;
        updated.developer_url = "https://new.example".into();
        backend.upsert_row(&updated).await.unwrap();

        assert_eq!(backend.app_count(), 1);
        assert_eq!(backend.app("1").unwrap().rating, 3.0);
        let dev = backend.dimension_node(Dimension::Developer, "Acme").unwrap();
        assert_eq!(dev["url"], "https://new.example");
    }

    #[tokio::test]
    async fn test_failed_batch_applies_nothing() {
        let backend = MemoryBackend::new(WriteMode::Bulk);
        backend.fail_writes([1], StoreError::Rejected("boom".into()));

        assert!(backend.upsert_batch(&[app("1", "Games")]).await.is_err());
        assert_eq!(backend.app_count(), 0);
        assert_eq!(backend.write_calls(), 1);
        assert!(backend.batch_sizes().is_empty());

        backend.upsert_batch(&[app("1", "Games")]).await.unwrap();
        assert_eq!(backend.app_count(), 1);
    }

    #[tokio::test]
    async fn test_repeated_declaration_reports_existing() {
        let backend = MemoryBackend::with_dialect(Dialect::Neo4j);
        let decl = SchemaDeclaration::Constraint { label: "App", key: "id" };

        backend.declare(&decl).await.unwrap();
        assert!(matches!(backend.declare(&decl).await, Err(StoreError::AlreadyExists(_))));
        assert_eq!(backend.declared(), vec!["app_id".to_string()]);
    }

    #[tokio::test]
    async fn test_edge_needs_declared_endpoints() {
        let backend = MemoryBackend::with_dialect(Dialect::TuGraph);
        let edge = SchemaDeclaration::EdgeLabel {
            relationship: "BELONGS_TO",
            from: "App",
            to: "Genre",
        };
        assert!(matches!(backend.declare(&edge).await, Err(StoreError::MissingLabel(_))));
    }
}
