use crate::error::{GraphError, Result};
use crate::types::{SymbolGraph, SymbolGraphSnapshot};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Default snapshot location, relative to the project root
pub const DEFAULT_SNAPSHOT_PATH: &str = ".context/symbol_graph.json";

/// Source of symbol graphs for a project.
///
/// Each call returns a fresh, immutable graph; callers do not assume caching.
#[async_trait]
pub trait SymbolGraphProvider: Send + Sync {
    async fn build_graph(&self, project_root: &Path) -> Result<SymbolGraph>;
}

/// Loads a JSON [`SymbolGraphSnapshot`] written by an external indexer
#[derive(Debug, Clone, Default)]
pub struct SnapshotFileProvider {
    path: Option<PathBuf>,
}

impl SnapshotFileProvider {
    /// Read `<project_root>/.context/symbol_graph.json`
    pub fn new() -> Self {
        Self { path: None }
    }

    /// Read a fixed snapshot file regardless of project root.
    /// Relative paths are resolved against the project root.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn snapshot_path(&self, project_root: &Path) -> PathBuf {
        match &self.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => project_root.join(path),
            None => project_root.join(DEFAULT_SNAPSHOT_PATH),
        }
    }
}

#[async_trait]
impl SymbolGraphProvider for SnapshotFileProvider {
    async fn build_graph(&self, project_root: &Path) -> Result<SymbolGraph> {
        let path = self.snapshot_path(project_root);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(GraphError::SnapshotNotFound(path.display().to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        let snapshot = SymbolGraphSnapshot::from_json(&raw)?;
        let graph = SymbolGraph::from_snapshot(snapshot);

        log::info!(
            "Loaded symbol graph from {}: {} nodes, {} edges",
            path.display(),
            graph.node_count(),
            graph.edge_count()
        );

        Ok(graph)
    }
}

/// Serves a snapshot held in memory
#[derive(Debug, Clone)]
pub struct StaticGraphProvider {
    snapshot: std::result::Result<SymbolGraphSnapshot, String>,
}

impl StaticGraphProvider {
    pub fn new(snapshot: SymbolGraphSnapshot) -> Self {
        Self {
            snapshot: Ok(snapshot),
        }
    }

    /// A provider whose every build fails with `reason`
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            snapshot: Err(reason.into()),
        }
    }
}

#[async_trait]
impl SymbolGraphProvider for StaticGraphProvider {
    async fn build_graph(&self, _project_root: &Path) -> Result<SymbolGraph> {
        match &self.snapshot {
            Ok(snapshot) => Ok(SymbolGraph::from_snapshot(snapshot.clone())),
            Err(reason) => Err(GraphError::BuildError(reason.clone())),
        }
    }
}
