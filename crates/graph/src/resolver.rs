use crate::error::{GraphError, Result};
use crate::types::SymbolGraph;
use std::collections::{HashSet, VecDeque};
use tokio_util::sync::CancellationToken;

/// Hop limit for indirect dependency discovery, counted from the changed file.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Result of a bounded indirect-dependency traversal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Traversal {
    /// Files found beyond the direct set, in discovery order
    pub discovered: Vec<String>,

    /// Files whose own dependencies were expanded, in expansion order
    pub visited: Vec<String>,
}

/// Resolves file-level dependencies through a symbol graph
#[derive(Debug, Clone, Copy)]
pub struct DependencyResolver {
    max_depth: usize,
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl DependencyResolver {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Files directly referenced by symbols declared in `file`, sorted.
    ///
    /// Files absent from the graph (and empty graphs) yield an empty list.
    pub fn find_direct_dependencies(&self, file: &str, graph: &SymbolGraph) -> Vec<String> {
        graph
            .files_referenced_by(file)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Second- and further-order dependencies reachable from `direct`.
    ///
    /// See [`DependencyResolver::traverse`] for the bound and cycle rules.
    pub fn find_indirect_dependencies(
        &self,
        direct: &[String],
        graph: &SymbolGraph,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        Ok(self.traverse(direct, graph, cancel)?.discovered)
    }

    /// Breadth-first walk starting from `direct` at depth 1.
    ///
    /// A file is expanded only while its depth is below `max_depth` and only
    /// once across the whole walk, so cycles terminate. Dependencies found at
    /// depth `d` are recorded at depth `d + 1`; with the default bound that
    /// covers the third hop from the changed file and nothing beyond it.
    /// Files already in `direct` are never reported as discovered.
    pub fn traverse(
        &self,
        direct: &[String],
        graph: &SymbolGraph,
        cancel: &CancellationToken,
    ) -> Result<Traversal> {
        let mut traversal = Traversal::default();
        if graph.is_empty() || direct.is_empty() {
            return Ok(traversal);
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut reported: HashSet<String> = direct.iter().cloned().collect();
        let mut queue: VecDeque<(String, usize)> =
            direct.iter().map(|file| (file.clone(), 1)).collect();

        while let Some((file, depth)) = queue.pop_front() {
            if cancel.is_cancelled() {
                log::debug!("Dependency traversal cancelled at {file} (depth {depth})");
                return Err(GraphError::Cancelled);
            }

            if depth >= self.max_depth || visited.contains(&file) {
                continue;
            }
            visited.insert(file.clone());
            traversal.visited.push(file.clone());

            for dep in graph.files_referenced_by(&file) {
                if visited.contains(dep) {
                    continue;
                }
                if reported.insert(dep.to_string()) {
                    traversal.discovered.push(dep.to_string());
                }
                queue.push_back((dep.to_string(), depth + 1));
            }
        }

        log::debug!(
            "Indirect traversal from {} files: {} discovered, {} expanded",
            direct.len(),
            traversal.discovered.len(),
            traversal.visited.len()
        );

        Ok(traversal)
    }
}
