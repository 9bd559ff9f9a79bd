use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Symbol in code (function, struct, method, etc.)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolNode {
    /// Stable identifier assigned by the graph producer
    pub id: String,

    /// Symbol name (e.g., "authenticate", "User.Save")
    #[serde(default)]
    pub name: String,

    #[serde(default, rename = "type")]
    pub kind: SymbolKind,

    /// File path, as reported by the producer (usually project-relative)
    pub path: String,

    #[serde(default)]
    pub line: usize,
}

impl SymbolNode {
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            kind: SymbolKind::default(),
            path: path.into(),
            line: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    #[default]
    Function,
    Method,
    Struct,
    Interface,
    Variable,
    Constant,
    Package,
    Import,
    Type,
    Field,
}

/// Type of reference between symbols
///
/// Every kind counts as a dependency when resolving affected files; the kind
/// is carried through for consumers that want to weigh relationships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// A calls B
    Calls,

    /// A imports B
    Imports,

    /// A extends B
    Extends,

    /// A implements B
    Implements,

    /// A uses type B
    Uses,

    #[default]
    References,

    DependsOn,
}

/// Directed reference from one symbol to another (caller -> callee)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolEdge {
    pub from: String,
    pub to: String,
    #[serde(default, rename = "type")]
    pub kind: EdgeKind,
}

impl SymbolEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::default(),
        }
    }

    pub fn with_kind(mut self, kind: EdgeKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Serialized form of a symbol graph, as produced by an external indexer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolGraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<SymbolNode>,
    #[serde(default)]
    pub edges: Vec<SymbolEdge>,
}

impl SymbolGraphSnapshot {
    pub fn new(nodes: Vec<SymbolNode>, edges: Vec<SymbolEdge>) -> Self {
        Self { nodes, edges }
    }

    pub fn from_json(raw: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Immutable symbol graph for a single analysis
#[derive(Debug, Clone)]
pub struct SymbolGraph {
    /// Directed graph (symbol -> symbol)
    pub graph: DiGraph<SymbolNode, EdgeKind>,

    /// Symbol id -> NodeIndex mapping
    id_index: HashMap<String, NodeIndex>,

    /// File path -> symbols declared in that file
    path_index: HashMap<String, Vec<NodeIndex>>,

    dangling_edges: usize,
}

impl SymbolGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_index: HashMap::new(),
            path_index: HashMap::new(),
            dangling_edges: 0,
        }
    }

    /// Build the graph and its lookup indices from a snapshot.
    ///
    /// Duplicate ids keep their first occurrence. Edges that point at unknown
    /// ids are dropped and counted in [`SymbolGraph::dangling_edges`].
    pub fn from_snapshot(snapshot: SymbolGraphSnapshot) -> Self {
        let mut graph = Self::new();
        for node in snapshot.nodes {
            graph.add_node(node);
        }
        for edge in snapshot.edges {
            graph.add_edge(&edge.from, &edge.to, edge.kind);
        }

        if graph.dangling_edges > 0 {
            log::debug!(
                "Symbol graph dropped {} edges with unknown endpoints",
                graph.dangling_edges
            );
        }

        graph
    }

    /// Add node to graph, returning the existing index on duplicate ids
    pub fn add_node(&mut self, node: SymbolNode) -> NodeIndex {
        if let Some(&existing) = self.id_index.get(&node.id) {
            log::debug!("Duplicate symbol id {} ignored", node.id);
            return existing;
        }

        let id = node.id.clone();
        let path = node.path.clone();
        let idx = self.graph.add_node(node);

        self.id_index.insert(id, idx);
        self.path_index.entry(path).or_default().push(idx);

        idx
    }

    /// Add edge between two symbols by id. Returns false if either end is unknown.
    pub fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind) -> bool {
        match (self.id_index.get(from), self.id_index.get(to)) {
            (Some(&a), Some(&b)) => {
                self.graph.add_edge(a, b, kind);
                true
            }
            _ => {
                self.dangling_edges += 1;
                false
            }
        }
    }

    pub fn find_node(&self, id: &str) -> Option<NodeIndex> {
        self.id_index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&SymbolNode> {
        self.find_node(id).and_then(|idx| self.graph.node_weight(idx))
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.path_index.contains_key(path)
    }

    /// All file paths that own at least one symbol, sorted
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.path_index.keys().map(String::as_str).collect();
        files.sort_unstable();
        files
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn dangling_edges(&self) -> usize {
        self.dangling_edges
    }

    pub(crate) fn indices_in_file(&self, path: &str) -> &[NodeIndex] {
        self.path_index.get(path).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for SymbolGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl From<SymbolGraphSnapshot> for SymbolGraph {
    fn from(snapshot: SymbolGraphSnapshot) -> Self {
        Self::from_snapshot(snapshot)
    }
}
