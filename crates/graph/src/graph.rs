use crate::types::{EdgeKind, SymbolGraph, SymbolNode};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::BTreeSet;

impl SymbolGraph {
    /// Files referenced by any symbol declared in `path`, excluding `path` itself.
    ///
    /// Sorted and deduplicated. A file with no symbols yields an empty set.
    pub fn files_referenced_by(&self, path: &str) -> BTreeSet<&str> {
        let mut files = BTreeSet::new();

        for &idx in self.indices_in_file(path) {
            for target in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if let Some(node) = self.graph.node_weight(target) {
                    if node.path != path {
                        files.insert(node.path.as_str());
                    }
                }
            }
        }

        files
    }

    /// Symbols that `symbol_id` references (outgoing edges), sorted by id
    pub fn dependencies_of(&self, symbol_id: &str) -> Vec<&SymbolNode> {
        self.neighbors_of(symbol_id, Direction::Outgoing)
    }

    /// Symbols that reference `symbol_id` (incoming edges), sorted by id
    pub fn dependents_of(&self, symbol_id: &str) -> Vec<&SymbolNode> {
        self.neighbors_of(symbol_id, Direction::Incoming)
    }

    /// Outgoing references of a given kind
    pub fn references_of_kind(&self, symbol_id: &str, kind: EdgeKind) -> Vec<&SymbolNode> {
        let Some(idx) = self.find_node(symbol_id) else {
            return Vec::new();
        };

        let mut nodes: Vec<&SymbolNode> = self
            .graph
            .edges(idx)
            .filter(|e| *e.weight() == kind)
            .filter_map(|e| self.graph.node_weight(e.target()))
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes.dedup_by(|a, b| a.id == b.id);
        nodes
    }

    fn neighbors_of(&self, symbol_id: &str, direction: Direction) -> Vec<&SymbolNode> {
        let Some(idx) = self.find_node(symbol_id) else {
            return Vec::new();
        };

        let unique: BTreeSet<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        let mut nodes: Vec<&SymbolNode> = unique
            .into_iter()
            .filter_map(|n| self.graph.node_weight(n))
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }
}
