//! Graph store contract and an in-process implementation.
//!
//! The relational store stays authoritative; this is a traversal-shaped
//! mirror that GraphBuild keeps eventually consistent by bulk push.

use crate::model::{EdgeKind, File, Symbol, SymbolEdge, SymbolKind};
use crate::types::{ProjectId, SymbolId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalDirection {
    Upstream,
    Downstream,
    Both,
}

#[derive(Debug, Clone)]
pub struct LineagePath {
    pub symbol_ids: Vec<SymbolId>,
    pub edge_kinds: Vec<EdgeKind>,
}

/// Outbound contract GraphBuild pushes through; `InMemoryGraphStore` is the
/// reference transport (a real deployment fronts Neo4j or similar).
pub trait GraphStore: Send + Sync {
    fn sync_files(&self, project_id: ProjectId, files: &[File]);
    fn sync_symbols(&self, project_id: ProjectId, symbols: &[Symbol]);
    fn sync_edges(&self, project_id: ProjectId, edges: &[SymbolEdge]);
    fn sync_column_edges(&self, project_id: ProjectId, edges: &[SymbolEdge]);

    fn query_lineage(
        &self,
        symbol_id: SymbolId,
        direction: TraversalDirection,
        max_depth: usize,
        edge_types: &[EdgeKind],
    ) -> Vec<LineagePath>;

    fn query_impact(&self, symbol_id: SymbolId, max_depth: usize, edge_types: &[EdgeKind]) -> Vec<LineagePath>;
}

#[derive(Default)]
struct Graph {
    inner: DiGraph<SymbolId, EdgeKind>,
    node_by_symbol: HashMap<SymbolId, NodeIndex>,
    kind_by_symbol: HashMap<SymbolId, SymbolKind>,
}

impl Graph {
    fn node_for(&mut self, symbol_id: SymbolId) -> NodeIndex {
        *self.node_by_symbol.entry(symbol_id).or_insert_with(|| self.inner.add_node(symbol_id))
    }
}

/// Deterministic, idempotent in-process mirror keyed by symbol id — every
/// `sync_*` call is an upsert. Re-syncing the
/// same project state twice leaves the graph unchanged.
pub struct InMemoryGraphStore {
    graph: RwLock<Graph>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self { graph: RwLock::new(Graph::default()) }
    }

    fn traverse(&self, start: SymbolId, direction: Direction, max_depth: usize, edge_types: &[EdgeKind]) -> Vec<LineagePath> {
        let graph = self.graph.read().unwrap();
        let Some(&start_node) = graph.node_by_symbol.get(&start) else {
            return Vec::new();
        };

        let mut paths = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back((start_node, vec![start], Vec::<EdgeKind>::new()));
        let mut visited_at_depth: HashSet<NodeIndex> = HashSet::new();
        visited_at_depth.insert(start_node);

        while let Some((node, symbol_path, edge_path)) = queue.pop_front() {
            if edge_path.len() >= max_depth {
                continue;
            }
            for edge_ref in graph.inner.edges_directed(node, direction) {
                let kind = *edge_ref.weight();
                if !edge_types.is_empty() && !edge_types.contains(&kind) {
                    continue;
                }
                let next = if direction == Direction::Outgoing { edge_ref.target() } else { edge_ref.source() };
                let next_symbol = graph.inner[next];
                let mut next_path = symbol_path.clone();
                next_path.push(next_symbol);
                let mut next_edges = edge_path.clone();
                next_edges.push(kind);
                paths.push(LineagePath { symbol_ids: next_path.clone(), edge_kinds: next_edges.clone() });
                if visited_at_depth.insert(next) {
                    queue.push_back((next, next_path, next_edges));
                }
            }
        }
        paths
    }
}

impl Default for InMemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore for InMemoryGraphStore {
    fn sync_files(&self, _project_id: ProjectId, _files: &[File]) {
        // Files have no edges of their own; nothing to mirror into the graph.
    }

    fn sync_symbols(&self, _project_id: ProjectId, symbols: &[Symbol]) {
        let mut graph = self.graph.write().unwrap();
        for symbol in symbols {
            let node = graph.node_for(symbol.id);
            graph.inner[node] = symbol.id;
            graph.kind_by_symbol.insert(symbol.id, symbol.kind);
        }
    }

    fn sync_edges(&self, _project_id: ProjectId, edges: &[SymbolEdge]) {
        let mut graph = self.graph.write().unwrap();
        for edge in edges {
            let source = graph.node_for(edge.source_id);
            let target = graph.node_for(edge.target_id);
            if !graph.inner.edges_connecting(source, target).any(|e| *e.weight() == edge.kind) {
                graph.inner.add_edge(source, target, edge.kind);
            }
        }
    }

    fn sync_column_edges(&self, project_id: ProjectId, edges: &[SymbolEdge]) {
        self.sync_edges(project_id, edges);
    }

    fn query_lineage(
        &self,
        symbol_id: SymbolId,
        direction: TraversalDirection,
        max_depth: usize,
        edge_types: &[EdgeKind],
    ) -> Vec<LineagePath> {
        match direction {
            TraversalDirection::Upstream => self.traverse(symbol_id, Direction::Incoming, max_depth, edge_types),
            TraversalDirection::Downstream => self.traverse(symbol_id, Direction::Outgoing, max_depth, edge_types),
            TraversalDirection::Both => {
                let mut up = self.traverse(symbol_id, Direction::Incoming, max_depth, edge_types);
                up.extend(self.traverse(symbol_id, Direction::Outgoing, max_depth, edge_types));
                up
            }
        }
    }

    fn query_impact(&self, symbol_id: SymbolId, max_depth: usize, edge_types: &[EdgeKind]) -> Vec<LineagePath> {
        self.traverse(symbol_id, Direction::Incoming, max_depth, edge_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileId, ProjectId};

    fn sym(id: i64, kind: SymbolKind) -> Symbol {
        Symbol {
            id: SymbolId::new(id),
            project_id: ProjectId::new(1),
            file_id: FileId::new(1),
            parent_id: None,
            kind,
            name: format!("s{id}"),
            qualified_name: format!("s{id}"),
            language: "sql".to_string(),
            start_line: 1,
            end_line: 1,
            start_col: None,
            end_col: None,
            signature: None,
            doc_comment: None,
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn sync_edges_is_idempotent() {
        let store = InMemoryGraphStore::new();
        let project_id = ProjectId::new(1);
        store.sync_symbols(project_id, &[sym(1, SymbolKind::Procedure), sym(2, SymbolKind::Table)]);
        let edge = SymbolEdge::new(project_id, SymbolId::new(1), SymbolId::new(2), EdgeKind::UsesTable);
        store.sync_edges(project_id, &[edge.clone()]);
        store.sync_edges(project_id, &[edge]);

        let downstream = store.query_lineage(SymbolId::new(1), TraversalDirection::Downstream, 3, &[]);
        assert_eq!(downstream.len(), 1);
    }

    #[test]
    fn query_impact_finds_upstream_dependents() {
        let store = InMemoryGraphStore::new();
        let project_id = ProjectId::new(1);
        store.sync_symbols(project_id, &[sym(1, SymbolKind::Procedure), sym(2, SymbolKind::Table)]);
        store.sync_edges(
            project_id,
            &[SymbolEdge::new(project_id, SymbolId::new(1), SymbolId::new(2), EdgeKind::UsesTable)],
        );

        let impact = store.query_impact(SymbolId::new(2), 3, &[]);
        assert_eq!(impact.len(), 1);
        assert_eq!(impact[0].symbol_ids, vec![SymbolId::new(2), SymbolId::new(1)]);
    }
}
