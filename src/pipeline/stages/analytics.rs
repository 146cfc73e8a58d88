//! Analytics stage: per-symbol degree and PageRank-style centrality,
//! architectural layer classification, cross-language bridge summaries,
//! and project-wide rollups — all persisted as `ProjectAnalytics` rows
//! keyed by (project, scope, scope_id), per spec.md §4.9.

use crate::classify::architectural_layer;
use crate::error::StoreResult;
use crate::model::AnalyticsScope;
use crate::store::SqliteStore;
use crate::types::{ProjectId, SymbolId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

const PAGERANK_DAMPING: f64 = 0.85;
const PAGERANK_ITERATIONS: usize = 20;

pub fn compute_project_analytics(store: &SqliteStore, project_id: ProjectId) -> StoreResult<()> {
    let symbols = store.list_symbols_for_project(project_id)?;
    let edges = store.list_edges_for_project(project_id)?;
    let files = store.list_files_for_project(project_id)?;
    let path_by_file: HashMap<_, _> = files.iter().map(|f| (f.id, f.path.as_str())).collect();
    let language_by_symbol: HashMap<SymbolId, &str> = symbols.iter().map(|s| (s.id, s.language.as_str())).collect();

    let mut symbols_by_kind: HashMap<&str, u64> = HashMap::new();
    let mut symbols_by_language: HashMap<&str, u64> = HashMap::new();
    for symbol in &symbols {
        *symbols_by_kind.entry(symbol.kind.as_str()).or_default() += 1;
        *symbols_by_language.entry(symbol.language.as_str()).or_default() += 1;
    }

    let mut edges_by_kind: HashMap<&str, u64> = HashMap::new();
    for edge in &edges {
        *edges_by_kind.entry(edge.kind.as_str()).or_default() += 1;
    }

    let placeholder_count = symbols.iter().filter(|s| s.is_placeholder()).count();
    let languages: std::collections::HashSet<&str> = symbols.iter().map(|s| s.language.as_str()).collect();

    // Degree + centrality: one graph node per symbol, one edge per
    // SymbolEdge, regardless of kind — centrality measures overall
    // connectedness, not a single edge type's subgraph.
    let mut graph: DiGraph<SymbolId, ()> = DiGraph::new();
    let mut node_by_symbol: HashMap<SymbolId, NodeIndex> = HashMap::with_capacity(symbols.len());
    for symbol in &symbols {
        let node = graph.add_node(symbol.id);
        node_by_symbol.insert(symbol.id, node);
    }
    for edge in &edges {
        if let (Some(&src), Some(&dst)) = (node_by_symbol.get(&edge.source_id), node_by_symbol.get(&edge.target_id)) {
            graph.add_edge(src, dst, ());
        }
    }

    let centrality = pagerank(&graph);

    for symbol in &symbols {
        let node = node_by_symbol[&symbol.id];
        let in_degree = graph.edges_directed(node, Direction::Incoming).count();
        let out_degree = graph.edges_directed(node, Direction::Outgoing).count();
        let layer = architectural_layer(symbol.kind, &symbol.language, path_by_file.get(&symbol.file_id).copied().unwrap_or(""));
        let pagerank_score = centrality[node.index()];

        store.merge_symbol_metadata(symbol.id, &serde_json::json!({"pagerank": pagerank_score, "layer": layer}))?;
        store.upsert_analytics(
            project_id,
            AnalyticsScope::Symbol,
            &symbol.id.value().to_string(),
            &serde_json::json!({
                "in_degree": in_degree,
                "out_degree": out_degree,
                "centrality": pagerank_score,
                "layer": layer,
            }),
        )?;
    }

    store.upsert_analytics(
        project_id,
        AnalyticsScope::BridgeSummary,
        "cross_language",
        &cross_language_bridge_summary(&edges, &language_by_symbol),
    )?;

    let payload = serde_json::json!({
        "symbol_count": symbols.len(),
        "edge_count": edges.len(),
        "placeholder_symbol_count": placeholder_count,
        "symbols_by_kind": symbols_by_kind,
        "symbols_by_language": symbols_by_language,
        "edges_by_kind": edges_by_kind,
        "languages": languages,
    });

    store.upsert_analytics(project_id, AnalyticsScope::Project, "overview", &payload)
}

/// Plain power-iteration PageRank over the symbol graph (no petgraph
/// built-in for this; petgraph only supplies traversal/search algorithms).
/// Dangling nodes (no outgoing edges) distribute nothing, matching the
/// usual "random surfer restarts" treatment well enough for a relative
/// centrality ranking rather than a strict stochastic-matrix PageRank.
fn pagerank(graph: &DiGraph<SymbolId, ()>) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }
    let base = (1.0 - PAGERANK_DAMPING) / n as f64;
    let mut ranks = vec![1.0 / n as f64; n];

    for _ in 0..PAGERANK_ITERATIONS {
        let mut next = vec![base; n];
        for node in graph.node_indices() {
            let out_degree = graph.edges_directed(node, Direction::Outgoing).count();
            if out_degree == 0 {
                continue;
            }
            let share = PAGERANK_DAMPING * ranks[node.index()] / out_degree as f64;
            for target in graph.neighbors_directed(node, Direction::Outgoing) {
                next[target.index()] += share;
            }
        }
        ranks = next;
    }
    ranks
}

/// Per-(source language, target language, edge kind) counts for every edge
/// that crosses a language boundary — the resolver's bridges (§4.8a)
/// surfaced as a project-wide rollup rather than left implicit in the edge
/// table.
fn cross_language_bridge_summary(
    edges: &[crate::model::SymbolEdge],
    language_by_symbol: &HashMap<SymbolId, &str>,
) -> serde_json::Value {
    let mut counts: HashMap<(String, String, &str), u64> = HashMap::new();
    for edge in edges {
        let (Some(&src_lang), Some(&dst_lang)) =
            (language_by_symbol.get(&edge.source_id), language_by_symbol.get(&edge.target_id))
        else {
            continue;
        };
        if src_lang == dst_lang {
            continue;
        }
        *counts.entry((src_lang.to_string(), dst_lang.to_string(), edge.kind.as_str())).or_default() += 1;
    }

    let bridges: Vec<serde_json::Value> = counts
        .into_iter()
        .map(|((from_lang, to_lang, kind), count)| {
            serde_json::json!({"from_language": from_lang, "to_language": to_lang, "edge_kind": kind, "count": count})
        })
        .collect();

    serde_json::json!({ "bridges": bridges, "total": bridges.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeKind, SourceType, SymbolKind};
    use crate::store::NewSymbol;

    fn seed_symbol(store: &SqliteStore, project_id: ProjectId, file_id: crate::types::FileId, name: &str, kind: SymbolKind, language: &str) -> SymbolId {
        let ids = store
            .replace_file_symbols(
                project_id,
                file_id,
                &[NewSymbol {
                    parent_index: None,
                    kind,
                    name: name.to_string(),
                    qualified_name: name.to_string(),
                    language: language.to_string(),
                    start_line: 1,
                    end_line: 1,
                    start_col: None,
                    end_col: None,
                    signature: None,
                    doc_comment: None,
                    metadata: serde_json::json!({}),
                }],
            )
            .unwrap();
        ids[0]
    }

    #[test]
    fn writes_per_symbol_degree_centrality_and_layer() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = store.create_project("p", "P", "t", None, &serde_json::json!({})).unwrap();
        let source = store.create_source(project.id, SourceType::Filesystem, "/tmp", &serde_json::json!({}), None).unwrap();
        let proc_file = store.upsert_file(project.id, source.id, "get_user.sql", Some("sql"), 1, "h1").unwrap();
        let table_file = store.upsert_file(project.id, source.id, "create_users.sql", Some("sql"), 1, "h2").unwrap();

        let proc_id = seed_symbol(&store, project.id, proc_file.id, "GetUser", SymbolKind::Procedure, "sql");
        let table_id = seed_symbol(&store, project.id, table_file.id, "Users", SymbolKind::Table, "sql");

        let mut edge = crate::model::SymbolEdge::new(project.id, proc_id, table_id, EdgeKind::UsesTable);
        edge.metadata = serde_json::json!({"confidence": 1.0});
        store.insert_edge(&edge).unwrap();

        compute_project_analytics(&store, project.id).unwrap();

        let proc_symbol = store.get_symbol(proc_id).unwrap();
        assert_eq!(proc_symbol.metadata["layer"], "data");
        assert!(proc_symbol.metadata["pagerank"].as_f64().unwrap() > 0.0);

        let symbol_rows = store.list_analytics(project.id, AnalyticsScope::Symbol).unwrap();
        let proc_row = symbol_rows.iter().find(|r| r.scope_id == proc_id.value().to_string()).unwrap();
        assert_eq!(proc_row.payload["out_degree"], 1);
        assert_eq!(proc_row.payload["in_degree"], 0);

        let table_row = symbol_rows.iter().find(|r| r.scope_id == table_id.value().to_string()).unwrap();
        assert_eq!(table_row.payload["in_degree"], 1);
        // The table has an incoming edge and no outgoing ones, so it should
        // rank at least as central as the isolated damping floor.
        assert!(table_row.payload["centrality"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn cross_language_bridge_summary_counts_only_cross_language_edges() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = store.create_project("p", "P", "t", None, &serde_json::json!({})).unwrap();
        let source = store.create_source(project.id, SourceType::Filesystem, "/tmp", &serde_json::json!({}), None).unwrap();
        let cs_file = store.upsert_file(project.id, source.id, "Repo.cs", Some("csharp"), 1, "h1").unwrap();
        let sql_file = store.upsert_file(project.id, source.id, "create_users.sql", Some("sql"), 1, "h2").unwrap();

        let class_id = seed_symbol(&store, project.id, cs_file.id, "Repo", SymbolKind::Class, "csharp");
        let table_id = seed_symbol(&store, project.id, sql_file.id, "Users", SymbolKind::Table, "sql");
        let other_class_id = seed_symbol(&store, project.id, cs_file.id, "Base", SymbolKind::Class, "csharp");

        store.insert_edge(&crate::model::SymbolEdge::new(project.id, class_id, table_id, EdgeKind::UsesTable)).unwrap();
        store.insert_edge(&crate::model::SymbolEdge::new(project.id, class_id, other_class_id, EdgeKind::Inherits)).unwrap();

        compute_project_analytics(&store, project.id).unwrap();

        let bridge_rows = store.list_analytics(project.id, AnalyticsScope::BridgeSummary).unwrap();
        let summary = &bridge_rows.iter().find(|r| r.scope_id == "cross_language").unwrap().payload;
        assert_eq!(summary["total"], 1);
        assert_eq!(summary["bridges"][0]["from_language"], "csharp");
        assert_eq!(summary["bridges"][0]["to_language"], "sql");
        assert_eq!(summary["bridges"][0]["edge_kind"], "uses_table");
        assert_eq!(summary["bridges"][0]["count"], 1);
    }
}
