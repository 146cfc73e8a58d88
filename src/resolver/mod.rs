//! Cross-file, cross-language symbol resolution.
//!
//! Runs once per index-run, after every chunk's parse-and-persist work has
//! completed (phase 2's first stage). Four passes, each building on the
//! last:
//!
//! 1. [`index`] — a project-wide `SymbolIndex` by FQN and short name.
//! 2. [`imports`] — resolves `imports`-kind pending references, producing
//!    each file's visible-scope set.
//! 3. [`reference`] — the seven-step match cascade over every remaining
//!    pending reference.
//! 4. [`bridges`] — cross-language short-name matching, invoked from
//!    within the reference cascade rather than as a separate sweep.
//!
//! A final lineage step turns staged [`ColumnReference`](crate::model::ColumnReference)
//! rows into `Transforms` edges and clears the staging table.

pub mod bridges;
pub mod imports;
pub mod index;
pub mod reference;

use crate::error::StoreResult;
use crate::model::{EdgeKind, SymbolEdge};
use crate::store::SqliteStore;
use crate::types::{ProjectId, RunId};
use index::SymbolIndex;
use reference::ResolveStats;

/// Everything the resolve stage produced for one run, for the caller to
/// fold into the run's summary counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOutcome {
    pub symbols_indexed: usize,
    pub reference_stats: ResolveStats,
    pub column_edges_created: usize,
}

/// Runs all four passes plus the column-lineage step for `run_id`, against
/// every pending reference and column reference staged for that run.
/// `schema_default` comes from the source's configured default schema, if
/// any. Tenant/source config wins over the `dbo`/`public` fallback order.
pub fn resolve_project(
    store: &SqliteStore,
    project_id: ProjectId,
    run_id: RunId,
    schema_default: Option<&str>,
) -> StoreResult<ResolveOutcome> {
    let index = SymbolIndex::build(store, project_id)?;
    let symbols_indexed = index.all_symbols().count();

    let scopes = imports::build_visible_scopes(store, &index, run_id, project_id)?;
    let reference_stats = reference::resolve_pending(store, &index, &scopes, project_id, run_id, schema_default)?;
    let column_edges_created = materialize_column_lineage(store, &index, project_id, run_id)?;

    Ok(ResolveOutcome { symbols_indexed, reference_stats, column_edges_created })
}

/// Consumes this run's staged `ColumnReference` rows, turning each into a
/// `Transforms` edge between the symbols the source and target column FQNs
/// resolve to, then deletes the staging rows.
fn materialize_column_lineage(
    store: &SqliteStore,
    index: &SymbolIndex,
    project_id: ProjectId,
    run_id: RunId,
) -> StoreResult<usize> {
    let column_refs = store.list_column_references_for_run(run_id)?;
    let mut created = 0;

    for column_ref in &column_refs {
        let mut sources = index.exact_fqn(&column_ref.source_column_fqn).to_vec();
        let mut targets = index.exact_fqn(&column_ref.target_column_fqn).to_vec();
        sources.sort();
        targets.sort();

        if let (Some(&source_id), Some(&target_id)) = (sources.first(), targets.first()) {
            let mut edge = SymbolEdge::new(project_id, source_id, target_id, EdgeKind::Transforms);
            edge.metadata = serde_json::json!({
                "derivation": column_ref.derivation.as_str(),
                "expression": column_ref.expression,
            });
            store.insert_edge(&edge)?;
            created += 1;
        }
    }

    store.clear_column_references_for_run(run_id)?;
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnDerivation, ColumnReference, SourceType, SymbolKind, Trigger};
    use crate::store::NewSymbol;

    #[test]
    fn lineage_step_consumes_and_clears_staged_column_refs() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = store.create_project("p", "P", "t", None, &serde_json::json!({})).unwrap();
        let source = store
            .create_source(project.id, SourceType::Filesystem, "/tmp", &serde_json::json!({}), None)
            .unwrap();
        let orders_file = store.upsert_file(project.id, source.id, "orders.sql", Some("sql"), 1, "h1").unwrap();
        let orders_ids = store
            .replace_file_symbols(
                project.id,
                orders_file.id,
                &[NewSymbol {
                    parent_index: None,
                    kind: SymbolKind::Column,
                    name: "Total".to_string(),
                    qualified_name: "Orders.Total".to_string(),
                    language: "sql".to_string(),
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
        let reports_file = store.upsert_file(project.id, source.id, "reports.sql", Some("sql"), 1, "h2").unwrap();
        let reports_ids = store
            .replace_file_symbols(
                project.id,
                reports_file.id,
                &[NewSymbol {
                    parent_index: None,
                    kind: SymbolKind::Column,
                    name: "OrderTotal".to_string(),
                    qualified_name: "Reports.OrderTotal".to_string(),
                    language: "sql".to_string(),
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

        let run = store.create_run(project.id, Some(source.id), Trigger::Manual).unwrap();
        store
            .insert_column_reference(&ColumnReference {
                project_id: project.id,
                run_id: run.id,
                source_column_fqn: "Orders.Total".to_string(),
                target_column_fqn: "Reports.OrderTotal".to_string(),
                derivation: ColumnDerivation::DirectCopy,
                expression: None,
                containing_symbol_fqn: None,
                line: Some(3),
            })
            .unwrap();

        let outcome = resolve_project(&store, project.id, run.id, None).unwrap();
        assert_eq!(outcome.column_edges_created, 1);

        let edges = store.list_edges_from(orders_ids[0]).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target_id, reports_ids[0]);
        assert_eq!(edges[0].kind, EdgeKind::Transforms);
        assert!(store.list_column_references_for_run(run.id).unwrap().is_empty());
    }
}
