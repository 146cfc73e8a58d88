//! GraphBuild stage: pushes the relational store's
//! current project state into the traversal-shaped graph mirror. Bulk,
//! idempotent, and safe to re-run — `GraphStore::sync_*` upserts by id.

use crate::error::StoreResult;
use crate::graph_store::GraphStore;
use crate::store::SqliteStore;
use crate::types::ProjectId;

pub fn sync_project(store: &SqliteStore, graph_store: &dyn GraphStore, project_id: ProjectId) -> StoreResult<()> {
    let files = store.list_files_for_project(project_id)?;
    graph_store.sync_files(project_id, &files);

    let symbols = store.list_symbols_for_project(project_id)?;
    graph_store.sync_symbols(project_id, &symbols);

    let edges = store.list_edges_for_project(project_id)?;
    graph_store.sync_edges(project_id, &edges);

    Ok(())
}
