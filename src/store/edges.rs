use super::SqliteStore;
use crate::error::StoreResult;
use crate::model::{EdgeKind, SymbolEdge};
use crate::types::{ProjectId, SymbolId};
use rusqlite::{params, Row};

fn row_to_edge(row: &Row) -> rusqlite::Result<SymbolEdge> {
    let kind: String = row.get("kind")?;
    let metadata_json: String = row.get("metadata")?;
    Ok(SymbolEdge {
        project_id: ProjectId::new(row.get("project_id")?),
        source_id: SymbolId::new(row.get("source_id")?),
        target_id: SymbolId::new(row.get("target_id")?),
        kind: EdgeKind::parse(&kind).unwrap_or(EdgeKind::DependsOn),
        metadata: serde_json::from_str(&metadata_json).unwrap_or(serde_json::json!({})),
    })
}

impl SqliteStore {
    /// Inserts an edge; a duplicate on (source, target, kind) is silently
    /// dropped per the (source, target, kind) uniqueness key.
    pub fn insert_edge(&self, edge: &SymbolEdge) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO symbol_edges (project_id, source_id, target_id, kind, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(source_id, target_id, kind) DO NOTHING",
            params![
                edge.project_id.value(),
                edge.source_id.value(),
                edge.target_id.value(),
                edge.kind.as_str(),
                edge.metadata.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn list_edges_from(&self, source_id: SymbolId) -> StoreResult<Vec<SymbolEdge>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT project_id, source_id, target_id, kind, metadata FROM symbol_edges WHERE source_id = ?1",
        )?;
        let rows = stmt.query_map(params![source_id.value()], row_to_edge)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn list_edges_to(&self, target_id: SymbolId) -> StoreResult<Vec<SymbolEdge>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT project_id, source_id, target_id, kind, metadata FROM symbol_edges WHERE target_id = ?1",
        )?;
        let rows = stmt.query_map(params![target_id.value()], row_to_edge)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn list_edges_for_project(&self, project_id: ProjectId) -> StoreResult<Vec<SymbolEdge>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT project_id, source_id, target_id, kind, metadata FROM symbol_edges WHERE project_id = ?1",
        )?;
        let rows = stmt.query_map(params![project_id.value()], row_to_edge)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
