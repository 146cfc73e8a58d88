use super::SqliteStore;
use crate::error::StoreResult;
use crate::model::{EdgeKind, PendingReference};
use crate::types::{ProjectId, RunId, SymbolId};
use rusqlite::{params, Row};

fn row_to_pending(row: &Row) -> rusqlite::Result<PendingReference> {
    let reference_type: String = row.get("reference_type")?;
    Ok(PendingReference {
        project_id: ProjectId::new(row.get("project_id")?),
        run_id: RunId::new(row.get("run_id")?),
        source_id: SymbolId::new(row.get("source_id")?),
        to_name: row.get("to_name")?,
        to_qualified: row.get("to_qualified")?,
        reference_type: EdgeKind::parse(&reference_type).unwrap_or(EdgeKind::References),
        confidence_hint: row.get("confidence_hint")?,
    })
}

impl SqliteStore {
    /// Staged by the persister when a reference's target doesn't resolve
    /// within the referencing file; consumed by the
    /// resolver's Pass 3 (§4.8) during the same run's phase 2.
    pub fn insert_pending_reference(&self, reference: &PendingReference) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO pending_references
                (project_id, run_id, source_id, to_name, to_qualified, reference_type, confidence_hint)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                reference.project_id.value(),
                reference.run_id.value(),
                reference.source_id.value(),
                reference.to_name,
                reference.to_qualified,
                reference.reference_type.as_str(),
                reference.confidence_hint,
            ],
        )?;
        Ok(())
    }

    pub fn list_pending_references_for_run(&self, run_id: RunId) -> StoreResult<Vec<PendingReference>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT project_id, run_id, source_id, to_name, to_qualified, reference_type, confidence_hint
             FROM pending_references WHERE run_id = ?1",
        )?;
        let rows = stmt.query_map(params![run_id.value()], row_to_pending)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn clear_pending_references_for_run(&self, run_id: RunId) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM pending_references WHERE run_id = ?1", params![run_id.value()])?;
        Ok(())
    }
}
