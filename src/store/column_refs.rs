use super::SqliteStore;
use crate::error::StoreResult;
use crate::model::{ColumnDerivation, ColumnReference};
use crate::types::{ProjectId, RunId};
use rusqlite::{params, Row};

fn row_to_column_ref(row: &Row) -> rusqlite::Result<ColumnReference> {
    let derivation: String = row.get("derivation")?;
    Ok(ColumnReference {
        project_id: ProjectId::new(row.get("project_id")?),
        run_id: RunId::new(row.get("run_id")?),
        source_column_fqn: row.get("source_column_fqn")?,
        target_column_fqn: row.get("target_column_fqn")?,
        derivation: ColumnDerivation::parse(&derivation).unwrap_or(ColumnDerivation::DirectCopy),
        expression: row.get("expression")?,
        containing_symbol_fqn: row.get("containing_symbol_fqn")?,
        line: row.get::<_, Option<i64>>("line")?.map(|v| v as u32),
    })
}

impl SqliteStore {
    /// Staging rows written by parse workers, consumed and deleted by the
    /// lineage stage within the same index-run.
    pub fn insert_column_reference(&self, reference: &ColumnReference) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO column_references
                (project_id, run_id, source_column_fqn, target_column_fqn, derivation,
                 expression, containing_symbol_fqn, line)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                reference.project_id.value(),
                reference.run_id.value(),
                reference.source_column_fqn,
                reference.target_column_fqn,
                reference.derivation.as_str(),
                reference.expression,
                reference.containing_symbol_fqn,
                reference.line,
            ],
        )?;
        Ok(())
    }

    pub fn list_column_references_for_run(&self, run_id: RunId) -> StoreResult<Vec<ColumnReference>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT project_id, run_id, source_column_fqn, target_column_fqn, derivation,
                    expression, containing_symbol_fqn, line
             FROM column_references WHERE run_id = ?1",
        )?;
        let rows = stmt.query_map(params![run_id.value()], row_to_column_ref)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Drops a run's staging rows once the lineage stage has consumed them.
    pub fn clear_column_references_for_run(&self, run_id: RunId) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM column_references WHERE run_id = ?1", params![run_id.value()])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceType;

    #[test]
    fn staging_rows_are_scoped_to_a_run_and_clearable() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = store.create_project("p", "P", "t", None, &serde_json::json!({})).unwrap();
        let source = store
            .create_source(project.id, SourceType::Git, "git@example.com:repo.git", &serde_json::json!({}), None)
            .unwrap();
        let run = store.create_run(project.id, Some(source.id), crate::model::Trigger::Manual).unwrap();

        store
            .insert_column_reference(&ColumnReference {
                project_id: project.id,
                run_id: run.id,
                source_column_fqn: "orders.total".to_string(),
                target_column_fqn: "report.order_total".to_string(),
                derivation: ColumnDerivation::DirectCopy,
                expression: None,
                containing_symbol_fqn: Some("BuildReport".to_string()),
                line: Some(42),
            })
            .unwrap();

        assert_eq!(store.list_column_references_for_run(run.id).unwrap().len(), 1);
        store.clear_column_references_for_run(run.id).unwrap();
        assert!(store.list_column_references_for_run(run.id).unwrap().is_empty());
    }
}
