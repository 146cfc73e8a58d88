use super::SqliteStore;
use crate::error::{StoreError, StoreResult};
use crate::model::{Source, SourceType};
use crate::types::{ProjectId, SourceId};
use rusqlite::{params, Row};

fn row_to_source(row: &Row) -> rusqlite::Result<Source> {
    let source_type: String = row.get("source_type")?;
    let config_json: String = row.get("config")?;
    Ok(Source {
        id: SourceId::new(row.get("id")?),
        project_id: ProjectId::new(row.get("project_id")?),
        source_type: SourceType::parse(&source_type).unwrap_or(SourceType::Filesystem),
        connection_uri: row.get("connection_uri")?,
        config: serde_json::from_str(&config_json).unwrap_or(serde_json::json!({})),
        last_indexed_commit: row.get("last_indexed_commit")?,
        credential_ref: row.get("credential_ref")?,
    })
}

impl SqliteStore {
    pub fn create_source(
        &self,
        project_id: ProjectId,
        source_type: SourceType,
        connection_uri: &str,
        config: &serde_json::Value,
        credential_ref: Option<&str>,
    ) -> StoreResult<Source> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sources (project_id, source_type, connection_uri, config, credential_ref)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project_id.value(),
                source_type.as_str(),
                connection_uri,
                config.to_string(),
                credential_ref
            ],
        )?;
        let id = SourceId::new(conn.last_insert_rowid());
        self.get_source(id)
    }

    pub fn get_source(&self, id: SourceId) -> StoreResult<Source> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, project_id, source_type, connection_uri, config, last_indexed_commit, credential_ref
             FROM sources WHERE id = ?1",
            params![id.value()],
            row_to_source,
        )
        .map_err(|_| StoreError::SourceNotFound(id.value().to_string()))
    }

    /// Updates `last_indexed_commit` on successful completion of a git-sourced
    /// run.
    pub fn set_last_indexed_commit(&self, id: SourceId, commit_sha: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE sources SET last_indexed_commit = ?1 WHERE id = ?2",
            params![commit_sha, id.value()],
        )?;
        Ok(())
    }
}
