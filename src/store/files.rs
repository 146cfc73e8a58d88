use super::SqliteStore;
use crate::error::{StoreError, StoreResult};
use crate::model::File;
use crate::types::{FileId, ProjectId, SourceId};
use chrono::Utc;
use rusqlite::{params, Row};

fn row_to_file(row: &Row) -> rusqlite::Result<File> {
    Ok(File {
        id: FileId::new(row.get("id")?),
        project_id: ProjectId::new(row.get("project_id")?),
        source_id: SourceId::new(row.get("source_id")?),
        path: row.get("path")?,
        language: row.get("language")?,
        size: row.get::<_, i64>("size")? as u64,
        sha256: row.get("sha256")?,
        last_indexed_at: row.get("last_indexed_at")?,
    })
}

impl SqliteStore {
    /// Upsert on (project_id, source_id, path).
    pub fn upsert_file(
        &self,
        project_id: ProjectId,
        source_id: SourceId,
        path: &str,
        language: Option<&str>,
        size: u64,
        sha256: &str,
    ) -> StoreResult<File> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO files (project_id, source_id, path, language, size, sha256, last_indexed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(project_id, source_id, path) DO UPDATE SET
                language = excluded.language,
                size = excluded.size,
                sha256 = excluded.sha256,
                last_indexed_at = excluded.last_indexed_at",
            params![
                project_id.value(),
                source_id.value(),
                path,
                language,
                size as i64,
                sha256,
                Utc::now(),
            ],
        )?;
        self.get_file_by_path(project_id, source_id, path)
    }

    pub fn get_file(&self, id: FileId) -> StoreResult<File> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, project_id, source_id, path, language, size, sha256, last_indexed_at
             FROM files WHERE id = ?1",
            params![id.value()],
            row_to_file,
        )
        .map_err(|_| StoreError::FileNotFound(id))
    }

    pub fn get_file_by_path(&self, project_id: ProjectId, source_id: SourceId, path: &str) -> StoreResult<File> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, project_id, source_id, path, language, size, sha256, last_indexed_at
             FROM files WHERE project_id = ?1 AND source_id = ?2 AND path = ?3",
            params![project_id.value(), source_id.value(), path],
            row_to_file,
        )
        .map_err(|_| StoreError::FileNotFound(FileId::new(0)))
    }

    pub fn delete_file(&self, id: FileId) -> StoreResult<()> {
        let conn = self.conn()?;
        // ON DELETE CASCADE removes the file's symbols and, transitively, their edges.
        conn.execute("DELETE FROM files WHERE id = ?1", params![id.value()])?;
        Ok(())
    }

    pub fn list_files_for_source(&self, source_id: SourceId) -> StoreResult<Vec<File>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, source_id, path, language, size, sha256, last_indexed_at
             FROM files WHERE source_id = ?1",
        )?;
        let rows = stmt.query_map(params![source_id.value()], row_to_file)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    pub fn list_files_for_project(&self, project_id: ProjectId) -> StoreResult<Vec<File>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, source_id, path, language, size, sha256, last_indexed_at
             FROM files WHERE project_id = ?1",
        )?;
        let rows = stmt.query_map(params![project_id.value()], row_to_file)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceType;

    fn seed(store: &SqliteStore) -> (ProjectId, SourceId) {
        let project = store.create_project("p", "P", "t", None, &serde_json::json!({})).unwrap();
        let source = store
            .create_source(project.id, SourceType::Filesystem, "/tmp/repo", &serde_json::json!({}), None)
            .unwrap();
        (project.id, source.id)
    }

    #[test]
    fn upsert_file_is_idempotent_on_key() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (project_id, source_id) = seed(&store);

        let first = store
            .upsert_file(project_id, source_id, "src/main.rs", Some("rust"), 120, "hash-a")
            .unwrap();
        let second = store
            .upsert_file(project_id, source_id, "src/main.rs", Some("rust"), 140, "hash-b")
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.sha256, "hash-b");
        assert_eq!(store.list_files_for_source(source_id).unwrap().len(), 1);
    }
}
