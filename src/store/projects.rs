use super::SqliteStore;
use crate::error::{StoreError, StoreResult};
use crate::model::Project;
use crate::types::ProjectId;
use rusqlite::{params, Row};

fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
    let settings_json: String = row.get("settings")?;
    Ok(Project {
        id: ProjectId::new(row.get("id")?),
        slug: row.get("slug")?,
        name: row.get("name")?,
        tenant_id: row.get("tenant_id")?,
        description: row.get("description")?,
        settings: serde_json::from_str(&settings_json).unwrap_or(serde_json::json!({})),
    })
}

impl SqliteStore {
    /// Creates a project. Slugs are unique; mutated only by the API layer
    /// by lifecycle rule, never by the pipeline.
    pub fn create_project(
        &self,
        slug: &str,
        name: &str,
        tenant_id: &str,
        description: Option<&str>,
        settings: &serde_json::Value,
    ) -> StoreResult<Project> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO projects (slug, name, tenant_id, description, settings) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![slug, name, tenant_id, description, settings.to_string()],
        )?;
        let id = ProjectId::new(conn.last_insert_rowid());
        self.get_project(id)
    }

    pub fn get_project(&self, id: ProjectId) -> StoreResult<Project> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, slug, name, tenant_id, description, settings FROM projects WHERE id = ?1",
            params![id.value()],
            row_to_project,
        )
        .map_err(|_| StoreError::ProjectNotFound(id.value().to_string()))
    }

    pub fn get_project_by_slug(&self, slug: &str) -> StoreResult<Project> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, slug, name, tenant_id, description, settings FROM projects WHERE slug = ?1",
            params![slug],
            row_to_project,
        )
        .map_err(|_| StoreError::ProjectNotFound(slug.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_fetch_project_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();
        let created = store
            .create_project("acme-api", "Acme API", "tenant-1", Some("core service"), &serde_json::json!({}))
            .unwrap();
        let fetched = store.get_project(created.id).unwrap();
        assert_eq!(fetched.slug, "acme-api");
        assert_eq!(fetched.tenant_id, "tenant-1");

        let by_slug = store.get_project_by_slug("acme-api").unwrap();
        assert_eq!(by_slug.id, created.id);
    }

    #[test]
    fn duplicate_slug_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .create_project("dup", "Dup", "t", None, &serde_json::json!({}))
            .unwrap();
        let second = store.create_project("dup", "Dup Two", "t", None, &serde_json::json!({}));
        assert!(second.is_err());
    }
}
