use super::SqliteStore;
use crate::error::StoreResult;
use crate::model::{AnalyticsScope, ProjectAnalytics};
use crate::types::ProjectId;
use chrono::Utc;
use rusqlite::{params, Row};

fn row_to_analytics(row: &Row) -> rusqlite::Result<ProjectAnalytics> {
    let scope: String = row.get("scope")?;
    let payload_json: String = row.get("payload")?;
    Ok(ProjectAnalytics {
        project_id: ProjectId::new(row.get("project_id")?),
        scope: AnalyticsScope::parse(&scope).unwrap_or(AnalyticsScope::Project),
        scope_id: row.get("scope_id")?,
        computed_at: row.get("computed_at")?,
        payload: serde_json::from_str(&payload_json).unwrap_or(serde_json::json!({})),
    })
}

impl SqliteStore {
    pub fn upsert_analytics(
        &self,
        project_id: ProjectId,
        scope: AnalyticsScope,
        scope_id: &str,
        payload: &serde_json::Value,
    ) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO project_analytics (project_id, scope, scope_id, computed_at, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(project_id, scope, scope_id) DO UPDATE SET
                computed_at = excluded.computed_at,
                payload = excluded.payload",
            params![project_id.value(), scope.as_str(), scope_id, Utc::now(), payload.to_string()],
        )?;
        Ok(())
    }

    pub fn list_analytics(&self, project_id: ProjectId, scope: AnalyticsScope) -> StoreResult<Vec<ProjectAnalytics>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT project_id, scope, scope_id, computed_at, payload
             FROM project_analytics WHERE project_id = ?1 AND scope = ?2",
        )?;
        let rows = stmt.query_map(params![project_id.value(), scope.as_str()], row_to_analytics)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_analytics_replaces_existing_payload() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = store.create_project("p", "P", "t", None, &serde_json::json!({})).unwrap();

        store
            .upsert_analytics(project.id, AnalyticsScope::Project, "overview", &serde_json::json!({"symbols": 1}))
            .unwrap();
        store
            .upsert_analytics(project.id, AnalyticsScope::Project, "overview", &serde_json::json!({"symbols": 2}))
            .unwrap();

        let rows = store.list_analytics(project.id, AnalyticsScope::Project).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].payload["symbols"], 2);
    }
}
