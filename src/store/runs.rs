use super::SqliteStore;
use crate::error::{StoreError, StoreResult};
use crate::model::{IndexRun, RunStatus, Trigger};
use crate::types::{ProjectId, RunId, SourceId};
use chrono::Utc;
use rusqlite::{params, Row};

fn row_to_run(row: &Row) -> rusqlite::Result<IndexRun> {
    let trigger: String = row.get("trigger")?;
    let status: String = row.get("status")?;
    let source_id: Option<i64> = row.get("source_id")?;
    Ok(IndexRun {
        id: RunId::new(row.get("id")?),
        project_id: ProjectId::new(row.get("project_id")?),
        source_id: source_id.map(SourceId::new),
        trigger: Trigger::parse(&trigger).unwrap_or(Trigger::Manual),
        status: RunStatus::parse(&status).unwrap_or(RunStatus::Pending),
        started_at: row.get("started_at")?,
        completed_at: row.get("completed_at")?,
        commit_sha: row.get("commit_sha")?,
        files_processed: row.get::<_, i64>("files_processed")? as u64,
        symbols_found: row.get::<_, i64>("symbols_found")? as u64,
        edges_found: row.get::<_, i64>("edges_found")? as u64,
        error_message: row.get("error_message")?,
    })
}

impl SqliteStore {
    pub fn create_run(
        &self,
        project_id: ProjectId,
        source_id: Option<SourceId>,
        trigger: Trigger,
    ) -> StoreResult<IndexRun> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO index_runs (project_id, source_id, trigger, status) VALUES (?1, ?2, ?3, ?4)",
            params![project_id.value(), source_id.map(|s| s.value()), trigger.as_str(), RunStatus::Pending.as_str()],
        )?;
        self.get_run(RunId::new(conn.last_insert_rowid()))
    }

    pub fn get_run(&self, id: RunId) -> StoreResult<IndexRun> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, project_id, source_id, trigger, status, started_at, completed_at,
                    commit_sha, files_processed, symbols_found, edges_found, error_message
             FROM index_runs WHERE id = ?1",
            params![id.value()],
            row_to_run,
        )
        .map_err(|_| StoreError::RunNotFound(id))
    }

    pub fn mark_run_started(&self, id: RunId) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE index_runs SET status = ?1, started_at = ?2 WHERE id = ?3",
            params![RunStatus::Running.as_str(), Utc::now(), id.value()],
        )?;
        Ok(())
    }

    /// Adds to the run's aggregate counters; never overwrites, per the
    /// monotonic-update rule.
    pub fn add_run_counters(&self, id: RunId, files: u64, symbols: u64, edges: u64) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE index_runs
             SET files_processed = files_processed + ?1,
                 symbols_found = symbols_found + ?2,
                 edges_found = edges_found + ?3
             WHERE id = ?4",
            params![files as i64, symbols as i64, edges as i64, id.value()],
        )?;
        Ok(())
    }

    pub fn set_run_commit(&self, id: RunId, commit_sha: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE index_runs SET commit_sha = ?1 WHERE id = ?2",
            params![commit_sha, id.value()],
        )?;
        Ok(())
    }

    pub fn finish_run(&self, id: RunId, status: RunStatus, error_message: Option<&str>) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE index_runs SET status = ?1, completed_at = ?2, error_message = ?3 WHERE id = ?4",
            params![status.as_str(), Utc::now(), error_message, id.value()],
        )?;
        Ok(())
    }

    /// All runs for a project, most recent first. Used by tests and the
    /// API's run-history listing.
    pub fn list_runs_for_project(&self, project_id: ProjectId) -> StoreResult<Vec<IndexRun>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, source_id, trigger, status, started_at, completed_at,
                    commit_sha, files_processed, symbols_found, edges_found, error_message
             FROM index_runs WHERE project_id = ?1 ORDER BY id DESC",
        )?;
        let rows = stmt.query_map(params![project_id.value()], row_to_run)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Runs still `running` whose `started_at` is older than `threshold_secs`
    /// ago — candidates for the reaper to fail out. Filtered in
    /// Rust rather than SQL so the comparison isn't at the mercy of
    /// `chrono`'s RFC 3339 text format versus SQLite's `datetime()` text
    /// format disagreeing on a separator.
    pub fn list_stale_running_runs(&self, threshold_secs: u64) -> StoreResult<Vec<IndexRun>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, source_id, trigger, status, started_at, completed_at,
                    commit_sha, files_processed, symbols_found, edges_found, error_message
             FROM index_runs WHERE status = ?1",
        )?;
        let rows = stmt.query_map(params![RunStatus::Running.as_str()], row_to_run)?;
        let cutoff = Utc::now() - chrono::Duration::seconds(threshold_secs as i64);
        rows.collect::<Result<Vec<_>, _>>()
            .map(|runs: Vec<IndexRun>| runs.into_iter().filter(|r| r.started_at.is_some_and(|started| started <= cutoff)).collect())
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_project(store: &SqliteStore) -> ProjectId {
        store
            .create_project("p", "P", "t", None, &serde_json::json!({}))
            .unwrap()
            .id
    }

    #[test]
    fn counters_accumulate_across_calls() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project_id = seed_project(&store);
        let run = store.create_run(project_id, None, Trigger::Manual).unwrap();

        store.add_run_counters(run.id, 2, 10, 4).unwrap();
        store.add_run_counters(run.id, 1, 5, 2).unwrap();

        let refreshed = store.get_run(run.id).unwrap();
        assert_eq!(refreshed.files_processed, 3);
        assert_eq!(refreshed.symbols_found, 15);
        assert_eq!(refreshed.edges_found, 6);
    }

    #[test]
    fn finish_run_sets_terminal_status() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project_id = seed_project(&store);
        let run = store.create_run(project_id, None, Trigger::Manual).unwrap();

        store.finish_run(run.id, RunStatus::Completed, None).unwrap();
        let refreshed = store.get_run(run.id).unwrap();
        assert!(refreshed.status.is_terminal());
        assert!(refreshed.completed_at.is_some());
    }
}
