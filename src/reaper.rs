//! Staleness reaper: a run stuck `running` past
//! `reaper.staleness_secs` almost always means its last worker died
//! mid-chunk and nothing will ever close the fan-in. The reaper fails the
//! run out so a fresh trigger can retry it, and clears the staging rows a
//! dead run left behind.

use crate::error::StoreResult;
use crate::model::RunStatus;
use crate::pipeline::chunk_counter_key;
use crate::queue::Queue;
use crate::store::SqliteStore;
use std::time::Duration;
use tracing::{info, warn};

pub struct Reaper<'a> {
    store: &'a SqliteStore,
    queue: &'a dyn Queue,
    staleness_secs: u64,
}

impl<'a> Reaper<'a> {
    pub fn new(store: &'a SqliteStore, queue: &'a dyn Queue, staleness_secs: u64) -> Self {
        Self { store, queue, staleness_secs }
    }

    /// Runs one sweep, returning the number of runs it failed out.
    pub fn sweep(&self) -> StoreResult<usize> {
        let stale = self.store.list_stale_running_runs(self.staleness_secs)?;
        for run in &stale {
            warn!(run_id = run.id.value(), staleness_secs = self.staleness_secs, "reaping stale run");

            if let Err(err) = self.queue.del(&chunk_counter_key(run.id)) {
                warn!(error = %err, run_id = run.id.value(), "failed to release chunk counter for reaped run");
            }

            self.store.clear_pending_references_for_run(run.id)?;
            self.store.clear_column_references_for_run(run.id)?;
            self.store.finish_run(run.id, RunStatus::Failed, Some("reaped: exceeded staleness threshold"))?;
        }
        if !stale.is_empty() {
            info!(count = stale.len(), "reaper sweep complete");
        }
        Ok(stale.len())
    }

    /// Sweeps forever at `interval_secs`, intended for the reaper binary's
    /// main loop.
    pub fn run_forever(&self, interval_secs: u64) -> StoreResult<()> {
        loop {
            self.sweep()?;
            std::thread::sleep(Duration::from_secs(interval_secs));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Trigger;
    use crate::queue::MemoryQueue;

    #[test]
    fn sweep_leaves_fresh_running_runs_alone() {
        let store = SqliteStore::open_in_memory().unwrap();
        let queue = MemoryQueue::new();
        let project = store.create_project("p", "P", "t", None, &serde_json::json!({})).unwrap();
        let run = store.create_run(project.id, None, Trigger::Manual).unwrap();
        store.mark_run_started(run.id).unwrap();

        let reaper = Reaper::new(&store, &queue, 3600);
        let reaped = reaper.sweep().unwrap();

        assert_eq!(reaped, 0);
        assert_eq!(store.get_run(run.id).unwrap().status, crate::model::RunStatus::Running);
    }

    #[test]
    fn sweep_fails_out_a_run_with_zero_staleness_budget() {
        let store = SqliteStore::open_in_memory().unwrap();
        let queue = MemoryQueue::new();
        let project = store.create_project("p", "P", "t", None, &serde_json::json!({})).unwrap();
        let run = store.create_run(project.id, None, Trigger::Manual).unwrap();
        store.mark_run_started(run.id).unwrap();

        let reaper = Reaper::new(&store, &queue, 0);
        let reaped = reaper.sweep().unwrap();

        assert_eq!(reaped, 1);
        let refreshed = store.get_run(run.id).unwrap();
        assert_eq!(refreshed.status, crate::model::RunStatus::Failed);
        assert!(refreshed.error_message.is_some());
    }
}
