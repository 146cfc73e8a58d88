//! The orchestrator: consumes `ingest` messages and drives
//! both halves of a run. Runs as its own process ([`cigraph-orchestrator`](../../bin/orchestrator.rs))
//! so it can scale independently of parse workers.

use super::stages::{analytics, clone, embed, graph_sync, parse_dispatch};
use super::IngestMessage;
use crate::config::Settings;
use crate::connectors::connector_for;
use crate::error::{EngineError, EngineResult, StageError};
use crate::graph_store::GraphStore;
use crate::model::{Project, RunStatus, Source, Trigger};
use crate::object_storage::ObjectStore;
use crate::queue::{drain_pending, Queue};
use crate::store::SqliteStore;
use crate::types::{ProjectId, RunId};
use std::sync::Arc;
use tracing::{info, warn};

pub struct Orchestrator {
    store: SqliteStore,
    queue: Arc<dyn Queue>,
    object_store: Arc<dyn ObjectStore>,
    graph_store: Arc<dyn GraphStore>,
    settings: Settings,
}

impl Orchestrator {
    pub fn new(
        store: SqliteStore,
        queue: Arc<dyn Queue>,
        object_store: Arc<dyn ObjectStore>,
        graph_store: Arc<dyn GraphStore>,
        settings: Settings,
    ) -> Self {
        Self { store, queue, object_store, graph_store, settings }
    }

    /// Runs the recovery protocol, then the consume loop, forever. Each
    /// message either starts phase 1 for a fresh trigger or resumes phase 2
    /// for a `parse_complete` trigger.
    pub fn run_forever(&self, consumer: &str) -> EngineResult<()> {
        let stream = &self.settings.queue.ingest_stream;
        let group = &self.settings.queue.consumer_group;
        self.queue.ensure_group(stream, group)?;

        let recovered = drain_pending(self.queue.as_ref(), stream, group, consumer, |message| {
            if let Err(err) = self.handle_raw(&message.payload) {
                warn!(error = %err, "recovered ingest message failed on redelivery");
            }
            Ok(())
        })?;
        if recovered > 0 {
            info!(recovered, "drained pending ingest messages on startup");
        }

        loop {
            let messages = self.queue.consume(stream, group, consumer, self.settings.queue.block_ms, 16)?;
            for message in &messages {
                if let Err(err) = self.handle_raw(&message.payload) {
                    warn!(error = %err, "ingest message handling failed");
                }
                self.queue.ack(stream, group, &message.id)?;
            }
        }
    }

    fn handle_raw(&self, payload: &[u8]) -> EngineResult<()> {
        let message: IngestMessage = serde_json::from_slice(payload)
            .map_err(|e| EngineError::Config(format!("malformed ingest message: {e}")))?;
        self.handle(message)
    }

    pub fn handle(&self, message: IngestMessage) -> EngineResult<()> {
        if message.trigger.enters_phase_one() {
            self.run_phase_one(message.project_id, message.source_id, message.trigger)
        } else {
            let run_id = message.run_id.ok_or_else(|| EngineError::Config("parse_complete with no run_id".to_string()))?;
            self.run_phase_two_marking_failure(run_id).map_err(EngineError::from)
        }
    }

    /// Runs phase 2 and, on a stage error, marks the run `failed` with that
    /// error's message before propagating it — per spec.md §4.2, a stage
    /// error must set `IndexRun.status = failed` with the real message
    /// rather than leave the run `running` for the reaper's staleness
    /// timeout to eventually close out with a generic one.
    fn run_phase_two_marking_failure(&self, run_id: RunId) -> Result<(), StageError> {
        match self.run_phase_two(run_id) {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Err(store_err) = self.store.finish_run(run_id, RunStatus::Failed, Some(&err.to_string())) {
                    warn!(error = %store_err, run_id = run_id.value(), "failed to record phase 2 stage failure on run");
                }
                Err(err)
            }
        }
    }

    fn run_phase_one(&self, project_id: ProjectId, source_id: Option<crate::types::SourceId>, trigger: Trigger) -> EngineResult<()> {
        let project = self.store.get_project(project_id)?;
        let source_id = source_id.ok_or(EngineError::MissingSource(project_id))?;
        let source = self.store.get_source(source_id)?;

        let run = self.store.create_run(project_id, Some(source_id), trigger)?;
        self.store.mark_run_started(run.id)?;
        info!(run_id = run.id.value(), project = %project.slug, "phase 1 started");

        match self.clone_and_dispatch(&project, &source, run.id) {
            Ok(total_chunks) if total_chunks == 0 => {
                info!(run_id = run.id.value(), "no files to parse, entering phase 2 directly");
                self.run_phase_two_marking_failure(run.id)?;
            }
            Ok(total_chunks) => {
                info!(run_id = run.id.value(), total_chunks, "parse tasks dispatched");
            }
            Err(err) => {
                self.store.finish_run(run.id, RunStatus::Failed, Some(&err.to_string()))?;
                return Err(EngineError::Stage(err));
            }
        }
        Ok(())
    }

    fn clone_and_dispatch(&self, project: &Project, source: &Source, run_id: RunId) -> Result<usize, StageError> {
        let connector = connector_for(source.source_type);
        let clone_output = connector
            .clone_source(source, &self.settings.pipeline.work_dir_root, self.object_store.as_ref())
            .map_err(StageError::Clone)?;

        if let Some(sha) = &clone_output.current_sha {
            self.store.set_run_commit(run_id, sha)?;
        }

        for deleted in &clone_output.deleted_files {
            if let Ok(file) = self.store.get_file_by_path(project.id, source.id, deleted) {
                self.store.delete_file(file.id)?;
            }
        }

        let discovered = clone::discover_files(&clone_output)
            .map_err(|e| StageError::Clone(crate::error::ConnectorError::Io { path: clone_output.work_dir.clone(), source: e }))?;

        let project_settings = project.project_settings();
        parse_dispatch::dispatch(
            &self.store,
            self.queue.as_ref(),
            &self.settings.queue.parse_stream,
            project.id,
            run_id,
            source.id,
            &discovered,
            self.settings.pipeline.chunk_size,
            project_settings.lineage_exclude_paths,
        )
    }

    /// Phase 2: resolve, graph-sync, embed, analytics, finish. Called
    /// either directly (phase 1 found nothing to parse) or from a
    /// `parse_complete` ingest message emitted by the last worker to close
    /// out a run's chunk count.
    pub fn run_phase_two(&self, run_id: RunId) -> Result<(), StageError> {
        let run = self.store.get_run(run_id)?;
        info!(run_id = run_id.value(), "phase 2 started");

        let schema_default = run
            .source_id
            .and_then(|id| self.store.get_source(id).ok())
            .and_then(|source| source.config.get("default_schema").and_then(|v| v.as_str().map(str::to_string)));

        let outcome = crate::resolver::resolve_project(&self.store, run.project_id, run_id, schema_default.as_deref())?;
        self.store.add_run_counters(
            run_id,
            0,
            0,
            (outcome.reference_stats.resolved() + outcome.column_edges_created) as u64,
        )?;

        graph_sync::sync_project(&self.store, self.graph_store.as_ref(), run.project_id)?;

        let embedder = crate::embedder::MockEmbedder::default();
        let embedded = embed::embed_project(&self.store, &embedder, run.project_id)?;
        info!(run_id = run_id.value(), embedded, "embed stage complete");

        analytics::compute_project_analytics(&self.store, run.project_id)?;

        if let (Some(source_id), Some(sha)) = (run.source_id, &run.commit_sha) {
            self.store.set_last_indexed_commit(source_id, sha)?;
        }

        self.store.finish_run(run_id, RunStatus::Completed, None)?;
        info!(run_id = run_id.value(), "run completed");
        Ok(())
    }
}
