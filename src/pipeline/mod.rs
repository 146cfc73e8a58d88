//! Two-phase index-run pipeline.
//!
//! Phase 1 (Clone → parse dispatch) and Phase 2 (Resolve → GraphBuild →
//! Embed → Analytics) are driven by the same [`Orchestrator`], entered
//! twice per run: once for the triggering message, once more when the
//! parse workers' fan-in emits a `parse_complete` message back onto the
//! ingest stream. The run itself — not the process — is the unit of
//! continuity; either phase can run in a different process invocation
//! than the other.

pub mod context;
pub mod orchestrator;
pub mod stages;

pub use context::RunContext;
pub use orchestrator::Orchestrator;

use crate::model::Trigger;
use crate::types::{ProjectId, RunId, SourceId};
use serde::{Deserialize, Serialize};

/// Payload carried on the `ingest` stream. A fresh
/// trigger has no `run_id` yet — the orchestrator creates one. A
/// `parse_complete` message always carries the `run_id` it's resuming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestMessage {
    pub project_id: ProjectId,
    pub source_id: Option<SourceId>,
    pub trigger: Trigger,
    pub run_id: Option<RunId>,
}

/// One file assigned to a parse-task chunk, with enough information for a
/// worker to read its content and persist it without touching the source
/// connector again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkFile {
    pub file_id: crate::types::FileId,
    pub relative_path: String,
    pub absolute_path: String,
    pub language: String,
}

/// One `parse_tasks` message. `total_chunks` is
/// denormalized onto every chunk of the same run so a worker can decide
/// fan-in completion without a second round trip to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseTaskMessage {
    pub run_id: RunId,
    pub project_id: ProjectId,
    pub source_id: SourceId,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub lineage_exclude_paths: Vec<String>,
    pub files: Vec<ChunkFile>,
}

/// Queue counter key a run's parse workers race to increment via an
/// atomic increment-and-compare.
pub fn chunk_counter_key(run_id: RunId) -> String {
    format!("parse:completed:{}", run_id.value())
}
