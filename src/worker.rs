//! Parse worker: consumes `parse_tasks` chunks, parses
//! and persists each file, and races every other worker on the same run's
//! completion counter to decide who gets to trigger phase 2.

use crate::classify::is_migration_or_schema;
use crate::error::QueueError;
use crate::model::Trigger;
use crate::parsers::registry::ParserRegistry;
use crate::parsers::FileInput;
use crate::pipeline::{chunk_counter_key, ChunkFile, IngestMessage, ParseTaskMessage};
use crate::queue::{drain_pending, Message, Queue};
use crate::store::{DeadLetter, SqliteStore};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct ParseWorker {
    store: SqliteStore,
    queue: Arc<dyn Queue>,
    registry: ParserRegistry,
    parse_stream: String,
    ingest_stream: String,
    consumer_group: String,
    max_delivery_attempts: u32,
}

impl ParseWorker {
    pub fn new(
        store: SqliteStore,
        queue: Arc<dyn Queue>,
        parse_stream: String,
        ingest_stream: String,
        consumer_group: String,
        max_delivery_attempts: u32,
    ) -> Self {
        Self { store, queue, registry: ParserRegistry::new(), parse_stream, ingest_stream, consumer_group, max_delivery_attempts }
    }

    /// Runs the startup recovery protocol then the consume loop forever.
    pub fn run_forever(&self, consumer: &str, block_ms: u64) -> Result<(), crate::error::QueueError> {
        self.queue.ensure_group(&self.parse_stream, &self.consumer_group)?;
        self.queue.ensure_group(&self.ingest_stream, &self.consumer_group)?;

        let recovered = drain_pending(self.queue.as_ref(), &self.parse_stream, &self.consumer_group, consumer, |message| {
            self.handle_message(message, consumer);
            Ok(())
        })?;
        if recovered > 0 {
            info!(recovered, "drained pending parse tasks on startup");
        }

        loop {
            let messages = self.queue.consume(&self.parse_stream, &self.consumer_group, consumer, block_ms, 4)?;
            for message in &messages {
                self.handle_message(message, consumer);
                self.queue.ack(&self.parse_stream, &self.consumer_group, &message.id)?;
            }
        }
    }

    /// Processes one delivered parse-task message to completion: parses
    /// and persists every file in the chunk, then races the completion
    /// counter. Public so a caller driving the queue by hand (tests, or an
    /// embedder that doesn't want `run_forever`'s loop) can process exactly
    /// one message without threads.
    pub fn handle_message(&self, message: &Message, consumer: &str) {
        let task: ParseTaskMessage = match serde_json::from_slice(&message.payload) {
            Ok(task) => task,
            Err(err) => {
                error!(error = %err, message_id = %message.id, "malformed parse task, dead-lettering");
                self.dead_letter(message, &err.to_string());
                return;
            }
        };

        if message.delivery_count > self.max_delivery_attempts {
            warn!(message_id = %message.id, attempts = message.delivery_count, "parse task exceeded retry budget, dead-lettering");
            self.dead_letter(message, "exceeded max_delivery_attempts");
            self.complete_chunk(&task, consumer);
            return;
        }

        for file in &task.files {
            if let Err(err) = self.process_file(&task, file) {
                error!(error = %err, path = %file.relative_path, "failed to persist file, skipping");
            }
        }

        self.complete_chunk(&task, consumer);
    }

    fn process_file(&self, task: &ParseTaskMessage, file: &ChunkFile) -> crate::error::StoreResult<()> {
        let content = match std::fs::read_to_string(&file.absolute_path) {
            Ok(content) => content,
            Err(err) => {
                warn!(error = %err, path = %file.absolute_path, "could not read file, skipping");
                return Ok(());
            }
        };

        let skip_lineage = is_migration_or_schema(&file.relative_path, &task.lineage_exclude_paths);
        let input = FileInput { path: &file.relative_path, content: &content, language: &file.language, skip_column_lineage: skip_lineage };
        let parser = self.registry.parser_for(&file.relative_path);

        let parsed = match parser.parse(&input) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, path = %file.relative_path, "parse error, file left without symbols this run");
                return Ok(());
            }
        };

        let outcome = crate::persist::persist_file(&self.store, task.project_id, task.run_id, file.file_id, &parsed)?;
        self.store.add_run_counters(task.run_id, 1, outcome.symbol_count as u64, outcome.edges_created as u64)?;
        Ok(())
    }

    fn dead_letter(&self, message: &Message, reason: &str) {
        let letter = DeadLetter {
            stream: self.parse_stream.clone(),
            message_id: message.id.clone(),
            payload: message.payload.clone(),
            reason: reason.to_string(),
            attempts: message.delivery_count,
        };
        if let Err(err) = self.store.record_dead_letter(&letter) {
            error!(error = %err, "failed to record dead letter");
        }
    }

    /// Atomically increments this run's chunk-completion counter; the
    /// worker that observes it reach `total_chunks` is the one — and only
    /// one, since `incr` is atomic — that emits `parse_complete`.
    fn complete_chunk(&self, task: &ParseTaskMessage, consumer: &str) {
        let counter_key = chunk_counter_key(task.run_id);
        let done = match self.queue.incr(&counter_key) {
            Ok(done) => done,
            Err(err) => {
                error!(error = %err, run_id = task.run_id.value(), "failed to increment chunk counter");
                return;
            }
        };

        if done as usize >= task.total_chunks {
            if let Err(err) = self.queue.del(&counter_key) {
                warn!(error = %err, "failed to delete exhausted chunk counter");
            }
            self.emit_parse_complete(task, consumer);
        }
    }

    fn emit_parse_complete(&self, task: &ParseTaskMessage, consumer: &str) {
        let message = IngestMessage {
            project_id: task.project_id,
            source_id: Some(task.source_id),
            trigger: Trigger::ParseComplete,
            run_id: Some(task.run_id),
        };
        let payload = match serde_json::to_vec(&message) {
            Ok(payload) => payload,
            Err(err) => {
                error!(error = %QueueError::from(err), "failed to serialize parse_complete message");
                return;
            }
        };
        if let Err(err) = self.queue.enqueue(&self.ingest_stream, &payload) {
            error!(error = %err, run_id = task.run_id.value(), consumer, "failed to enqueue parse_complete");
        } else {
            info!(run_id = task.run_id.value(), "all chunks complete, parse_complete emitted");
        }
    }
}
