//! Shared scaffolding for the end-to-end scenario tests: a scratch git
//! repo driven directly through `git2`, and a one-call harness that wires
//! an `Orchestrator` and `ParseWorker` over an in-memory store and queue.

use cigraph_engine::config::Settings;
use cigraph_engine::graph_store::InMemoryGraphStore;
use cigraph_engine::model::{Project, Source, SourceType, Trigger};
use cigraph_engine::object_storage::LocalObjectStore;
use cigraph_engine::pipeline::IngestMessage;
use cigraph_engine::queue::{MemoryQueue, Queue};
use cigraph_engine::store::SqliteStore;
use cigraph_engine::worker::ParseWorker;
use cigraph_engine::Orchestrator;
use git2::{Repository, Signature};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub struct ScratchRepo {
    pub dir: TempDir,
}

impl ScratchRepo {
    pub fn init() -> Self {
        let dir = TempDir::new().expect("tempdir");
        Repository::init(dir.path()).expect("git init");
        Self { dir }
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn remove(&self, relative: &str) {
        std::fs::remove_file(self.dir.path().join(relative)).unwrap();
    }

    /// Stages every tracked/untracked file and commits, returning the new SHA.
    pub fn commit_all(&self, message: &str) -> String {
        let repo = Repository::open(self.dir.path()).unwrap();
        let mut index = repo.index().unwrap();
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();

        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<_> = parent.iter().collect();
        let commit_id = repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents).unwrap();
        commit_id.to_string()
    }

    pub fn clone_uri(&self) -> String {
        format!("file://{}", self.dir.path().display())
    }
}

pub struct Harness {
    pub store: SqliteStore,
    pub queue: Arc<dyn Queue>,
    pub orchestrator: Orchestrator,
    pub worker: ParseWorker,
    pub settings: Settings,
}

impl Harness {
    pub fn new(work_dir_root: &Path) -> Self {
        let store = SqliteStore::open_in_memory().unwrap();
        let queue: Arc<dyn Queue> = Arc::new(MemoryQueue::new());
        let object_store = Arc::new(LocalObjectStore::new(work_dir_root.join("objects")).unwrap());
        let graph_store = Arc::new(InMemoryGraphStore::new());

        let mut settings = Settings::default();
        settings.pipeline.work_dir_root = work_dir_root.to_path_buf();
        settings.pipeline.chunk_size = 500;

        let orchestrator = Orchestrator::new(
            store.clone(),
            queue.clone(),
            object_store,
            graph_store,
            settings.clone(),
        );
        let worker = ParseWorker::new(
            store.clone(),
            queue.clone(),
            settings.queue.parse_stream.clone(),
            settings.queue.ingest_stream.clone(),
            settings.queue.consumer_group.clone(),
            settings.queue.max_delivery_attempts,
        );

        queue.ensure_group(&settings.queue.parse_stream, &settings.queue.consumer_group).unwrap();
        queue.ensure_group(&settings.queue.ingest_stream, &settings.queue.consumer_group).unwrap();

        Self { store, queue, orchestrator, worker, settings }
    }

    pub fn create_project(&self, slug: &str) -> Project {
        self.store.create_project(slug, slug, "tenant", None, &serde_json::json!({})).unwrap()
    }

    pub fn create_git_source(&self, project_id: cigraph_engine::types::ProjectId, uri: &str) -> Source {
        self.store.create_source(project_id, SourceType::Git, uri, &serde_json::json!({}), None).unwrap()
    }

    /// Drains every pending `parse_tasks` message through the worker, one
    /// message at a time — no threads, deterministic ordering.
    pub fn drain_parse_tasks(&self, consumer: &str) {
        loop {
            let messages = self
                .queue
                .consume(&self.settings.queue.parse_stream, &self.settings.queue.consumer_group, consumer, 0, 16)
                .unwrap();
            if messages.is_empty() {
                break;
            }
            for message in &messages {
                self.worker.handle_message(message, consumer);
                self.queue.ack(&self.settings.queue.parse_stream, &self.settings.queue.consumer_group, &message.id).unwrap();
            }
        }
    }

    /// Drains every `ingest` message (the `parse_complete` trigger the
    /// worker emitted) back into the orchestrator, completing phase 2.
    pub fn drain_ingest(&self, consumer: &str) {
        loop {
            let messages = self
                .queue
                .consume(&self.settings.queue.ingest_stream, &self.settings.queue.consumer_group, consumer, 0, 16)
                .unwrap();
            if messages.is_empty() {
                break;
            }
            for message in &messages {
                let ingest: IngestMessage = serde_json::from_slice(&message.payload).unwrap();
                self.orchestrator.handle(ingest).unwrap();
                self.queue.ack(&self.settings.queue.ingest_stream, &self.settings.queue.consumer_group, &message.id).unwrap();
            }
        }
    }

    /// Runs one full trigger→phase1→phase2 cycle against `uri`, driving the
    /// worker and orchestrator by hand exactly as `run_forever` would.
    pub fn run_once(&self, project_id: cigraph_engine::types::ProjectId, source_id: cigraph_engine::types::SourceId) {
        self.orchestrator
            .handle(IngestMessage { project_id, source_id: Some(source_id), trigger: Trigger::Manual, run_id: None })
            .unwrap();
        self.drain_parse_tasks("worker-1");
        self.drain_ingest("orchestrator-1");
    }

}
