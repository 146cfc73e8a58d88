use clap::Parser;
use cigraph_engine::config::Settings;
use cigraph_engine::graph_store::InMemoryGraphStore;
use cigraph_engine::object_storage::LocalObjectStore;
use cigraph_engine::queue::{MemoryQueue, Queue, RedisStreamQueue};
use cigraph_engine::store::SqliteStore;
use cigraph_engine::{EngineResult, Orchestrator};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cigraph-orchestrator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Drives run orchestration: clone, dispatch, resolve, graph-sync, embed, analytics")]
struct Cli {
    /// Identity this process registers under in the ingest stream's
    /// consumer group. Defaults to the hostname.
    #[arg(long, env = "CI_CONSUMER")]
    consumer: Option<String>,

    /// Path to settings.toml; otherwise discovered by walking up from cwd.
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

fn main() -> EngineResult<()> {
    let cli = Cli::parse();

    let settings = if let Some(path) = &cli.config {
        figment::Figment::new()
            .merge(figment::providers::Serialized::defaults(Settings::default()))
            .merge(figment::providers::Toml::file(path))
            .extract()
            .map_err(|e| cigraph_engine::error::EngineError::Config(e.to_string()))?
    } else {
        Settings::load().map_err(|e| cigraph_engine::error::EngineError::Config(e.to_string()))?
    };

    cigraph_engine::logging::init_with_config(&settings.logging);

    let consumer = cli.consumer.unwrap_or_else(|| {
        hostname_or_default()
    });

    let store = SqliteStore::open(&settings.store.sqlite_path, settings.store.pool_size)?;

    let queue: Arc<dyn Queue> = match &settings.queue.redis_url {
        Some(url) => Arc::new(RedisStreamQueue::connect(url)?),
        None => Arc::new(MemoryQueue::new()),
    };

    let object_store = Arc::new(
        LocalObjectStore::new(settings.pipeline.work_dir_root.join("objects"))
            .map_err(|e| cigraph_engine::error::EngineError::Config(e.to_string()))?,
    );
    let graph_store = Arc::new(InMemoryGraphStore::new());

    spawn_reaper(store.clone(), queue.clone(), &settings.reaper);

    let orchestrator = Orchestrator::new(store, queue, object_store, graph_store, settings);
    orchestrator.run_forever(&consumer)
}

/// The reaper runs on a timer from this process rather than as its own
/// binary: one fewer deployable unit, and a stuck run is
/// only ever noticed by whoever already owns the ingest stream.
fn spawn_reaper(store: SqliteStore, queue: Arc<dyn Queue>, config: &cigraph_engine::config::ReaperConfig) {
    let interval_secs = config.interval_secs;
    let staleness_secs = config.staleness_secs;
    std::thread::spawn(move || {
        let reaper = cigraph_engine::Reaper::new(&store, queue.as_ref(), staleness_secs);
        if let Err(err) = reaper.run_forever(interval_secs) {
            tracing::error!(error = %err, "reaper loop exited");
        }
    });
}

fn hostname_or_default() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| format!("orchestrator-{}", std::process::id()))
}
