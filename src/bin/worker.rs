use clap::Parser;
use cigraph_engine::config::Settings;
use cigraph_engine::error::EngineError;
use cigraph_engine::queue::{MemoryQueue, Queue, RedisStreamQueue};
use cigraph_engine::store::SqliteStore;
use cigraph_engine::ParseWorker;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cigraph-worker")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Consumes parse-task chunks: parses files, persists symbols, closes the fan-in")]
struct Cli {
    /// Identity this process registers under in the parse_tasks consumer group.
    #[arg(long, env = "CI_CONSUMER")]
    consumer: Option<String>,

    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

fn main() -> Result<(), EngineError> {
    let cli = Cli::parse();

    let settings = if let Some(path) = &cli.config {
        figment::Figment::new()
            .merge(figment::providers::Serialized::defaults(Settings::default()))
            .merge(figment::providers::Toml::file(path))
            .extract()
            .map_err(|e| EngineError::Config(e.to_string()))?
    } else {
        Settings::load().map_err(|e| EngineError::Config(e.to_string()))?
    };

    cigraph_engine::logging::init_with_config(&settings.logging);

    let consumer = cli.consumer.unwrap_or_else(|| format!("worker-{}", std::process::id()));

    let store = SqliteStore::open(&settings.store.sqlite_path, settings.store.pool_size)?;

    let queue: Arc<dyn Queue> = match &settings.queue.redis_url {
        Some(url) => Arc::new(RedisStreamQueue::connect(url)?),
        None => Arc::new(MemoryQueue::new()),
    };

    let worker = ParseWorker::new(
        store,
        queue,
        settings.queue.parse_stream.clone(),
        settings.queue.ingest_stream.clone(),
        settings.queue.consumer_group.clone(),
        settings.queue.max_delivery_attempts,
    );

    worker.run_forever(&consumer, settings.queue.block_ms).map_err(EngineError::from)
}
