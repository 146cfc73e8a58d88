//! Layered configuration for the ingestion and resolution engine.
//!
//! - Default values
//! - TOML configuration file (`.cigraph/settings.toml`, searched from the
//!   current directory upward)
//! - Environment variable overrides, prefixed `CI_` with `__` separating
//!   nested levels (e.g. `CI_PIPELINE__CHUNK_SIZE=250`)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub reaper: ReaperConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QueueConfig {
    /// Redis connection URL, e.g. `redis://127.0.0.1:6379`. When unset the
    /// in-process memory queue is used instead (tests, local dev).
    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_ingest_stream")]
    pub ingest_stream: String,

    #[serde(default = "default_parse_stream")]
    pub parse_stream: String,

    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,

    #[serde(default = "default_block_ms")]
    pub block_ms: u64,

    /// Delivery attempts before a parse-task handler is dead-lettered (§7).
    #[serde(default = "default_max_delivery_attempts")]
    pub max_delivery_attempts: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub sqlite_path: PathBuf,

    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PipelineSettings {
    /// Files per parse-task chunk (§4.5, §9: kept a single global constant).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_parallel_threads")]
    pub worker_threads: usize,

    #[serde(default = "default_work_dir_root")]
    pub work_dir_root: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReaperConfig {
    #[serde(default = "default_reaper_interval_secs")]
    pub interval_secs: u64,

    /// How long a `running` IndexRun may go without progress before the
    /// reaper marks it `failed` (§7).
    #[serde(default = "default_staleness_secs")]
    pub staleness_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,

    #[serde(default)]
    pub modules: std::collections::HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}
fn default_ingest_stream() -> String {
    "ingest".to_string()
}
fn default_parse_stream() -> String {
    "parse_tasks".to_string()
}
fn default_consumer_group() -> String {
    "cigraph".to_string()
}
fn default_block_ms() -> u64 {
    5_000
}
fn default_max_delivery_attempts() -> u32 {
    5
}
fn default_db_path() -> PathBuf {
    PathBuf::from(".cigraph/engine.sqlite3")
}
fn default_pool_size() -> u32 {
    8
}
fn default_chunk_size() -> usize {
    500
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_work_dir_root() -> PathBuf {
    std::env::temp_dir().join("cigraph-work")
}
fn default_reaper_interval_secs() -> u64 {
    60
}
fn default_staleness_secs() -> u64 {
    3600
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            queue: QueueConfig::default(),
            store: StoreConfig::default(),
            pipeline: PipelineSettings::default(),
            reaper: ReaperConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            ingest_stream: default_ingest_stream(),
            parse_stream: default_parse_stream(),
            consumer_group: default_consumer_group(),
            block_ms: default_block_ms(),
            max_delivery_attempts: default_max_delivery_attempts(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sqlite_path: default_db_path(),
            pool_size: default_pool_size(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            worker_threads: default_parallel_threads(),
            work_dir_root: default_work_dir_root(),
        }
    }
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_reaper_interval_secs(),
            staleness_secs: default_staleness_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: std::collections::HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources: defaults, `.cigraph/settings.toml`
    /// found by walking up from the current directory, then `CI_`-prefixed
    /// environment variables.
    pub fn load() -> Result<Self, figment::Error> {
        let config_path =
            Self::find_workspace_config().unwrap_or_else(|| PathBuf::from(".cigraph/settings.toml"));

        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("CI_").map(|key| key.as_str().to_lowercase().replace("__", ".").into()))
            .extract()
    }

    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".cigraph");
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }
        None
    }
}

/// Project-level settings recognized from `Project.settings` JSON.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProjectSettings {
    #[serde(default)]
    pub lineage_exclude_paths: Vec<String>,

    #[serde(default)]
    pub retention: RetentionSettings,

    #[serde(default)]
    pub auto_resync: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RetentionSettings {
    pub max_snapshots: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let s = Settings::default();
        assert_eq!(s.pipeline.chunk_size, 500);
        assert_eq!(s.queue.ingest_stream, "ingest");
        assert_eq!(s.queue.parse_stream, "parse_tasks");
    }

    #[test]
    fn project_settings_parse_from_json() {
        let json = r#"{"lineage_exclude_paths": ["vendor/**"], "auto_resync": true}"#;
        let parsed: ProjectSettings = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.lineage_exclude_paths, vec!["vendor/**".to_string()]);
        assert!(parsed.auto_resync);
    }
}
