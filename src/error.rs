//! Error types for the ingestion and resolution engine.
//!
//! Each subsystem gets its own `thiserror` enum — domain-separated error
//! layering (`StageError`, `ParseError`, `StoreError`, ...) rather than a
//! single flat error type.

use crate::types::{FileId, ProjectId, RunId, SymbolId};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the durable queue.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("queue unavailable: {0}")]
    Unavailable(String),

    #[error("failed to serialize message payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("consumer group '{0}' is not registered")]
    UnknownGroup(String),

    #[error("message {0} not found")]
    MessageNotFound(String),
}

pub type QueueResult<T> = Result<T, QueueError>;

/// Errors from source connectors and git delta computation.
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("git operation failed: {0}")]
    Git(String),

    #[error("path '{path}' escapes the work directory (zip-slip)")]
    PathEscape { path: PathBuf },

    #[error("object storage error: {0}")]
    ObjectStorage(String),

    #[error("io error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported source type: {0}")]
    UnsupportedSourceType(String),
}

pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Errors surfaced by the relational store (authoritative mutator).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("project '{0}' not found")]
    ProjectNotFound(String),

    #[error("source '{0}' not found")]
    SourceNotFound(String),

    #[error("index run {0:?} not found")]
    RunNotFound(RunId),

    #[error("file {0:?} not found")]
    FileNotFound(FileId),

    #[error("symbol {0:?} not found")]
    SymbolNotFound(SymbolId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from a single parser invocation (§6.2 contract).
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to parse {language} file '{path}': {reason}")]
    Syntax {
        path: PathBuf,
        language: String,
        reason: String,
    },

    #[error("invalid UTF-8 in '{path}'")]
    InvalidUtf8 { path: PathBuf },
}

pub type ParseOutcome<T> = Result<T, ParseError>;

/// Errors surfaced by a pipeline stage; any one of these fails the whole
/// IndexRun.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("clone stage failed: {0}")]
    Clone(#[from] ConnectorError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("resolver error: {0}")]
    Resolve(String),

    #[error("graph sync error: {0}")]
    GraphSync(String),

    #[error("embedding error: {0}")]
    Embed(String),

    #[error("analytics error: {0}")]
    Analytics(String),

    #[error("stage cancelled")]
    Cancelled,
}

pub type StageResult<T> = Result<T, StageError>;

/// Top-level error type returned by the orchestrator's public API.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error("project {0:?} has no source configured for trigger")]
    MissingSource(ProjectId),

    #[error("configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Recovery suggestions for interactive CLI users.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Stage(StageError::Queue(_)) | Self::Queue(_) => vec![
                "Check that the queue backend is reachable",
                "A crashed consumer's pending messages will be redelivered on restart",
            ],
            Self::Stage(StageError::Store(_)) | Self::Store(_) => vec![
                "Check the sqlite database path and file permissions",
                "Re-running the index is safe: writes are idempotent",
            ],
            Self::Stage(StageError::Clone(_)) | Self::Connector(_) => vec![
                "Verify the source's connection uri and credentials",
                "A failed clone falls back to full re-index on the next trigger",
            ],
            _ => vec![],
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
