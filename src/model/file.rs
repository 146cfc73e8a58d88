use crate::types::{FileId, ProjectId, SourceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Keyed by (project_id, source_id, path); upsert semantics on re-index
///.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub id: FileId,
    pub project_id: ProjectId,
    pub source_id: SourceId,
    pub path: String,
    pub language: String,
    pub size: u64,
    pub sha256: String,
    pub last_indexed_at: DateTime<Utc>,
}
