use crate::types::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row per analytics subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsScope {
    Symbol,
    File,
    Project,
    Language,
    BridgeSummary,
}

impl AnalyticsScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::File => "file",
            Self::Project => "project",
            Self::Language => "language",
            Self::BridgeSummary => "bridge_summary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "symbol" => Some(Self::Symbol),
            "file" => Some(Self::File),
            "project" => Some(Self::Project),
            "language" => Some(Self::Language),
            "bridge_summary" => Some(Self::BridgeSummary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectAnalytics {
    pub project_id: ProjectId,
    pub scope: AnalyticsScope,
    pub scope_id: String,
    pub computed_at: DateTime<Utc>,
    pub payload: Value,
}
