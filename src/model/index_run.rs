use crate::types::{ProjectId, RunId, SourceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Manual,
    Webhook,
    Schedule,
    Upload,
    ParseComplete,
}

impl Trigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Webhook => "webhook",
            Self::Schedule => "schedule",
            Self::Upload => "upload",
            Self::ParseComplete => "parse_complete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "webhook" => Some(Self::Webhook),
            "schedule" => Some(Self::Schedule),
            "upload" => Some(Self::Upload),
            "parse_complete" => Some(Self::ParseComplete),
            _ => None,
        }
    }

    /// Phase 1 runs for every trigger except `parse_complete`.
    pub fn enters_phase_one(self) -> bool {
        !matches!(self, Self::ParseComplete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// The unit of durability and progress reporting for one pipeline
/// invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRun {
    pub id: RunId,
    pub project_id: ProjectId,
    pub source_id: Option<SourceId>,
    pub trigger: Trigger,
    pub status: RunStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub commit_sha: Option<String>,
    pub files_processed: u64,
    pub symbols_found: u64,
    pub edges_found: u64,
    pub error_message: Option<String>,
}

impl IndexRun {
    pub fn new(id: RunId, project_id: ProjectId, source_id: Option<SourceId>, trigger: Trigger) -> Self {
        Self {
            id,
            project_id,
            source_id,
            trigger,
            status: RunStatus::Pending,
            started_at: None,
            completed_at: None,
            commit_sha: None,
            files_processed: 0,
            symbols_found: 0,
            edges_found: 0,
            error_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_complete_skips_phase_one() {
        assert!(!Trigger::ParseComplete.enters_phase_one());
        assert!(Trigger::Manual.enters_phase_one());
        assert!(Trigger::Webhook.enters_phase_one());
    }

    #[test]
    fn terminal_statuses() {
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Cancelled.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(!RunStatus::Pending.is_terminal());
    }
}
