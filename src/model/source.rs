use crate::types::{ProjectId, SourceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Git,
    ObjectArchive,
    RemoteBucket,
    Filesystem,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::ObjectArchive => "object-archive",
            Self::RemoteBucket => "remote-bucket",
            Self::Filesystem => "filesystem",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "git" => Some(Self::Git),
            "object-archive" => Some(Self::ObjectArchive),
            "remote-bucket" => Some(Self::RemoteBucket),
            "filesystem" => Some(Self::Filesystem),
            _ => None,
        }
    }
}

/// A source to index. `last_indexed_commit` is mutated only by the
/// orchestrator on successful completion of a git-sourced run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub project_id: ProjectId,
    pub source_type: SourceType,
    pub connection_uri: String,
    pub config: Value,
    pub last_indexed_commit: Option<String>,
    /// Opaque reference to a credential held elsewhere; never the secret
    /// itself.
    pub credential_ref: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_roundtrips() {
        for ty in [
            SourceType::Git,
            SourceType::ObjectArchive,
            SourceType::RemoteBucket,
            SourceType::Filesystem,
        ] {
            assert_eq!(SourceType::parse(ty.as_str()), Some(ty));
        }
    }
}
