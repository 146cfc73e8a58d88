use crate::types::{ProjectId, RunId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDerivation {
    DirectCopy,
    Transform,
    Aggregate,
    Filter,
    Join,
    Conditional,
}

impl ColumnDerivation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectCopy => "direct_copy",
            Self::Transform => "transform",
            Self::Aggregate => "aggregate",
            Self::Filter => "filter",
            Self::Join => "join",
            Self::Conditional => "conditional",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "direct_copy" => Some(Self::DirectCopy),
            "transform" => Some(Self::Transform),
            "aggregate" => Some(Self::Aggregate),
            "filter" => Some(Self::Filter),
            "join" => Some(Self::Join),
            "conditional" => Some(Self::Conditional),
            _ => None,
        }
    }
}

/// Staging row, owned for the lifetime of a single index-run.
/// Written by parse workers, consumed and deleted by the lineage step of
/// the resolver during the same run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnReference {
    pub project_id: ProjectId,
    pub run_id: RunId,
    pub source_column_fqn: String,
    pub target_column_fqn: String,
    pub derivation: ColumnDerivation,
    pub expression: Option<String>,
    pub containing_symbol_fqn: Option<String>,
    pub line: Option<u32>,
}
