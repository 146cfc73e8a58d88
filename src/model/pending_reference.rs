use crate::model::EdgeKind;
use crate::types::{ProjectId, RunId, SymbolId};
use serde::{Deserialize, Serialize};

/// Staging row for a raw reference whose target didn't resolve against the
/// referencing file's own symbols. Written by the persister (§4.7 step 4,
/// "cross-file references are the resolver's job"), consumed by the
/// resolver's reference pass (§4.8) during the same run's phase 2, then
/// cleared — same lifetime discipline as `ColumnReference` staging rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingReference {
    pub project_id: ProjectId,
    pub run_id: RunId,
    pub source_id: SymbolId,
    pub to_name: String,
    pub to_qualified: Option<String>,
    pub reference_type: EdgeKind,
    pub confidence_hint: Option<f64>,
}
