use crate::types::{ProjectId, RunId, SourceId};

/// Identifies the run a pipeline stage is operating on. Cheap to pass by
/// value; stages that need more (the `Project`/`Source` rows themselves)
/// look them up from the store with the ids this carries.
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    pub project_id: ProjectId,
    pub run_id: RunId,
    pub source_id: Option<SourceId>,
}
