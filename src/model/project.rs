use crate::types::ProjectId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A project groups one or more sources under a single slug. Mutated only
/// by the API layer; the pipeline only reads `settings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub slug: String,
    pub name: String,
    pub tenant_id: String,
    pub description: Option<String>,
    pub settings: Value,
}

impl Project {
    pub fn project_settings(&self) -> crate::config::ProjectSettings {
        serde_json::from_value(self.settings.clone()).unwrap_or_default()
    }
}
