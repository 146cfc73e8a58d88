use crate::types::SymbolId;
use serde::{Deserialize, Serialize};

/// PK is `symbol_id`; absence means "needs (re-)embedding".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEmbedding {
    pub symbol_id: SymbolId,
    pub vector: Vec<f32>,
    pub content_hash: String,
    pub model_version: String,
}
