//! Embedder contract and a deterministic stand-in used
//! by tests and local runs in place of a real provider.

use sha2::{Digest, Sha256};

pub const EMBEDDING_DIMENSIONS: usize = 32;

/// `embed_batch` takes the purpose string (e.g. `"symbol"`) so a real
/// provider can route to different models per call site without a second
/// trait method.
pub trait Embedder: Send + Sync {
    fn embed_batch(&self, texts: &[String], purpose: &str) -> Vec<Vec<f32>>;

    fn model_version(&self) -> &str;
}

/// Builds a deterministic, content-derived vector from a SHA-256 hash of
/// the text (bytes mapped into `[-1.0, 1.0]`). Not semantically meaningful
/// — its purpose is to exercise the embed stage without an outbound RPC.
pub struct MockEmbedder {
    model_version: String,
}

impl MockEmbedder {
    pub fn new(model_version: impl Into<String>) -> Self {
        Self { model_version: model_version.into() }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new("mock-v1")
    }
}

impl Embedder for MockEmbedder {
    fn embed_batch(&self, texts: &[String], _purpose: &str) -> Vec<Vec<f32>> {
        texts
            .iter()
            .map(|text| {
                let digest = Sha256::digest(text.as_bytes());
                digest
                    .iter()
                    .cycle()
                    .take(EMBEDDING_DIMENSIONS)
                    .map(|byte| (*byte as f32 / 127.5) - 1.0)
                    .collect()
            })
            .collect()
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }
}

/// Builds the kind-specific textual representation the embed stage sends
/// to the embedder: a kind-specific textual representation of the symbol.
pub fn symbol_embedding_text(symbol: &crate::model::Symbol) -> String {
    let mut text = format!("{} {} ({})", symbol.kind.as_str(), symbol.qualified_name, symbol.language);
    if let Some(signature) = &symbol.signature {
        text.push_str(" :: ");
        text.push_str(signature);
    }
    if let Some(doc) = &symbol.doc_comment {
        text.push('\n');
        text.push_str(doc);
    }
    text
}
