//! Embed stage: computes vectors for symbols that don't
//! have one yet, one file's worth of symbols at a time so a single huge
//! project doesn't force one unbounded batch through the embedder.

use crate::embedder::{symbol_embedding_text, Embedder};
use crate::error::StoreResult;
use crate::model::SymbolEmbedding;
use crate::store::SqliteStore;
use crate::types::ProjectId;
use sha2::{Digest, Sha256};

pub fn embed_project(store: &SqliteStore, embedder: &dyn Embedder, project_id: ProjectId) -> StoreResult<usize> {
    let mut embedded = 0;
    for file in store.list_files_for_project(project_id)? {
        let states = store.symbols_with_embedding_state(file.id)?;
        if states.is_empty() {
            continue;
        }

        let symbols: Vec<_> = states.iter().map(|s| store.get_symbol(s.symbol_id)).collect::<StoreResult<_>>()?;

        let mut stale_symbols = Vec::new();
        let mut stale_texts = Vec::new();
        let mut stale_hashes = Vec::new();
        for (state, symbol) in states.iter().zip(&symbols) {
            let text = symbol_embedding_text(symbol);
            let hash = format!("{:x}", Sha256::digest(text.as_bytes()));
            let up_to_date =
                state.content_hash.as_deref() == Some(hash.as_str()) && state.model_version.as_deref() == Some(embedder.model_version());
            if up_to_date {
                continue;
            }
            stale_symbols.push(symbol);
            stale_texts.push(text);
            stale_hashes.push(hash);
        }
        if stale_symbols.is_empty() {
            continue;
        }

        let vectors = embedder.embed_batch(&stale_texts, "symbol");

        for ((symbol, hash), vector) in stale_symbols.iter().zip(stale_hashes).zip(vectors) {
            store.upsert_embedding(&SymbolEmbedding {
                symbol_id: symbol.id,
                vector,
                content_hash: hash,
                model_version: embedder.model_version().to_string(),
            })?;
            embedded += 1;
        }
    }
    Ok(embedded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::MockEmbedder;
    use crate::model::{SourceType, SymbolKind};
    use crate::store::NewSymbol;

    fn seed_one_symbol(store: &SqliteStore) -> (ProjectId, crate::types::SymbolId) {
        let project = store.create_project("p", "P", "t", None, &serde_json::json!({})).unwrap();
        let source = store.create_source(project.id, SourceType::Filesystem, "/tmp", &serde_json::json!({}), None).unwrap();
        let file = store.upsert_file(project.id, source.id, "users.sql", Some("sql"), 10, "h").unwrap();
        let ids = store
            .replace_file_symbols(
                project.id,
                file.id,
                &[NewSymbol {
                    parent_index: None,
                    kind: SymbolKind::Table,
                    name: "Users".to_string(),
                    qualified_name: "dbo.Users".to_string(),
                    language: "sql".to_string(),
                    start_line: 1,
                    end_line: 1,
                    start_col: None,
                    end_col: None,
                    signature: None,
                    doc_comment: None,
                    metadata: serde_json::json!({}),
                }],
            )
            .unwrap();
        (project.id, ids[0])
    }

    #[test]
    fn embeds_symbols_with_no_existing_embedding() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (project_id, symbol_id) = seed_one_symbol(&store);
        let embedder = MockEmbedder::default();

        let embedded = embed_project(&store, &embedder, project_id).unwrap();
        assert_eq!(embedded, 1);
        assert!(store.get_embedding(symbol_id).unwrap().is_some());
    }

    #[test]
    fn skips_symbols_whose_embedding_is_already_current() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (project_id, _symbol_id) = seed_one_symbol(&store);
        let embedder = MockEmbedder::default();

        embed_project(&store, &embedder, project_id).unwrap();
        let second_pass = embed_project(&store, &embedder, project_id).unwrap();
        assert_eq!(second_pass, 0);
    }

    #[test]
    fn rembeds_when_model_version_changes_even_if_symbol_text_is_unchanged() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (project_id, symbol_id) = seed_one_symbol(&store);

        embed_project(&store, &MockEmbedder::default(), project_id).unwrap();
        let before = store.get_embedding(symbol_id).unwrap().unwrap();

        let newer = MockEmbedder::new("mock-v2");
        let embedded = embed_project(&store, &newer, project_id).unwrap();
        assert_eq!(embedded, 1);

        let after = store.get_embedding(symbol_id).unwrap().unwrap();
        assert_eq!(after.model_version, "mock-v2");
        assert_ne!(before.model_version, after.model_version);
    }
}
