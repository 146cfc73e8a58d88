//! Pass 1 — project-wide symbol index.

use crate::model::Symbol;
use crate::store::SqliteStore;
use crate::types::{ProjectId, SymbolId};
use std::collections::HashMap;

/// Lookup maps keyed by (a) exact FQN, (b) short name, (c) case-folded
/// short name, each pointing at every matching symbol id — ties are left
/// unresolved here; Pass 3 breaks them deterministically by ascending id.
pub struct SymbolIndex {
    by_fqn: HashMap<String, Vec<SymbolId>>,
    by_name: HashMap<String, Vec<SymbolId>>,
    by_name_casefold: HashMap<String, Vec<SymbolId>>,
    symbols: HashMap<SymbolId, Symbol>,
}

impl SymbolIndex {
    pub fn build(store: &SqliteStore, project_id: ProjectId) -> crate::error::StoreResult<Self> {
        let all = store.list_symbols_for_project(project_id)?;
        let mut by_fqn: HashMap<String, Vec<SymbolId>> = HashMap::new();
        let mut by_name: HashMap<String, Vec<SymbolId>> = HashMap::new();
        let mut by_name_casefold: HashMap<String, Vec<SymbolId>> = HashMap::new();
        let mut symbols = HashMap::new();

        for symbol in all {
            by_fqn.entry(symbol.qualified_name.clone()).or_default().push(symbol.id);
            by_name.entry(symbol.name.clone()).or_default().push(symbol.id);
            by_name_casefold.entry(symbol.name.to_lowercase()).or_default().push(symbol.id);
            symbols.insert(symbol.id, symbol);
        }
        for ids in by_fqn.values_mut().chain(by_name.values_mut()).chain(by_name_casefold.values_mut()) {
            ids.sort();
        }
        Ok(Self { by_fqn, by_name, by_name_casefold, symbols })
    }

    pub fn exact_fqn(&self, fqn: &str) -> &[SymbolId] {
        self.by_fqn.get(fqn).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn by_short_name(&self, name: &str) -> &[SymbolId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn by_short_name_casefold(&self, name: &str) -> &[SymbolId] {
        self.by_name_casefold.get(&name.to_lowercase()).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    pub fn all_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SourceType, SymbolKind};
    use crate::store::NewSymbol;

    #[test]
    fn indexes_by_fqn_and_short_name() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = store.create_project("p", "P", "t", None, &serde_json::json!({})).unwrap();
        let source = store
            .create_source(project.id, SourceType::Filesystem, "/tmp", &serde_json::json!({}), None)
            .unwrap();
        let file = store.upsert_file(project.id, source.id, "a.sql", Some("sql"), 1, "h").unwrap();
        store
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

        let index = SymbolIndex::build(&store, project.id).unwrap();
        assert_eq!(index.exact_fqn("dbo.Users").len(), 1);
        assert_eq!(index.by_short_name("Users").len(), 1);
        assert_eq!(index.by_short_name_casefold("users").len(), 1);
    }
}
