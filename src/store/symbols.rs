use super::SqliteStore;
use crate::error::{StoreError, StoreResult};
use crate::model::{Symbol, SymbolKind};
use crate::types::{FileId, ProjectId, SymbolId};
use rusqlite::{params, Row};

/// A symbol as produced by a parser, before it has been assigned an id.
/// `parent_index` refers to another `NewSymbol`'s position within the same
/// batch (resolved to a real `SymbolId` during insertion), since a parser
/// emits a file's symbol tree in one shot.
#[derive(Debug, Clone)]
pub struct NewSymbol {
    pub parent_index: Option<usize>,
    pub kind: SymbolKind,
    pub name: String,
    pub qualified_name: String,
    pub language: String,
    pub start_line: u32,
    pub end_line: u32,
    pub start_col: Option<u16>,
    pub end_col: Option<u16>,
    pub signature: Option<String>,
    pub doc_comment: Option<String>,
    pub metadata: serde_json::Value,
}

fn row_to_symbol(row: &Row) -> rusqlite::Result<Symbol> {
    let kind: String = row.get("kind")?;
    let metadata_json: String = row.get("metadata")?;
    let parent_id: Option<i64> = row.get("parent_id")?;
    Ok(Symbol {
        id: SymbolId::new(row.get("id")?),
        project_id: ProjectId::new(row.get("project_id")?),
        file_id: FileId::new(row.get("file_id")?),
        parent_id: parent_id.map(SymbolId::new),
        kind: SymbolKind::parse(&kind).unwrap_or(SymbolKind::Unknown),
        name: row.get("name")?,
        qualified_name: row.get("qualified_name")?,
        language: row.get("language")?,
        start_line: row.get::<_, i64>("start_line")? as u32,
        end_line: row.get::<_, i64>("end_line")? as u32,
        start_col: row.get::<_, Option<i64>>("start_col")?.map(|v| v as u16),
        end_col: row.get::<_, Option<i64>>("end_col")?.map(|v| v as u16),
        signature: row.get("signature")?,
        doc_comment: row.get("doc_comment")?,
        metadata: serde_json::from_str(&metadata_json).unwrap_or(serde_json::json!({})),
    })
}

impl SqliteStore {
    /// Deletes a file's current symbols (cascading to their edges) and
    /// inserts `symbols` in their place, resolving `parent_index` links as
    /// it goes. A file's symbols are always rewritten wholesale, never diffed.
    pub fn replace_file_symbols(
        &self,
        project_id: ProjectId,
        file_id: FileId,
        symbols: &[NewSymbol],
    ) -> StoreResult<Vec<SymbolId>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM symbols WHERE file_id = ?1", params![file_id.value()])?;

        let mut ids = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let parent_id = symbol
                .parent_index
                .map(|idx| ids.get(idx).copied().ok_or(StoreError::SymbolNotFound(SymbolId::new(0))))
                .transpose()?;
            tx.execute(
                "INSERT INTO symbols
                    (project_id, file_id, parent_id, kind, name, qualified_name, language,
                     start_line, end_line, start_col, end_col, signature, doc_comment, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    project_id.value(),
                    file_id.value(),
                    parent_id.map(|id: SymbolId| id.value()),
                    symbol.kind.as_str(),
                    symbol.name,
                    symbol.qualified_name,
                    symbol.language,
                    symbol.start_line,
                    symbol.end_line,
                    symbol.start_col,
                    symbol.end_col,
                    symbol.signature,
                    symbol.doc_comment,
                    symbol.metadata.to_string(),
                ],
            )?;
            ids.push(SymbolId::new(tx.last_insert_rowid()));
        }
        tx.commit()?;
        Ok(ids)
    }

    pub fn get_symbol(&self, id: SymbolId) -> StoreResult<Symbol> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, project_id, file_id, parent_id, kind, name, qualified_name, language,
                    start_line, end_line, start_col, end_col, signature, doc_comment, metadata
             FROM symbols WHERE id = ?1",
            params![id.value()],
            row_to_symbol,
        )
        .map_err(|_| StoreError::SymbolNotFound(id))
    }

    pub fn list_symbols_for_file(&self, file_id: FileId) -> StoreResult<Vec<Symbol>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, file_id, parent_id, kind, name, qualified_name, language,
                    start_line, end_line, start_col, end_col, signature, doc_comment, metadata
             FROM symbols WHERE file_id = ?1",
        )?;
        let rows = stmt.query_map(params![file_id.value()], row_to_symbol)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// All of a project's symbols — GraphBuild's and the embed stage's
    /// work list.
    pub fn list_symbols_for_project(&self, project_id: ProjectId) -> StoreResult<Vec<Symbol>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, file_id, parent_id, kind, name, qualified_name, language,
                    start_line, end_line, start_col, end_col, signature, doc_comment, metadata
             FROM symbols WHERE project_id = ?1",
        )?;
        let rows = stmt.query_map(params![project_id.value()], row_to_symbol)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Candidate symbols by qualified name within a project, ranked by the
    /// resolver's confidence logic — the store only filters,
    /// it does not rank.
    pub fn find_symbols_by_qualified_name(
        &self,
        project_id: ProjectId,
        qualified_name: &str,
    ) -> StoreResult<Vec<Symbol>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, file_id, parent_id, kind, name, qualified_name, language,
                    start_line, end_line, start_col, end_col, signature, doc_comment, metadata
             FROM symbols WHERE project_id = ?1 AND qualified_name = ?2
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![project_id.value(), qualified_name], row_to_symbol)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Inserts a single placeholder row (`kind = unknown`) standing in for a
    /// reference that never resolved to a real symbol.
    /// Unlike `replace_file_symbols`, this never touches the rest of the
    /// file's symbols — placeholders accumulate independently of reparses.
    pub fn create_placeholder_symbol(
        &self,
        project_id: ProjectId,
        file_id: FileId,
        name: &str,
        qualified_name: &str,
        language: &str,
    ) -> StoreResult<SymbolId> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO symbols
                (project_id, file_id, parent_id, kind, name, qualified_name, language,
                 start_line, end_line, start_col, end_col, signature, doc_comment, metadata)
             VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6, 0, 0, NULL, NULL, NULL, NULL, '{}')",
            params![project_id.value(), file_id.value(), SymbolKind::Unknown.as_str(), name, qualified_name, language],
        )?;
        Ok(SymbolId::new(conn.last_insert_rowid()))
    }

    /// Merges `patch`'s keys into a symbol's existing metadata object —
    /// used by the analytics stage to write `pagerank`/`layer` (spec.md §3)
    /// onto each symbol without disturbing whatever a parser already put
    /// there.
    pub fn merge_symbol_metadata(&self, id: SymbolId, patch: &serde_json::Value) -> StoreResult<()> {
        let mut symbol = self.get_symbol(id)?;
        if let (serde_json::Value::Object(current), serde_json::Value::Object(incoming)) = (&mut symbol.metadata, patch) {
            for (key, value) in incoming {
                current.insert(key.clone(), value.clone());
            }
        }
        let conn = self.conn()?;
        conn.execute(
            "UPDATE symbols SET metadata = ?1 WHERE id = ?2",
            params![symbol.metadata.to_string(), id.value()],
        )?;
        Ok(())
    }

    /// Suffix match on qualified name (e.g. unqualified call `foo()`
    /// resolving against `Module.Class.foo`), used by the resolver's
    /// reference pass when an exact match fails.
    pub fn find_symbols_by_name_suffix(&self, project_id: ProjectId, name: &str) -> StoreResult<Vec<Symbol>> {
        let conn = self.conn()?;
        let pattern = format!("%.{name}");
        let mut stmt = conn.prepare(
            "SELECT id, project_id, file_id, parent_id, kind, name, qualified_name, language,
                    start_line, end_line, start_col, end_col, signature, doc_comment, metadata
             FROM symbols
             WHERE project_id = ?1 AND (qualified_name = ?2 OR qualified_name LIKE ?3)
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![project_id.value(), name, pattern], row_to_symbol)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceType;

    fn seed_file(store: &SqliteStore) -> (ProjectId, FileId) {
        let project = store.create_project("p", "P", "t", None, &serde_json::json!({})).unwrap();
        let source = store
            .create_source(project.id, SourceType::Filesystem, "/tmp", &serde_json::json!({}), None)
            .unwrap();
        let file = store
            .upsert_file(project.id, source.id, "a.rs", Some("rust"), 10, "h")
            .unwrap();
        (project.id, file.id)
    }

    fn sample_symbol(name: &str, parent_index: Option<usize>) -> NewSymbol {
        NewSymbol {
            parent_index,
            kind: SymbolKind::Function,
            name: name.to_string(),
            qualified_name: name.to_string(),
            language: "rust".to_string(),
            start_line: 1,
            end_line: 2,
            start_col: None,
            end_col: None,
            signature: None,
            doc_comment: None,
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn replace_file_symbols_links_parent_index() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (project_id, file_id) = seed_file(&store);

        let batch = vec![sample_symbol("Outer", None), sample_symbol("Outer.inner", Some(0))];
        let ids = store.replace_file_symbols(project_id, file_id, &batch).unwrap();

        let child = store.get_symbol(ids[1]).unwrap();
        assert_eq!(child.parent_id, Some(ids[0]));
    }

    #[test]
    fn replace_file_symbols_is_wholesale() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (project_id, file_id) = seed_file(&store);

        store
            .replace_file_symbols(project_id, file_id, &[sample_symbol("old", None)])
            .unwrap();
        store
            .replace_file_symbols(project_id, file_id, &[sample_symbol("new", None)])
            .unwrap();

        let remaining = store.list_symbols_for_file(file_id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "new");
    }

    #[test]
    fn merge_symbol_metadata_adds_keys_without_clobbering_others() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (project_id, file_id) = seed_file(&store);
        let mut symbol = sample_symbol("foo", None);
        symbol.metadata = serde_json::json!({"existing": true});
        let ids = store.replace_file_symbols(project_id, file_id, &[symbol]).unwrap();

        store.merge_symbol_metadata(ids[0], &serde_json::json!({"pagerank": 0.42, "layer": "business"})).unwrap();

        let refreshed = store.get_symbol(ids[0]).unwrap();
        assert_eq!(refreshed.metadata["existing"], true);
        assert_eq!(refreshed.metadata["pagerank"], 0.42);
        assert_eq!(refreshed.metadata["layer"], "business");
    }

    #[test]
    fn find_by_name_suffix_matches_unqualified_call() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (project_id, file_id) = seed_file(&store);
        let mut symbol = sample_symbol("Module.Class.foo", None);
        symbol.name = "foo".to_string();
        store.replace_file_symbols(project_id, file_id, &[symbol]).unwrap();

        let matches = store.find_symbols_by_name_suffix(project_id, "foo").unwrap();
        assert_eq!(matches.len(), 1);
    }
}
