//! Pass 2 — import resolution.
//!
//! Resolves each file's import/using/uses raw references (staged as
//! [`PendingReference`]s of kind [`EdgeKind::Imports`]) to a concrete
//! module/namespace/unit symbol, then builds a per-file "visible symbols"
//! scope: the file's own symbols plus every symbol nested under an
//! imported scope.

use super::index::SymbolIndex;
use crate::error::StoreResult;
use crate::model::{EdgeKind, PendingReference, SymbolEdge};
use crate::store::SqliteStore;
use crate::types::{FileId, SymbolId};
use std::collections::{HashMap, HashSet};

/// Per-file set of symbol ids visible for short-name resolution: the
/// file's own symbols plus everything nested under its resolved imports.
pub type VisibleScopes = HashMap<FileId, HashSet<SymbolId>>;

/// Runs Pass 2 against every `Imports`-kind pending reference of the run,
/// and seeds `scopes` with each file's own symbols so Pass 3 doesn't need
/// a second project scan to start from "the file itself".
pub fn build_visible_scopes(
    store: &SqliteStore,
    index: &SymbolIndex,
    run_id: crate::types::RunId,
    project_id: crate::types::ProjectId,
) -> StoreResult<VisibleScopes> {
    let mut scopes: VisibleScopes = HashMap::new();
    for symbol in index.all_symbols() {
        scopes.entry(symbol.file_id).or_default().insert(symbol.id);
    }

    let pending = store.list_pending_references_for_run(run_id)?;
    let imports: Vec<&PendingReference> = pending.iter().filter(|p| p.reference_type == EdgeKind::Imports).collect();

    for import in imports {
        let Some(source_symbol) = index.symbol(import.source_id) else { continue };
        let file_id = source_symbol.file_id;

        let target = resolve_import_target(index, import);
        let Some((module_id, confidence)) = target else { continue };

        scopes.entry(file_id).or_default().insert(module_id);
        for candidate in index.all_symbols() {
            if is_nested_under(index, candidate.id, module_id) {
                scopes.entry(file_id).or_default().insert(candidate.id);
            }
        }

        let edge = SymbolEdge::new(project_id, import.source_id, module_id, EdgeKind::Imports).with_confidence(confidence);
        store.insert_edge(&edge)?;
    }

    Ok(scopes)
}

fn resolve_import_target(index: &SymbolIndex, import: &PendingReference) -> Option<(SymbolId, f64)> {
    if let Some(fqn) = &import.to_qualified {
        if let Some(&id) = index.exact_fqn(fqn).first() {
            return Some((id, 1.0));
        }
    }
    let candidates = index.by_short_name(&import.to_name);
    if candidates.len() == 1 {
        return Some((candidates[0], 0.95));
    }
    None
}

/// A symbol is "nested under" a module if its qualified name is prefixed
/// by the module's qualified name plus a dot separator.
fn is_nested_under(index: &SymbolIndex, candidate: SymbolId, module: SymbolId) -> bool {
    let Some(candidate_symbol) = index.symbol(candidate) else { return false };
    let Some(module_symbol) = index.symbol(module) else { return false };
    let prefix = format!("{}.", module_symbol.qualified_name);
    candidate_symbol.qualified_name.starts_with(&prefix)
}
