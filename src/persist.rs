//! Symbol persister: turns one file's [`ParseResult`]
//! into store writes. Runs inside a parse worker, once per file in a chunk.

use crate::error::StoreResult;
use crate::model::{ColumnReference, PendingReference, SymbolEdge};
use crate::parsers::{ParseResult, ParsedSymbol, RawReference};
use crate::store::{NewSymbol, SqliteStore};
use crate::types::{FileId, ProjectId, RunId};
use std::collections::HashMap;

/// Flattens a parser's symbol tree (with nested `children`) into an
/// insertion-ordered batch of [`NewSymbol`] rows, each with `parent_index`
/// pointing back into the same batch — the shape `replace_file_symbols`
/// expects. Also returns a qualified-name → batch-index map for resolving
/// this file's own `RawReference`s without a round trip to the store.
fn flatten(symbols: &[ParsedSymbol]) -> (Vec<NewSymbol>, HashMap<String, usize>) {
    let mut batch = Vec::new();
    let mut index_by_qname = HashMap::new();

    fn walk(node: &ParsedSymbol, parent_index: Option<usize>, batch: &mut Vec<NewSymbol>, index_by_qname: &mut HashMap<String, usize>) {
        let idx = batch.len();
        batch.push(NewSymbol {
            parent_index,
            kind: node.kind,
            name: node.name.clone(),
            qualified_name: node.qualified_name.clone(),
            language: node.language.clone(),
            start_line: node.start_line,
            end_line: node.end_line,
            start_col: node.start_col,
            end_col: node.end_col,
            signature: node.signature.clone(),
            doc_comment: node.doc_comment.clone(),
            metadata: serde_json::json!({}),
        });
        index_by_qname.insert(node.qualified_name.clone(), idx);
        for child in &node.children {
            walk(child, Some(idx), batch, index_by_qname);
        }
    }

    for root in symbols {
        walk(root, None, &mut batch, &mut index_by_qname);
    }
    (batch, index_by_qname)
}

/// Resolves one reference against this file's own symbols only. Anything
/// that doesn't resolve here is left for the cross-file resolver passes —
/// this function never errors on an unresolved name, it just skips it.
fn resolve_local(reference: &RawReference, index_by_qname: &HashMap<String, usize>, ids: &[crate::types::SymbolId]) -> Option<crate::types::SymbolId> {
    let qname = reference.to_qualified.as_deref()?;
    index_by_qname.get(qname).map(|idx| ids[*idx])
}

/// Persists one file's parse output: rewrites its symbols wholesale,
/// inserts whatever edges resolve against symbols already known (same file
/// or elsewhere in the project), and stages whatever column references the
/// parser produced. The caller (the parse worker) is responsible for
/// classifying migration/schema files and setting
/// `FileInput::skip_column_lineage` before parsing — by the time a
/// [`ParseResult`] reaches this function, that decision has already been
/// made, so `parsed.column_references` is simply empty for a skipped file.
pub fn persist_file(
    store: &SqliteStore,
    project_id: ProjectId,
    run_id: RunId,
    file_id: FileId,
    parsed: &ParseResult,
) -> StoreResult<PersistOutcome> {
    let (batch, index_by_qname) = flatten(&parsed.symbols);
    let symbol_count = batch.len();
    let ids = store.replace_file_symbols(project_id, file_id, &batch)?;

    let from_id_by_qname: HashMap<&str, crate::types::SymbolId> =
        index_by_qname.iter().map(|(qname, idx)| (qname.as_str(), ids[*idx])).collect();

    let mut edges_created = 0;
    for reference in &parsed.references {
        let Some(source_id) = reference.from_symbol_qname.as_deref().and_then(|q| from_id_by_qname.get(q)).copied() else {
            continue;
        };
        match resolve_local(reference, &index_by_qname, &ids) {
            Some(target_id) => {
                let mut edge = SymbolEdge::new(project_id, source_id, target_id, reference.reference_type);
                if let Some(confidence) = reference.confidence {
                    edge = edge.with_confidence(confidence);
                }
                store.insert_edge(&edge)?;
                edges_created += 1;
            }
            None => {
                // Doesn't resolve within this file — leave it for the
                // resolver's cross-file passes.
                store.insert_pending_reference(&PendingReference {
                    project_id,
                    run_id,
                    source_id,
                    to_name: reference.to_name.clone(),
                    to_qualified: reference.to_qualified.clone(),
                    reference_type: reference.reference_type,
                    confidence_hint: reference.confidence,
                })?;
            }
        }
    }

    for column_ref in &parsed.column_references {
        store.insert_column_reference(&ColumnReference {
            project_id,
            run_id,
            source_column_fqn: column_ref.source_column_fqn.clone(),
            target_column_fqn: column_ref.target_column_fqn.clone(),
            derivation: column_ref.derivation,
            expression: column_ref.expression.clone(),
            containing_symbol_fqn: column_ref.context_fqn.clone(),
            line: column_ref.line,
        })?;
    }

    Ok(PersistOutcome { symbol_count, edges_created })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PersistOutcome {
    pub symbol_count: usize,
    pub edges_created: usize,
}
