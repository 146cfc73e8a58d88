//! Pass 3 — reference resolution: the seven-step match
//! cascade applied to every `pending_references` row left by Pass 2.

use super::bridges;
use super::imports::VisibleScopes;
use super::index::SymbolIndex;
use crate::error::StoreResult;
use crate::model::{EdgeKind, PendingReference, SymbolEdge};
use crate::store::SqliteStore;
use crate::types::ProjectId;

/// Tallies produced by one resolution pass, grouped by which cascade step
/// matched — mirrors the stats-struct shape the original indexing pipeline
/// uses to report its own per-stage counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub total_processed: usize,
    pub exact_fqn: usize,
    pub unique_in_scope: usize,
    pub unique_project_wide: usize,
    pub schema_defaulted: usize,
    pub cross_language_bridge: usize,
    pub ranked_suffix: usize,
    pub placeholder: usize,
}

impl ResolveStats {
    pub fn resolved(&self) -> usize {
        self.exact_fqn + self.unique_in_scope + self.unique_project_wide + self.schema_defaulted
            + self.cross_language_bridge + self.ranked_suffix
    }
}

/// Schema name prefixes tried, in order, when a bare reference has no
/// project-wide unique match and the source offers no configured default.
const SCHEMA_DEFAULT_PREFIXES: &[&str] = &["dbo", "public"];

pub fn resolve_pending(
    store: &SqliteStore,
    index: &SymbolIndex,
    scopes: &VisibleScopes,
    project_id: ProjectId,
    run_id: crate::types::RunId,
    schema_default: Option<&str>,
) -> StoreResult<ResolveStats> {
    let mut stats = ResolveStats::default();
    let pending = store.list_pending_references_for_run(run_id)?;

    for reference in pending.iter().filter(|p| p.reference_type != EdgeKind::Imports) {
        stats.total_processed += 1;
        resolve_one(store, index, scopes, project_id, reference, schema_default, &mut stats)?;
    }

    store.clear_pending_references_for_run(run_id)?;
    Ok(stats)
}

fn resolve_one(
    store: &SqliteStore,
    index: &SymbolIndex,
    scopes: &VisibleScopes,
    project_id: ProjectId,
    reference: &PendingReference,
    schema_default: Option<&str>,
    stats: &mut ResolveStats,
) -> StoreResult<()> {
    // Step 1: exact FQN match, confidence 1.0.
    if let Some(qualified) = &reference.to_qualified {
        let mut candidates = index.exact_fqn(qualified).to_vec();
        candidates.sort();
        if let Some(&target) = candidates.first() {
            emit(store, project_id, reference, target, 1.0)?;
            stats.exact_fqn += 1;
            return Ok(());
        }
    }

    // Step 2: unique short name within the referencing file's visible scope, 0.95.
    let Some(source_symbol) = index.symbol(reference.source_id) else { return Ok(()) };
    if let Some(visible) = scopes.get(&source_symbol.file_id) {
        let in_scope: Vec<_> = index
            .by_short_name(&reference.to_name)
            .iter()
            .copied()
            .filter(|id| visible.contains(id))
            .collect();
        if in_scope.len() == 1 {
            emit(store, project_id, reference, in_scope[0], 0.95)?;
            stats.unique_in_scope += 1;
            return Ok(());
        }
    }

    // Step 3: unique short name project-wide, 0.9.
    let project_wide = index.by_short_name(&reference.to_name);
    if project_wide.len() == 1 {
        emit(store, project_id, reference, project_wide[0], 0.9)?;
        stats.unique_project_wide += 1;
        return Ok(());
    }

    // Step 4: schema-defaulted FQN — try the source's configured default
    // schema, then the common fallbacks, 0.85.
    let prefixes = schema_default.into_iter().chain(SCHEMA_DEFAULT_PREFIXES.iter().copied());
    for prefix in prefixes {
        let candidate_fqn = format!("{prefix}.{}", reference.to_name);
        let mut candidates = index.exact_fqn(&candidate_fqn).to_vec();
        candidates.sort();
        if let Some(&target) = candidates.first() {
            emit(store, project_id, reference, target, 0.85)?;
            stats.schema_defaulted += 1;
            return Ok(());
        }
    }

    // Step 5a: cross-language bridge — app code naming a schema object by
    // bare name. Scored the same as a schema-defaulted FQN: no exact match
    // backs it, but a unique schema-object candidate is still strong
    // evidence.
    let bridge_matches = bridges::match_schema_object(index, &reference.to_name);
    if bridge_matches.len() == 1 {
        emit(store, project_id, reference, bridge_matches[0].id, 0.85)?;
        stats.cross_language_bridge += 1;
        return Ok(());
    }

    // Step 5b: HTTP route matching — a `calls_api` reference's target
    // (`"GET /api/users/{id}"`) against `api_endpoint` symbols whose
    // declared route is equivalent after placeholder-unification.
    if reference.reference_type == EdgeKind::CallsApi {
        let route_matches = bridges::match_route(index, &reference.to_name);
        if route_matches.len() == 1 {
            emit(store, project_id, reference, route_matches[0].id, 0.9)?;
            stats.cross_language_bridge += 1;
            return Ok(());
        }
    }

    // Step 5c: ORM binding inheritance — a read/write of a class mapped by
    // an `orm_mapping` symbol inherits that mapping's `binds_to` table.
    if let Some((target, confidence)) = bridges::resolve_orm_binding(store, index, project_id, source_symbol)? {
        emit(store, project_id, reference, target, confidence)?;
        stats.cross_language_bridge += 1;
        return Ok(());
    }

    // Step 6: ranked suffix match, confidence capped at 0.7.
    let suffix_matches = store.find_symbols_by_name_suffix(project_id, &reference.to_name)?;
    if let Some(best) = suffix_matches.first() {
        emit(store, project_id, reference, best.id, 0.7)?;
        stats.ranked_suffix += 1;
        return Ok(());
    }

    // Step 7: nothing matched — materialize a placeholder so the edge is
    // still queryable, at low confidence.
    let placeholder_id = store.create_placeholder_symbol(
        project_id,
        source_symbol.file_id,
        &reference.to_name,
        reference.to_qualified.as_deref().unwrap_or(&reference.to_name),
        &source_symbol.language,
    )?;
    emit(store, project_id, reference, placeholder_id, 0.3)?;
    stats.placeholder += 1;
    Ok(())
}

fn emit(
    store: &SqliteStore,
    project_id: ProjectId,
    reference: &PendingReference,
    target: crate::types::SymbolId,
    confidence: f64,
) -> StoreResult<()> {
    let edge = SymbolEdge::new(project_id, reference.source_id, target, reference.reference_type).with_confidence(confidence);
    store.insert_edge(&edge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SourceType, SymbolKind, Trigger};
    use crate::store::NewSymbol;
    use std::collections::HashMap;

    fn symbol(name: &str, qualified_name: &str, kind: SymbolKind) -> NewSymbol {
        NewSymbol {
            parent_index: None,
            kind,
            name: name.to_string(),
            qualified_name: qualified_name.to_string(),
            language: "sql".to_string(),
            start_line: 1,
            end_line: 1,
            start_col: None,
            end_col: None,
            signature: None,
            doc_comment: None,
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn unmatched_reference_becomes_a_low_confidence_placeholder() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = store.create_project("p", "P", "t", None, &serde_json::json!({})).unwrap();
        let source = store
            .create_source(project.id, SourceType::Filesystem, "/tmp", &serde_json::json!({}), None)
            .unwrap();
        let file = store.upsert_file(project.id, source.id, "a.sql", Some("sql"), 1, "h").unwrap();
        let ids = store
            .replace_file_symbols(project.id, file.id, &[symbol("GetUser", "GetUser", SymbolKind::Procedure)])
            .unwrap();

        let run = store.create_run(project.id, Some(source.id), Trigger::Manual).unwrap();
        store
            .insert_pending_reference(&PendingReference {
                project_id: project.id,
                run_id: run.id,
                source_id: ids[0],
                to_name: "GhostTable".to_string(),
                to_qualified: None,
                reference_type: EdgeKind::UsesTable,
                confidence_hint: None,
            })
            .unwrap();

        let index = SymbolIndex::build(&store, project.id).unwrap();
        let scopes: VisibleScopes = HashMap::new();
        let stats = resolve_pending(&store, &index, &scopes, project.id, run.id, None).unwrap();

        assert_eq!(stats.placeholder, 1);
        let edges = store.list_edges_from(ids[0]).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].confidence(), Some(0.3));
    }

    #[test]
    fn schema_default_prefix_breaks_a_short_name_tie() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = store.create_project("p", "P", "t", None, &serde_json::json!({})).unwrap();
        let source = store
            .create_source(project.id, SourceType::Filesystem, "/tmp", &serde_json::json!({}), None)
            .unwrap();
        let file = store.upsert_file(project.id, source.id, "a.sql", Some("sql"), 1, "h").unwrap();
        let ids = store
            .replace_file_symbols(
                project.id,
                file.id,
                &[
                    symbol("GetUser", "GetUser", SymbolKind::Procedure),
                    symbol("Users", "dbo.Users", SymbolKind::Table),
                    symbol("Users", "reporting.Users", SymbolKind::Table),
                ],
            )
            .unwrap();

        let run = store.create_run(project.id, Some(source.id), Trigger::Manual).unwrap();
        store
            .insert_pending_reference(&PendingReference {
                project_id: project.id,
                run_id: run.id,
                source_id: ids[0],
                to_name: "Users".to_string(),
                to_qualified: None,
                reference_type: EdgeKind::UsesTable,
                confidence_hint: None,
            })
            .unwrap();

        let index = SymbolIndex::build(&store, project.id).unwrap();
        let scopes: VisibleScopes = HashMap::new();
        let stats = resolve_pending(&store, &index, &scopes, project.id, run.id, None).unwrap();

        // Two "Users" tables make steps 2 and 3 ambiguous; the "dbo" default
        // breaks the tie deterministically.
        assert_eq!(stats.schema_defaulted, 1);
        let edges = store.list_edges_from(ids[0]).unwrap();
        assert_eq!(edges[0].target_id, ids[1]);
        assert_eq!(edges[0].confidence(), Some(0.85));
    }

    fn endpoint_symbol(name: &str, route: &str) -> NewSymbol {
        NewSymbol {
            parent_index: None,
            kind: SymbolKind::ApiEndpoint,
            name: name.to_string(),
            qualified_name: name.to_string(),
            language: "typescript".to_string(),
            start_line: 1,
            end_line: 1,
            start_col: None,
            end_col: None,
            signature: Some(route.to_string()),
            doc_comment: None,
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn calls_api_reference_route_matches_against_api_endpoint() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = store.create_project("p", "P", "t", None, &serde_json::json!({})).unwrap();
        let source = store
            .create_source(project.id, SourceType::Filesystem, "/tmp", &serde_json::json!({}), None)
            .unwrap();
        let caller_file = store.upsert_file(project.id, source.id, "client.ts", Some("typescript"), 1, "h1").unwrap();
        let server_file = store.upsert_file(project.id, source.id, "routes.ts", Some("typescript"), 1, "h2").unwrap();

        let caller_ids = store
            .replace_file_symbols(project.id, caller_file.id, &[symbol("fetchUser", "fetchUser", SymbolKind::Function)])
            .unwrap();
        store
            .replace_file_symbols(project.id, server_file.id, &[endpoint_symbol("getUser", "GET /api/users/{id}")])
            .unwrap();

        let run = store.create_run(project.id, Some(source.id), Trigger::Manual).unwrap();
        store
            .insert_pending_reference(&PendingReference {
                project_id: project.id,
                run_id: run.id,
                source_id: caller_ids[0],
                to_name: "GET /api/users/:id".to_string(),
                to_qualified: None,
                reference_type: EdgeKind::CallsApi,
                confidence_hint: None,
            })
            .unwrap();

        let index = SymbolIndex::build(&store, project.id).unwrap();
        let scopes: VisibleScopes = HashMap::new();
        let stats = resolve_pending(&store, &index, &scopes, project.id, run.id, None).unwrap();

        assert_eq!(stats.cross_language_bridge, 1);
        let edges = store.list_edges_from(caller_ids[0]).unwrap();
        assert_eq!(edges[0].kind, EdgeKind::CallsApi);
        assert_eq!(edges[0].confidence(), Some(0.9));
    }

    #[test]
    fn orm_mapped_column_read_inherits_the_mapping_binds_to_table() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = store.create_project("p", "P", "t", None, &serde_json::json!({})).unwrap();
        let source = store
            .create_source(project.id, SourceType::Filesystem, "/tmp", &serde_json::json!({}), None)
            .unwrap();
        let schema_file = store.upsert_file(project.id, source.id, "create_users.sql", Some("sql"), 1, "h1").unwrap();
        let app_file = store.upsert_file(project.id, source.id, "UserMapping.cs", Some("csharp"), 1, "h2").unwrap();

        let table_ids = store
            .replace_file_symbols(project.id, schema_file.id, &[symbol("Users", "dbo.Users", SymbolKind::Table)])
            .unwrap();

        let ids = store
            .replace_file_symbols(
                project.id,
                app_file.id,
                &[
                    NewSymbol {
                        parent_index: None,
                        kind: SymbolKind::OrmMapping,
                        name: "Users".to_string(),
                        qualified_name: "Users".to_string(),
                        language: "csharp".to_string(),
                        start_line: 1,
                        end_line: 1,
                        start_col: None,
                        end_col: None,
                        signature: None,
                        doc_comment: None,
                        metadata: serde_json::json!({}),
                    },
                    NewSymbol {
                        parent_index: Some(0),
                        kind: SymbolKind::Column,
                        name: "Email".to_string(),
                        qualified_name: "Users.Email".to_string(),
                        language: "csharp".to_string(),
                        start_line: 2,
                        end_line: 2,
                        start_col: None,
                        end_col: None,
                        signature: None,
                        doc_comment: None,
                        metadata: serde_json::json!({}),
                    },
                ],
            )
            .unwrap();
        let column_id = ids[1];

        let run = store.create_run(project.id, Some(source.id), Trigger::Manual).unwrap();
        store
            .insert_pending_reference(&PendingReference {
                project_id: project.id,
                run_id: run.id,
                source_id: column_id,
                // A name that would otherwise be a placeholder: nothing in
                // the project is actually named "SomeUnrelatedAlias".
                to_name: "SomeUnrelatedAlias".to_string(),
                to_qualified: None,
                reference_type: EdgeKind::ReadsFrom,
                confidence_hint: None,
            })
            .unwrap();

        let index = SymbolIndex::build(&store, project.id).unwrap();
        let scopes: VisibleScopes = HashMap::new();
        let stats = resolve_pending(&store, &index, &scopes, project.id, run.id, None).unwrap();

        assert_eq!(stats.cross_language_bridge, 1);
        let edges = store.list_edges_from(column_id).unwrap();
        assert_eq!(edges[0].kind, EdgeKind::ReadsFrom);
        assert_eq!(edges[0].target_id, table_ids[0]);
        assert_eq!(edges[0].confidence(), Some(0.9));
    }
}
