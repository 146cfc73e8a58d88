//! Pass 4 — cross-language bridges.
//!
//! App-code references that name a database object by short name only
//! (inline SQL string literals, ORM mappings) don't carry a qualified name
//! the way an intra-SQL reference does — there's no `dbo.` or `public.` to
//! default to, because the reference isn't SQL at all. This pass matches
//! them against schema-object symbols by bare name.

use super::index::SymbolIndex;
use crate::error::StoreResult;
use crate::model::{EdgeKind, Symbol, SymbolEdge, SymbolKind};
use crate::store::SqliteStore;
use crate::types::{ProjectId, SymbolId};

/// Kinds a bridge reference may land on: tables, views and procedures are
/// the targets app code actually touches from outside the schema.
fn is_schema_object(kind: SymbolKind) -> bool {
    matches!(kind, SymbolKind::Table | SymbolKind::View | SymbolKind::MaterializedView | SymbolKind::Procedure)
}

/// Finds schema-object candidates for a bare name, case-insensitively —
/// app code rarely matches a database's declared casing exactly.
pub fn match_schema_object<'a>(index: &'a SymbolIndex, name: &str) -> Vec<&'a Symbol> {
    index
        .by_short_name_casefold(name)
        .iter()
        .filter_map(|id| index.symbol(*id))
        .filter(|s| is_schema_object(s.kind))
        .collect()
}

/// Splits a `calls_api` reference's target (`"GET /api/users/{id}"`) into
/// its method and route. A target with no recognizable HTTP verb is
/// treated as a bare route with no method constraint.
fn split_method_and_route(target: &str) -> (Option<&str>, &str) {
    match target.split_once(char::is_whitespace) {
        Some((method, route)) if method.chars().all(|c| c.is_ascii_alphabetic()) => (Some(method), route.trim()),
        _ => (None, target.trim()),
    }
}

/// Matches a `calls_api` reference's target against `api_endpoint` symbols
/// whose declared route (their `signature`, e.g. `"GET /api/users/{id}"`)
/// is equivalent after placeholder-unification — `{id}`, `:id` and `{*}`
/// all compare equal, and a caller's method must match when the endpoint
/// declares one.
pub fn match_route<'a>(index: &'a SymbolIndex, target: &str) -> Vec<&'a Symbol> {
    let (caller_method, caller_route) = split_method_and_route(target);
    let caller_route = normalize_route(caller_route);

    index
        .all_symbols()
        .filter(|s| s.kind == SymbolKind::ApiEndpoint)
        .filter(|s| {
            let Some(signature) = &s.signature else { return false };
            let (endpoint_method, endpoint_route) = split_method_and_route(signature);
            normalize_route(endpoint_route) == caller_route
                && match (caller_method, endpoint_method) {
                    (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                    _ => true,
                }
        })
        .collect()
}

/// Walks a symbol's `parent_id` chain (itself included) looking for the
/// nearest enclosing `orm_mapping` symbol — the declaration that maps a
/// class onto a table.
fn enclosing_orm_mapping<'a>(index: &'a SymbolIndex, symbol: &'a Symbol) -> Option<&'a Symbol> {
    let mut current = Some(symbol);
    while let Some(s) = current {
        if s.kind == SymbolKind::OrmMapping {
            return Some(s);
        }
        current = s.parent_id.and_then(|id| index.symbol(id));
    }
    None
}

/// Ensures an `orm_mapping` symbol has a `binds_to` edge to the table it
/// maps, matching the mapping's own name against schema objects the same
/// way a bare cross-language reference would (§4.8a). Returns the bound
/// table, creating the edge on first observation and reusing it on every
/// later lookup — `insert_edge`'s (source, target, kind) uniqueness makes
/// the second insert a no-op.
fn ensure_orm_binding(
    store: &SqliteStore,
    index: &SymbolIndex,
    project_id: ProjectId,
    mapping: &Symbol,
) -> StoreResult<Option<SymbolId>> {
    let candidates = match_schema_object(index, &mapping.name);
    let Some(table) = candidates.first() else { return Ok(None) };
    store.insert_edge(&SymbolEdge::new(project_id, mapping.id, table.id, EdgeKind::BindsTo).with_confidence(0.9))?;
    Ok(Some(table.id))
}

/// Resolves a reference whose source is a member of (or is itself) an
/// `orm_mapping`-mapped class by inheriting that mapping's bound table —
/// "`orm_mapping` symbols carry a `binds_to` edge to their table; inherited
/// by all reads/writes of the mapped class." Confidence is capped below an
/// exact-FQN match, same as every other bridge rule.
pub fn resolve_orm_binding(
    store: &SqliteStore,
    index: &SymbolIndex,
    project_id: ProjectId,
    source: &Symbol,
) -> StoreResult<Option<(SymbolId, f64)>> {
    let Some(mapping) = enclosing_orm_mapping(index, source) else { return Ok(None) };
    let bound_table = ensure_orm_binding(store, index, project_id, mapping)?;
    Ok(bound_table.map(|id| (id, 0.9)))
}

/// Normalizes common route placeholder syntaxes to a single marker so
/// `{id}`, `:id` and `<id>` compare equal when matching an `ApiEndpoint`'s
/// route pattern against a caller's request path.
pub fn normalize_route(route: &str) -> String {
    let mut normalized = String::with_capacity(route.len());
    let mut chars = route.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                while chars.peek().is_some_and(|c| *c != '}') {
                    chars.next();
                }
                chars.next();
                normalized.push_str(":param");
            }
            ':' | '<' => {
                if c == '<' {
                    while chars.peek().is_some_and(|c| *c != '>') {
                        chars.next();
                    }
                    chars.next();
                } else {
                    while chars.peek().is_some_and(|c| c.is_alphanumeric() || *c == '_') {
                        chars.next();
                    }
                }
                normalized.push_str(":param");
            }
            '*' => normalized.push_str(":param"),
            other => normalized.push(other),
        }
    }
    normalized
}
