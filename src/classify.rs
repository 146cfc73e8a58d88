//! File classification. Used by the parse worker to
//! decide whether to skip column-level lineage extraction for a file —
//! classified files still have their symbols extracted — and by the
//! analytics stage to assign each symbol an architectural layer.

use crate::model::SymbolKind;

const PATH_SEGMENTS: &[&str] = &["database/", "migrations/", "scripts/"];
const FRAMEWORK_SCHEMA_SEGMENTS: &[&str] = &["dnn platform/", "dnn.adminexperience/", "providers/"];
const SCHEMA_SUFFIXES: &[&str] = &[".install.sql", ".upgrade.sql"];

const PRESENTATION_PATH_SEGMENTS: &[&str] =
    &["controllers/", "routes/", "views/", "components/", "pages/", "endpoints/", "api/"];
const DATA_PATH_SEGMENTS: &[&str] = &["database/", "migrations/", "repositories/", "dao/"];

/// True if `relpath` is a migration/schema file and should have its
/// column-level lineage suppressed during persistence.
pub fn is_migration_or_schema(relpath: &str, exclude_patterns: &[String]) -> bool {
    let normalized = relpath.replace('\\', "/").to_lowercase();

    let has_segment = |candidates: &[&str]| {
        candidates.iter().any(|segment| {
            normalized == segment.trim_end_matches('/')
                || normalized.starts_with(segment)
                || normalized.contains(&format!("/{segment}"))
        })
    };

    if has_segment(PATH_SEGMENTS) || has_segment(FRAMEWORK_SCHEMA_SEGMENTS) {
        return true;
    }
    if SCHEMA_SUFFIXES.iter().any(|suffix| normalized.ends_with(suffix)) {
        return true;
    }
    exclude_patterns.iter().any(|pattern| matches_pattern(&normalized, &pattern.to_lowercase()))
}

fn matches_pattern(normalized_path: &str, pattern: &str) -> bool {
    let is_glob = pattern.contains(['*', '?', '[']);
    if is_glob {
        glob::Pattern::new(pattern).map(|p| p.matches(normalized_path)).unwrap_or(false)
    } else {
        normalized_path.contains(pattern)
    }
}

/// Architectural layer for one symbol, from its kind, language, and
/// containing file's path (spec.md §4.9). Kind is authoritative where it
/// unambiguously identifies a layer (a table is always `data`, a
/// controller is always `presentation`); path segments break the tie for
/// the generic/general-purpose kinds that could live in any layer.
pub fn architectural_layer(kind: SymbolKind, language: &str, path: &str) -> &'static str {
    use SymbolKind::*;

    if matches!(
        kind,
        Table | View
            | MaterializedView
            | Column
            | Index
            | PrimaryKey
            | ForeignKey
            | Constraint
            | Sequence
            | Schema
            | Synonym
            | UserDefinedType
            | TableValuedFunction
            | Cursor
            | Procedure
            | Function
            | Trigger
            | Job
            | OrmMigration
    ) {
        return "data";
    }

    if matches!(
        kind,
        ApiEndpoint | Controller | Middleware | RouteGroup | Component | Hook | Store | ServerPage | TemplateBlock | Include
    ) {
        return "presentation";
    }

    let normalized = path.replace('\\', "/").to_lowercase();
    if PRESENTATION_PATH_SEGMENTS.iter().any(|segment| normalized.contains(segment)) {
        return "presentation";
    }
    if DATA_PATH_SEGMENTS.iter().any(|segment| normalized.contains(segment)) {
        return "data";
    }
    if language.eq_ignore_ascii_case("sql") {
        return "data";
    }

    "business"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_known_path_segments() {
        assert!(is_migration_or_schema("Database/Migrations/001_init.sql", &[]));
        assert!(is_migration_or_schema("src/migrations/002_add_col.sql", &[]));
        assert!(is_migration_or_schema("app/Scripts/seed.sql", &[]));
    }

    #[test]
    fn flags_framework_schema_segments_case_insensitively() {
        assert!(is_migration_or_schema("DNN Platform/Components/Foo.cs", &[]));
        assert!(is_migration_or_schema("src/Providers/DataProvider.cs", &[]));
    }

    #[test]
    fn flags_install_and_upgrade_sql_suffixes() {
        assert!(is_migration_or_schema("modules/foo/01.00.00.install.sql", &[]));
        assert!(is_migration_or_schema("modules/foo/01.01.00.upgrade.sql", &[]));
    }

    #[test]
    fn leaves_ordinary_source_files_alone() {
        assert!(!is_migration_or_schema("src/orders/repository.cs", &[]));
        assert!(!is_migration_or_schema("get_user.sql", &[]));
    }

    #[test]
    fn respects_glob_and_substring_exclude_patterns() {
        assert!(is_migration_or_schema("vendor/lib/schema.sql", &["vendor/**".to_string()]));
        assert!(is_migration_or_schema("third_party/generated.sql", &["third_party".to_string()]));
        assert!(!is_migration_or_schema("src/app.sql", &["vendor/**".to_string()]));
    }

    #[test]
    fn layer_is_kind_driven_for_unambiguous_kinds() {
        assert_eq!(architectural_layer(SymbolKind::Table, "sql", "schema/create_users.sql"), "data");
        assert_eq!(architectural_layer(SymbolKind::ApiEndpoint, "javascript", "src/api/users.ts"), "presentation");
    }

    #[test]
    fn layer_falls_back_to_path_heuristics_for_generic_kinds() {
        assert_eq!(architectural_layer(SymbolKind::Class, "csharp", "src/Controllers/UsersController.cs"), "presentation");
        assert_eq!(architectural_layer(SymbolKind::Class, "csharp", "src/Repositories/UserRepository.cs"), "data");
        assert_eq!(architectural_layer(SymbolKind::Class, "csharp", "src/Domain/UserService.cs"), "business");
    }
}
