//! Idempotent schema definition. Applied once per connection
//! acquisition via `CREATE TABLE IF NOT EXISTS`; safe to run against an
//! already-migrated database.

pub const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS projects (
    id          INTEGER PRIMARY KEY,
    slug        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    tenant_id   TEXT NOT NULL,
    description TEXT,
    settings    TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS sources (
    id                   INTEGER PRIMARY KEY,
    project_id           INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    source_type          TEXT NOT NULL,
    connection_uri       TEXT NOT NULL,
    config               TEXT NOT NULL DEFAULT '{}',
    last_indexed_commit  TEXT,
    credential_ref       TEXT
);
CREATE INDEX IF NOT EXISTS idx_sources_project ON sources(project_id);

CREATE TABLE IF NOT EXISTS index_runs (
    id              INTEGER PRIMARY KEY,
    project_id      INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    source_id       INTEGER REFERENCES sources(id) ON DELETE SET NULL,
    trigger         TEXT NOT NULL,
    status          TEXT NOT NULL,
    started_at      TEXT,
    completed_at    TEXT,
    commit_sha      TEXT,
    files_processed INTEGER NOT NULL DEFAULT 0,
    symbols_found   INTEGER NOT NULL DEFAULT 0,
    edges_found     INTEGER NOT NULL DEFAULT 0,
    error_message   TEXT
);
CREATE INDEX IF NOT EXISTS idx_index_runs_project ON index_runs(project_id);

CREATE TABLE IF NOT EXISTS files (
    id              INTEGER PRIMARY KEY,
    project_id      INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    source_id       INTEGER NOT NULL REFERENCES sources(id) ON DELETE CASCADE,
    path            TEXT NOT NULL,
    language        TEXT,
    size            INTEGER NOT NULL,
    sha256          TEXT NOT NULL,
    last_indexed_at TEXT NOT NULL,
    UNIQUE(project_id, source_id, path)
);

CREATE TABLE IF NOT EXISTS symbols (
    id              INTEGER PRIMARY KEY,
    project_id      INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    file_id         INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    parent_id       INTEGER REFERENCES symbols(id) ON DELETE CASCADE,
    kind            TEXT NOT NULL,
    name            TEXT NOT NULL,
    qualified_name  TEXT NOT NULL,
    language        TEXT NOT NULL,
    start_line      INTEGER NOT NULL,
    end_line        INTEGER NOT NULL,
    start_col       INTEGER,
    end_col         INTEGER,
    signature       TEXT,
    doc_comment     TEXT,
    metadata        TEXT NOT NULL DEFAULT '{}'
);
CREATE INDEX IF NOT EXISTS idx_symbols_file ON symbols(file_id);
CREATE INDEX IF NOT EXISTS idx_symbols_project_fqn ON symbols(project_id, qualified_name);

CREATE TABLE IF NOT EXISTS symbol_edges (
    id          INTEGER PRIMARY KEY,
    project_id  INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    source_id   INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    target_id   INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    kind        TEXT NOT NULL,
    metadata    TEXT NOT NULL DEFAULT '{}',
    UNIQUE(source_id, target_id, kind)
);
CREATE INDEX IF NOT EXISTS idx_symbol_edges_target ON symbol_edges(target_id);

CREATE TABLE IF NOT EXISTS column_references (
    id                    INTEGER PRIMARY KEY,
    project_id            INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    run_id                INTEGER NOT NULL REFERENCES index_runs(id) ON DELETE CASCADE,
    source_column_fqn     TEXT NOT NULL,
    target_column_fqn     TEXT NOT NULL,
    derivation            TEXT NOT NULL,
    expression            TEXT,
    containing_symbol_fqn TEXT,
    line                  INTEGER
);
CREATE INDEX IF NOT EXISTS idx_column_references_run ON column_references(run_id);

CREATE TABLE IF NOT EXISTS pending_references (
    id                INTEGER PRIMARY KEY,
    project_id        INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    run_id            INTEGER NOT NULL REFERENCES index_runs(id) ON DELETE CASCADE,
    source_id         INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    to_name           TEXT NOT NULL,
    to_qualified      TEXT,
    reference_type    TEXT NOT NULL,
    confidence_hint   REAL
);
CREATE INDEX IF NOT EXISTS idx_pending_references_run ON pending_references(run_id);

CREATE TABLE IF NOT EXISTS symbol_embeddings (
    symbol_id     INTEGER PRIMARY KEY REFERENCES symbols(id) ON DELETE CASCADE,
    vector        BLOB NOT NULL,
    content_hash  TEXT NOT NULL,
    model_version TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS project_analytics (
    id           INTEGER PRIMARY KEY,
    project_id   INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    scope        TEXT NOT NULL,
    scope_id     TEXT NOT NULL,
    computed_at  TEXT NOT NULL,
    payload      TEXT NOT NULL,
    UNIQUE(project_id, scope, scope_id)
);

CREATE TABLE IF NOT EXISTS dead_letters (
    id          INTEGER PRIMARY KEY,
    stream      TEXT NOT NULL,
    message_id  TEXT NOT NULL,
    payload     BLOB NOT NULL,
    reason      TEXT NOT NULL,
    attempts    INTEGER NOT NULL,
    created_at  TEXT NOT NULL
);
";
