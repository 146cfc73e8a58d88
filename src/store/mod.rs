//! Relational store: the authoritative mutator of Files,
//! Symbols, SymbolEdges, ColumnReferences and SymbolEmbeddings, and the
//! system of record for Project/Source/IndexRun lifecycle.
//!
//! Backed by `rusqlite` over an `r2d2` connection pool, mirroring how the
//! rest of the pack persists local-first relational state (one pooled
//! `Connection` per unit of work, idempotent `CREATE TABLE IF NOT EXISTS`
//! migrations run at pool construction).

mod analytics;
mod column_refs;
mod dead_letters;
mod edges;
mod embeddings;
mod files;
mod pending_references;
mod projects;
mod runs;
mod schema;
mod symbols;
mod sources;

use crate::error::{StoreError, StoreResult};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

pub use analytics::*;
pub use column_refs::*;
pub use dead_letters::*;
pub use edges::*;
pub use embeddings::*;
pub use files::*;
pub use pending_references::*;
pub use projects::*;
pub use runs::*;
pub use symbols::*;
pub use sources::*;

pub type Pooled = r2d2::PooledConnection<SqliteConnectionManager>;

/// Pooled handle onto the engine's sqlite database.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    /// Opens (creating if necessary) the database at `path` and runs the
    /// idempotent schema migration against it.
    pub fn open(path: &Path, pool_size: u32) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Sqlite(rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
            })?;
        }
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")
        });
        let pool = Pool::builder().max_size(pool_size).build(manager)?;
        let store = Self { pool };
        store.migrate()?;
        Ok(store)
    }

    /// In-memory store for tests; each instance is an isolated database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        });
        let pool = Pool::builder().max_size(1).build(manager)?;
        let store = Self { pool };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(schema::SCHEMA)?;
        Ok(())
    }

    pub fn conn(&self) -> StoreResult<Pooled> {
        Ok(self.pool.get()?)
    }
}
