use super::SqliteStore;
use crate::error::StoreResult;
use crate::model::SymbolEmbedding;
use crate::types::SymbolId;
use rusqlite::{params, Row};

fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn blob_to_vector(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect()
}

fn row_to_embedding(row: &Row) -> rusqlite::Result<SymbolEmbedding> {
    let blob: Vec<u8> = row.get("vector")?;
    Ok(SymbolEmbedding {
        symbol_id: SymbolId::new(row.get("symbol_id")?),
        vector: blob_to_vector(&blob),
        content_hash: row.get("content_hash")?,
        model_version: row.get("model_version")?,
    })
}

impl SqliteStore {
    pub fn upsert_embedding(&self, embedding: &SymbolEmbedding) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO symbol_embeddings (symbol_id, vector, content_hash, model_version)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(symbol_id) DO UPDATE SET
                vector = excluded.vector,
                content_hash = excluded.content_hash,
                model_version = excluded.model_version",
            params![
                embedding.symbol_id.value(),
                vector_to_blob(&embedding.vector),
                embedding.content_hash,
                embedding.model_version,
            ],
        )?;
        Ok(())
    }

    pub fn get_embedding(&self, symbol_id: SymbolId) -> StoreResult<Option<SymbolEmbedding>> {
        let conn = self.conn()?;
        let result = conn.query_row(
            "SELECT symbol_id, vector, content_hash, model_version FROM symbol_embeddings WHERE symbol_id = ?1",
            params![symbol_id.value()],
            row_to_embedding,
        );
        match result {
            Ok(embedding) => Ok(Some(embedding)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Every symbol in `file_id`, paired with its existing embedding's
    /// `content_hash`/`model_version` if it has one — the embed stage's
    /// candidate list. A `None` pair means no embedding exists yet; the
    /// caller still has to recompute each symbol's current content hash to
    /// decide whether a `Some` pair is stale, since that hash depends on
    /// the symbol's live text, not anything this query can compare alone.
    pub fn symbols_with_embedding_state(&self, file_id: crate::types::FileId) -> StoreResult<Vec<EmbeddingState>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT s.id, e.content_hash, e.model_version FROM symbols s
             LEFT JOIN symbol_embeddings e ON e.symbol_id = s.id
             WHERE s.file_id = ?1",
        )?;
        let rows = stmt.query_map(params![file_id.value()], |row| {
            Ok(EmbeddingState {
                symbol_id: SymbolId::new(row.get::<_, i64>(0)?),
                content_hash: row.get::<_, Option<String>>(1)?,
                model_version: row.get::<_, Option<String>>(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

/// One symbol's embedding freshness as known to the store, before the
/// embed stage recomputes its current content hash.
pub struct EmbeddingState {
    pub symbol_id: SymbolId,
    pub content_hash: Option<String>,
    pub model_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_blob_round_trips() {
        let original = vec![0.5_f32, -1.25, 3.0];
        let blob = vector_to_blob(&original);
        assert_eq!(blob_to_vector(&blob), original);
    }
}
