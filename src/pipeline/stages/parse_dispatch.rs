//! Parse-dispatch stage: upserts discovered files,
//! chunks them, and enqueues one `parse_tasks` message per chunk.

use super::clone::DiscoveredFile;
use crate::error::StageResult;
use crate::pipeline::{ChunkFile, ParseTaskMessage};
use crate::queue::Queue;
use crate::store::SqliteStore;
use crate::types::{ProjectId, RunId, SourceId};

/// Upserts every discovered file, chunks the resulting rows, and enqueues
/// one message per chunk. Returns the number of chunks dispatched — 0
/// means this run has nothing to parse and phase 2 should start
/// immediately.
#[allow(clippy::too_many_arguments)]
pub fn dispatch(
    store: &SqliteStore,
    queue: &dyn Queue,
    parse_stream: &str,
    project_id: ProjectId,
    run_id: RunId,
    source_id: SourceId,
    discovered: &[DiscoveredFile],
    chunk_size: usize,
    lineage_exclude_paths: Vec<String>,
) -> StageResult<usize> {
    let mut files = Vec::with_capacity(discovered.len());
    for file in discovered {
        let row = store.upsert_file(project_id, source_id, &file.relative_path, Some(&file.language), file.size, &file.sha256)?;
        files.push(ChunkFile {
            file_id: row.id,
            relative_path: file.relative_path.clone(),
            absolute_path: file.absolute_path.clone(),
            language: file.language.clone(),
        });
    }

    let chunks: Vec<&[ChunkFile]> = files.chunks(chunk_size.max(1)).collect();
    let total_chunks = chunks.len();

    for (chunk_index, chunk) in chunks.into_iter().enumerate() {
        let message = ParseTaskMessage {
            run_id,
            project_id,
            source_id,
            chunk_index,
            total_chunks,
            lineage_exclude_paths: lineage_exclude_paths.clone(),
            files: chunk.to_vec(),
        };
        let payload = serde_json::to_vec(&message).map_err(crate::error::QueueError::from)?;
        queue.enqueue(parse_stream, &payload)?;
    }

    Ok(total_chunks)
}
