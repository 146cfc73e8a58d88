use super::{fresh_work_dir, CloneOutput, SourceConnector};
use crate::error::{ConnectorError, ConnectorResult};
use crate::model::Source;
use crate::object_storage::ObjectStore;
use std::io::Read;
use std::path::Path;

pub struct ObjectArchiveConnector;

impl SourceConnector for ObjectArchiveConnector {
    fn clone_source(
        &self,
        source: &Source,
        work_dir_root: &Path,
        object_store: &dyn ObjectStore,
    ) -> ConnectorResult<CloneOutput> {
        let work_dir = fresh_work_dir(work_dir_root, "archive")
            .map_err(|e| ConnectorError::Io { path: work_dir_root.to_path_buf(), source: e })?;

        let mut bytes = Vec::new();
        object_store
            .open(&source.connection_uri)
            .map_err(|e| ConnectorError::ObjectStorage(e.to_string()))?
            .read_to_end(&mut bytes)
            .map_err(|e| ConnectorError::Io { path: work_dir.clone(), source: e })?;

        extract_zip(&bytes, &work_dir)?;

        Ok(CloneOutput {
            work_dir,
            current_sha: None,
            incremental: false,
            changed_files: Vec::new(),
            deleted_files: Vec::new(),
            previous_sha: None,
        })
    }
}

/// Extracts `bytes` (a zip archive) into `dest`, rejecting any entry whose
/// normalized path would escape `dest` (zip-slip defence).
fn extract_zip(bytes: &[u8], dest: &Path) -> ConnectorResult<()> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive = zip::ZipArchive::new(cursor).map_err(|e| ConnectorError::ObjectStorage(e.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| ConnectorError::ObjectStorage(e.to_string()))?;
        let relative = match entry.enclosed_name() {
            Some(path) => path,
            None => return Err(ConnectorError::PathEscape { path: entry.mangled_name() }),
        };
        let out_path = dest.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)
                .map_err(|e| ConnectorError::Io { path: out_path.clone(), source: e })?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConnectorError::Io { path: parent.to_path_buf(), source: e })?;
        }
        let mut out_file =
            std::fs::File::create(&out_path).map_err(|e| ConnectorError::Io { path: out_path.clone(), source: e })?;
        std::io::copy(&mut entry, &mut out_file).map_err(|e| ConnectorError::Io { path: out_path.clone(), source: e })?;
    }
    Ok(())
}
