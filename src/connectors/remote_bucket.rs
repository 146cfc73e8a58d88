use super::{fresh_work_dir, CloneOutput, SourceConnector};
use crate::error::{ConnectorError, ConnectorResult};
use crate::model::Source;
use crate::object_storage::ObjectStore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Syncs objects under `config.prefix`, comparing each object's content hash
/// to `config.known_hashes` (populated from the previous run's File rows)
/// rather than a single commit SHA — remote buckets have no VCS history to
/// diff against.
pub struct RemoteBucketConnector;

impl SourceConnector for RemoteBucketConnector {
    fn clone_source(
        &self,
        source: &Source,
        work_dir_root: &Path,
        object_store: &dyn ObjectStore,
    ) -> ConnectorResult<CloneOutput> {
        let work_dir = fresh_work_dir(work_dir_root, "bucket")
            .map_err(|e| ConnectorError::Io { path: work_dir_root.to_path_buf(), source: e })?;

        let prefix = source.config.get("prefix").and_then(|v| v.as_str()).unwrap_or("");
        let known_hashes: HashMap<String, String> = source
            .config
            .get("known_hashes")
            .and_then(|v| v.as_object())
            .map(|obj| obj.iter().filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string()))).collect())
            .unwrap_or_default();

        let keys = object_store.list_prefix(prefix).map_err(|e| ConnectorError::ObjectStorage(e.to_string()))?;
        let mut changed_files = Vec::with_capacity(keys.len());

        for key in &keys {
            let mut bytes = Vec::new();
            object_store
                .open(key)
                .map_err(|e| ConnectorError::ObjectStorage(e.to_string()))?
                .read_to_end(&mut bytes)
                .map_err(|e| ConnectorError::Io { path: work_dir.clone(), source: e })?;

            let hash = format!("{:x}", Sha256::digest(&bytes));
            let relative = key.strip_prefix(prefix).unwrap_or(key).trim_start_matches('/');
            let out_path = work_dir.join(relative);
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| ConnectorError::Io { path: parent.to_path_buf(), source: e })?;
            }
            std::fs::write(&out_path, &bytes).map_err(|e| ConnectorError::Io { path: out_path.clone(), source: e })?;

            if known_hashes.get(relative).map(String::as_str) != Some(hash.as_str()) {
                changed_files.push(relative.to_string());
            }
        }

        Ok(CloneOutput {
            work_dir,
            current_sha: None,
            incremental: !known_hashes.is_empty(),
            changed_files,
            deleted_files: Vec::new(),
            previous_sha: None,
        })
    }
}
