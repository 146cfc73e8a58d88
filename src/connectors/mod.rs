//! Source connectors: switch on `Source.source_type`
//! to materialize a work directory on the worker host, optionally with a
//! git-diff delta against the previously indexed commit.

mod filesystem;
mod git;
mod git_delta;
mod object_archive;
mod remote_bucket;

pub use git_delta::{compute_delta, Delta};

use crate::error::ConnectorResult;
use crate::model::{Source, SourceType};
use crate::object_storage::ObjectStore;
use std::path::{Path, PathBuf};

/// Result of materializing a source's contents locally.
#[derive(Debug, Clone, Default)]
pub struct CloneOutput {
    pub work_dir: PathBuf,
    pub current_sha: Option<String>,
    pub incremental: bool,
    pub changed_files: Vec<String>,
    pub deleted_files: Vec<String>,
    pub previous_sha: Option<String>,
}

pub trait SourceConnector: Send + Sync {
    fn clone_source(
        &self,
        source: &Source,
        work_dir_root: &Path,
        object_store: &dyn ObjectStore,
    ) -> ConnectorResult<CloneOutput>;
}

/// Closed map from source type to connector, built at startup, mirroring
/// the parser registry's pattern.
pub fn connector_for(source_type: SourceType) -> Box<dyn SourceConnector> {
    match source_type {
        SourceType::Git => Box::new(git::GitConnector),
        SourceType::ObjectArchive => Box::new(object_archive::ObjectArchiveConnector),
        SourceType::RemoteBucket => Box::new(remote_bucket::RemoteBucketConnector),
        SourceType::Filesystem => Box::new(filesystem::FilesystemConnector),
    }
}

pub(crate) fn fresh_work_dir(root: &Path, label: &str) -> std::io::Result<PathBuf> {
    let suffix: u64 = rand::random();
    let dir = root.join(format!("{label}-{suffix:x}"));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
