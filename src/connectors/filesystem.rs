use super::{CloneOutput, SourceConnector};
use crate::error::{ConnectorError, ConnectorResult};
use crate::model::Source;
use crate::object_storage::ObjectStore;
use std::path::{Path, PathBuf};

/// Local-filesystem source: `connection_uri` is already a directory on the
/// worker host (the common case for on-prem / dev setups), so there is
/// nothing to materialize.
pub struct FilesystemConnector;

impl SourceConnector for FilesystemConnector {
    fn clone_source(
        &self,
        source: &Source,
        _work_dir_root: &Path,
        _object_store: &dyn ObjectStore,
    ) -> ConnectorResult<CloneOutput> {
        let work_dir = PathBuf::from(&source.connection_uri);
        if !work_dir.is_dir() {
            return Err(ConnectorError::Io {
                path: work_dir,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "source directory does not exist"),
            });
        }
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
