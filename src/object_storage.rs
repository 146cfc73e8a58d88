//! Object storage contract: holds uploaded archive artifacts
//! referenced by `Source.config`. The pipeline never treats this as
//! authoritative state — only the relational store is.

use std::io::{self, Read, Write};
use std::path::PathBuf;

pub trait ObjectStore: Send + Sync {
    fn put(&self, key: &str, reader: &mut dyn Read) -> io::Result<()>;
    fn open(&self, key: &str) -> io::Result<Box<dyn Read>>;
    /// Keys under `prefix`, used by the remote-bucket connector to sync a
    /// directory of objects.
    fn list_prefix(&self, prefix: &str) -> io::Result<Vec<String>>;
}

/// Filesystem-backed stand-in for a real object store (S3, GCS, ...).
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl ObjectStore for LocalObjectStore {
    fn put(&self, key: &str, reader: &mut dyn Read) -> io::Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        io::copy(reader, &mut file)?;
        Ok(())
    }

    fn open(&self, key: &str) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(std::fs::File::open(self.path_for(key))?))
    }

    fn list_prefix(&self, prefix: &str) -> io::Result<Vec<String>> {
        let base = self.path_for(prefix);
        if !base.is_dir() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in walkdir::WalkDir::new(&base).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                    keys.push(relative.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        Ok(keys)
    }
}
