//! Clone stage: materializes a source's contents
//! locally via its connector, then walks the resulting work directory
//! into a flat file list the parse-dispatch stage can chunk.

use crate::connectors::CloneOutput;
use sha2::{Digest, Sha256};
use std::path::Path;

/// One file discovered on disk, ready to be upserted and assigned to a
/// parse-task chunk.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub relative_path: String,
    pub absolute_path: String,
    pub size: u64,
    pub sha256: String,
    pub language: String,
}

const IGNORED_DIRS: &[&str] = &[".git", "node_modules", "target", "bin", "obj"];

/// Incremental clones (`clone_output.incremental`) only need their
/// `changed_files` re-parsed — deletions are handled by the caller before
/// this is invoked. A non-incremental clone (first run, or a git-diff
/// failure fallback) walks the whole work directory.
pub fn discover_files(clone_output: &CloneOutput) -> std::io::Result<Vec<DiscoveredFile>> {
    if clone_output.incremental {
        discover_listed(clone_output)
    } else {
        discover_full_tree(&clone_output.work_dir)
    }
}

fn discover_listed(clone_output: &CloneOutput) -> std::io::Result<Vec<DiscoveredFile>> {
    let mut files = Vec::with_capacity(clone_output.changed_files.len());
    for relative in &clone_output.changed_files {
        let absolute = clone_output.work_dir.join(relative);
        if let Some(file) = describe_file(&clone_output.work_dir, &absolute)? {
            files.push(file);
        }
    }
    Ok(files)
}

fn discover_full_tree(root: &Path) -> std::io::Result<Vec<DiscoveredFile>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_ignored(e))
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_file() {
            if let Some(file) = describe_file(root, entry.path())? {
                files.push(file);
            }
        }
    }
    Ok(files)
}

fn is_ignored(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| IGNORED_DIRS.contains(&name))
        .unwrap_or(false)
}

fn describe_file(root: &Path, absolute: &Path) -> std::io::Result<Option<DiscoveredFile>> {
    if !absolute.is_file() {
        return Ok(None);
    }
    let contents = std::fs::read(absolute)?;
    let relative = absolute
        .strip_prefix(root)
        .unwrap_or(absolute)
        .to_string_lossy()
        .replace('\\', "/");
    let sha256 = format!("{:x}", Sha256::digest(&contents));
    Ok(Some(DiscoveredFile {
        language: crate::parsers::registry::language_for(&relative).to_string(),
        relative_path: relative,
        absolute_path: absolute.to_string_lossy().to_string(),
        size: contents.len() as u64,
        sha256,
    }))
}
