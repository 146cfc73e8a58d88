use crate::error::{ConnectorError, ConnectorResult};
use git2::{Delta as GitDelta, DiffFindOptions, DiffOptions, Repository};
use std::path::Path;

/// Classified output of a tree-to-tree diff between two commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    pub changed: Vec<String>,
    pub deleted: Vec<String>,
}

/// Diffs `previous_sha..current_sha` inside the repository at `work_dir` via
/// `git2::Repository::diff_tree_to_tree`, with rename detection enabled so
/// renames classify as "old path deleted, new path changed" per spec.md
/// §4.3a. Unlike shelling out to `git diff --name-status`, paths come back
/// as `git2`'s already-decoded `Path`s rather than text that would need its
/// own quoting rules for non-ASCII/special characters.
pub fn compute_delta(work_dir: &Path, previous_sha: &str, current_sha: &str) -> ConnectorResult<Delta> {
    if previous_sha == current_sha {
        return Ok(Delta::default());
    }

    let repo = Repository::open(work_dir).map_err(|e| ConnectorError::Git(e.to_string()))?;

    let previous_tree = resolve_tree(&repo, previous_sha)?;
    let current_tree = resolve_tree(&repo, current_sha)?;

    let mut diff_opts = DiffOptions::new();
    let mut diff = repo
        .diff_tree_to_tree(Some(&previous_tree), Some(&current_tree), Some(&mut diff_opts))
        .map_err(|e| ConnectorError::Git(e.to_string()))?;

    let mut find_opts = DiffFindOptions::new();
    find_opts.renames(true);
    diff.find_similar(Some(&mut find_opts)).map_err(|e| ConnectorError::Git(e.to_string()))?;

    let mut delta = Delta::default();
    for entry in diff.deltas() {
        let new_path = entry.new_file().path().map(path_to_string);
        let old_path = entry.old_file().path().map(path_to_string);

        match entry.status() {
            GitDelta::Added | GitDelta::Modified | GitDelta::Copied | GitDelta::Typechange => {
                if let Some(path) = new_path {
                    delta.changed.push(path);
                }
            }
            GitDelta::Deleted => {
                if let Some(path) = old_path {
                    delta.deleted.push(path);
                }
            }
            GitDelta::Renamed => {
                if let Some(path) = old_path {
                    delta.deleted.push(path);
                }
                if let Some(path) = new_path {
                    delta.changed.push(path);
                }
            }
            _ => {}
        }
    }

    Ok(delta)
}

fn resolve_tree<'repo>(repo: &'repo Repository, sha: &str) -> ConnectorResult<git2::Tree<'repo>> {
    let oid = git2::Oid::from_str(sha).map_err(|e| ConnectorError::Git(e.to_string()))?;
    let commit = repo.find_commit(oid).map_err(|e| ConnectorError::Git(e.to_string()))?;
    commit.tree().map_err(|e| ConnectorError::Git(e.to_string()))
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
