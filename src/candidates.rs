//! Candidate path discovery for path selection.
//!
//! A [`PathSet`](crate::glob::PathSet) filters plain path strings. This module
//! produces those strings from a directory tree, a Git index, or the entries of
//! an archive, always as `/`-separated paths relative to their root.

use std::path::{Component, Path};

use git2::{Index, Repository};
use walkdir::WalkDir;

use crate::archive::Archive;
use crate::error::{Result, StevedoreError};

/// Lists every regular file below `root`, sorted.
///
/// Symbolic links are not followed.
///
/// # Errors
///
/// Returns an error if `root` cannot be read or a path is not valid UTF-8.
pub fn walk_candidates(root: &Path) -> Result<Vec<String>> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            StevedoreError::IoError {
                path,
                source: err.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        paths.push(to_slash_path(relative)?);
    }

    paths.sort();
    Ok(paths)
}

/// Lists all files tracked by the Git repository containing `repo_path`.
///
/// Paths are relative to the repository root, in index order. Submodules and
/// symbolic links are skipped.
///
/// # Errors
///
/// Returns an error if:
/// - No Git repository is found at or above the given path
/// - The Git index cannot be accessed
/// - Any file path contains invalid UTF-8
pub fn tracked_candidates(repo_path: &Path) -> Result<Vec<String>> {
    let repo = Repository::discover(repo_path).map_err(|_| StevedoreError::RepoNotFound {
        path: repo_path.to_path_buf(),
    })?;

    let repo_root = repo
        .workdir()
        .ok_or_else(|| StevedoreError::RepoNotFound {
            path: repo_path.to_path_buf(),
        })?
        .to_path_buf();

    let index = repo.index().map_err(StevedoreError::IndexError)?;
    collect_index_paths(&index, &repo_root)
}

/// Extract all file paths from the Git index, filtering out symlinks
fn collect_index_paths(index: &Index, repo_root: &Path) -> Result<Vec<String>> {
    let mut paths = Vec::new();

    for entry in index.iter() {
        // Skip submodules (mode 160000)
        if entry.mode == 0o160000 {
            continue;
        }

        let path = std::str::from_utf8(&entry.path).map_err(|e| StevedoreError::InvalidPath {
            message: format!("Invalid UTF-8 in path: {e}"),
        })?;

        if let Ok(metadata) = std::fs::symlink_metadata(repo_root.join(path))
            && metadata.is_symlink()
        {
            continue;
        }

        paths.push(path.to_string());
    }

    Ok(paths)
}

/// Lists the file entries of the archive at `path`, in archive order.
pub fn archive_candidates(path: &Path) -> Result<Vec<String>> {
    Ok(Archive::open(path)?.entry_names())
}

/// Render a relative path with `/` separators regardless of platform
fn to_slash_path(path: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| StevedoreError::InvalidPath {
                    message: format!("Invalid UTF-8 in path: {}", path.display()),
                })?;
                parts.push(part);
            }
            Component::CurDir => {}
            _ => {
                return Err(StevedoreError::InvalidPath {
                    message: format!("Expected a relative path: {}", path.display()),
                });
            }
        }
    }
    Ok(parts.join("/"))
}
