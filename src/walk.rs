//! Directory tree walking
//!
//! [`walk`] visits a directory and every directory below it, pre-order.
//! Returning `false` from the visitor prunes that directory: its
//! subdirectories are not visited.

use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// Errors that can occur while walking
#[derive(Debug, Error)]
pub enum WalkError {
    /// Root path is not a directory
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Error walking directory tree
    #[error("walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

/// Visit `root` and all directories beneath it
///
/// Directories are visited parent before child, siblings in file-name order.
/// Files are skipped.
pub fn walk<F>(root: impl AsRef<Path>, mut visit: F) -> Result<(), WalkError>
where
    F: FnMut(&Path) -> bool,
{
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(WalkError::NotADirectory(root.to_path_buf()));
    }

    let mut entries = WalkDir::new(root).sort_by_file_name().into_iter();
    while let Some(entry) = entries.next() {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if !visit(entry.path()) {
            log::trace!("pruning {}", entry.path().display());
            entries.skip_current_dir();
        }
    }
    Ok(())
}

/// Collect the directories [`walk`] would visit, with no pruning
pub fn directories(root: impl AsRef<Path>) -> Result<Vec<PathBuf>, WalkError> {
    let mut dirs = Vec::new();
    walk(root, |dir| {
        dirs.push(dir.to_path_buf());
        true
    })?;
    Ok(dirs)
}
