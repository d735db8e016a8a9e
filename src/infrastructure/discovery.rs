//! Locates the conventional workflow directory from a relative hint by
//! walking up from the current directory.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// The conventional CI workflow directory, relative to a repository root.
pub const CONVENTIONAL_WORKFLOW_DIR: &str = ".github/workflows";

/// Errors from locating the workflow directory.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("could not find {0} under {1} or any parent directory")]
    NotFound(String, PathBuf),

    #[error("failed to read current directory")]
    CurrentDir(#[source] std::io::Error),
}

/// Resolves `hint` to an existing workflow directory.
///
/// An absolute path is used as-is (and must exist). A relative hint is
/// searched first under `start`, then under each of `start`'s ancestors in
/// order, returning the first directory that exists.
///
/// # Errors
///
/// Returns [`DiscoveryError::NotFound`] if no matching directory exists
/// under `start` or any of its ancestors.
pub fn find_workflow_dir(start: &Path, hint: &str) -> Result<PathBuf, DiscoveryError> {
    let hint_path = Path::new(hint);
    if hint_path.is_absolute() {
        return if hint_path.is_dir() {
            Ok(hint_path.to_path_buf())
        } else {
            Err(DiscoveryError::NotFound(
                hint.to_owned(),
                hint_path.to_path_buf(),
            ))
        };
    }

    for ancestor in start.ancestors() {
        let candidate = ancestor.join(hint_path);
        if candidate.is_dir() {
            return Ok(candidate);
        }
    }
    Err(DiscoveryError::NotFound(hint.to_owned(), start.to_path_buf()))
}
