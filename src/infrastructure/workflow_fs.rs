//! Discovers and reads workflow files from a directory.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::workflow::{Workflow, WorkflowError, parse_workflow};

/// Errors from scanning a workflow directory on disk.
#[derive(Debug, Error)]
pub enum WorkflowFsError {
    #[error("failed to read glob pattern")]
    Glob(#[from] glob::PatternError),

    #[error("failed to read workflow: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse workflow: {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: WorkflowError,
    },
}

/// One workflow file together with its decoded contents.
pub struct LoadedWorkflow {
    pub path: PathBuf,
    pub workflow: Workflow,
}

/// Parses every `*.yml`/`*.yaml` file directly under `dir`.
///
/// A file that fails to read or decode is reported via the returned error
/// list rather than aborting the whole scan.
///
/// # Errors
///
/// Returns [`WorkflowFsError::Glob`] only if the internal glob pattern is
/// malformed, which indicates a programming error rather than bad input.
pub fn parse_workflow_dir(
    dir: &Path,
) -> Result<(Vec<LoadedWorkflow>, Vec<WorkflowFsError>), WorkflowFsError> {
    let mut loaded = Vec::new();
    let mut errors = Vec::new();

    for pattern_suffix in ["*.yml", "*.yaml"] {
        let pattern = dir.join(pattern_suffix);
        let pattern_str = pattern.to_string_lossy().into_owned();
        for entry in glob::glob(&pattern_str)? {
            let path = match entry {
                Ok(path) => path,
                Err(_) => continue,
            };
            match std::fs::read_to_string(&path) {
                Ok(contents) => match parse_workflow(&contents) {
                    Ok(workflow) => loaded.push(LoadedWorkflow { path, workflow }),
                    Err(source) => errors.push(WorkflowFsError::Parse { path, source }),
                },
                Err(source) => errors.push(WorkflowFsError::Read { path, source }),
            }
        }
    }
    loaded.sort_by(|a, b| a.path.cmp(&b.path));
    Ok((loaded, errors))
}
