//! The three entry points a CLI front-end drives: `generate`, `verify`,
//! `list`. Each composes the domain and infrastructure layers; none of them
//! touch process args or stdout directly.

use std::path::{Path, PathBuf};

use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::config::Config;
use crate::domain::lockfile::Lockfile;
use crate::domain::reference::is_sha;
use crate::domain::resolver::{ResolveError, resolve_all};
use crate::domain::verify::{CheckResult, VerifyResult, verify, verify_integrity, verify_shas};
use crate::domain::workflow::extract_action_refs;
use crate::infrastructure::discovery::{DiscoveryError, find_workflow_dir};
use crate::infrastructure::lockfile_fs::{LockfileFsError, read_lockfile, write_lockfile};
use crate::infrastructure::remote::{GithubSource, RemoteError};
use crate::infrastructure::workflow_fs::{WorkflowFsError, parse_workflow_dir};

/// Errors surfaced by the command entry points.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("workflow directory not found")]
    WorkflowDirNotFound(#[from] DiscoveryError),

    #[error("no workflow files found in {}", .0.display())]
    NoWorkflows(PathBuf),

    #[error(transparent)]
    WorkflowFs(#[from] WorkflowFsError),

    #[error(transparent)]
    LockfileFs(#[from] LockfileFsError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("references must already be pinned to a commit SHA, found {0}")]
    RequireShaViolation(String),

    #[error("failed to format current time")]
    Time(#[from] time::error::Format),
}

/// Options for [`generate`].
pub struct GenerateOptions {
    pub workflow_dir: PathBuf,
    pub output_path: PathBuf,
    pub require_sha: bool,
}

/// Generates a lockfile for every action reference found under
/// `options.workflow_dir` and writes it to `options.output_path`.
///
/// # Errors
///
/// Returns [`CoreError::NoWorkflows`] if the directory has no workflow
/// files, [`CoreError::RequireShaViolation`] if `require_sha` is set and a
/// non-SHA reference is found, or any resolution/I/O error.
pub async fn generate(config: &Config, options: &GenerateOptions) -> Result<Lockfile, CoreError> {
    let (loaded, parse_errors) = parse_workflow_dir(&options.workflow_dir)?;
    for error in &parse_errors {
        log::warn!("{error}");
    }
    if loaded.is_empty() {
        return Err(CoreError::NoWorkflows(options.workflow_dir.clone()));
    }

    let workflows: Vec<_> = loaded.into_iter().map(|lw| lw.workflow).collect();
    let refs = extract_action_refs(&workflows);

    if options.require_sha {
        if let Some(reference) = refs.iter().find(|r| !is_sha(&r.version)) {
            return Err(CoreError::RequireShaViolation(reference.literal.clone()));
        }
    }

    let source = GithubSource::new(
        config.credential.clone(),
        config.request_timeout,
        config.max_concurrent,
    )?;
    let generated = OffsetDateTime::now_utc().format(&Rfc3339)?;
    let lockfile = resolve_all(&refs, &source, generated).await?;

    write_lockfile(&options.output_path, &lockfile)?;
    log::info!("wrote lockfile to {}", options.output_path.display());
    Ok(lockfile)
}

/// Options for [`verify`].
pub struct VerifyOptions {
    pub workflow_dir: PathBuf,
    pub lockfile_path: PathBuf,
    pub skip_sha: bool,
    pub skip_integrity: bool,
}

/// The combined result of verifying a workflow set against a stored
/// lockfile across all three dimensions.
pub struct VerifyOutcome {
    pub structural: VerifyResult,
    pub sha: Option<CheckResult>,
    pub integrity: Option<CheckResult>,
}

impl VerifyOutcome {
    /// True iff the structural comparison matched and every check that ran
    /// passed.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.structural.is_match()
            && self.sha.as_ref().is_none_or(|r| r.passed)
            && self.integrity.as_ref().is_none_or(|r| r.passed)
    }
}

/// Compares the workflow set under `options.workflow_dir` against the
/// lockfile at `options.lockfile_path`, structurally and (unless skipped)
/// by re-resolving SHAs and re-digesting archives.
///
/// # Errors
///
/// Returns any workflow-parsing or lockfile-reading error. Network failures
/// during the SHA/integrity checks are non-fatal and recorded in the
/// returned [`CheckResult`]s instead of propagating.
pub async fn verify_command(
    config: &Config,
    options: &VerifyOptions,
) -> Result<VerifyOutcome, CoreError> {
    let (loaded, parse_errors) = parse_workflow_dir(&options.workflow_dir)?;
    for error in &parse_errors {
        log::warn!("{error}");
    }
    let workflows: Vec<_> = loaded.into_iter().map(|lw| lw.workflow).collect();
    let refs = extract_action_refs(&workflows);
    let lockfile = read_lockfile(&options.lockfile_path)?;

    let structural = verify(&refs, &lockfile);

    let source = GithubSource::new(
        config.credential.clone(),
        config.request_timeout,
        config.max_concurrent,
    )?;
    let sha = if options.skip_sha {
        None
    } else {
        Some(verify_shas(&lockfile, &source).await)
    };
    let integrity = if options.skip_integrity {
        None
    } else {
        Some(verify_integrity(&lockfile, &source).await)
    };

    Ok(VerifyOutcome {
        structural,
        sha,
        integrity,
    })
}

/// Loads the lockfile at `lockfile_path` for display by a CLI front-end.
///
/// # Errors
///
/// Returns an error if the lockfile cannot be read or decoded.
pub fn list(lockfile_path: &Path) -> Result<Lockfile, CoreError> {
    Ok(read_lockfile(lockfile_path)?)
}

/// Resolves a relative workflow-directory hint starting from `start`.
///
/// # Errors
///
/// Returns [`CoreError::WorkflowDirNotFound`] if no matching directory
/// exists under `start` or any ancestor.
pub fn resolve_workflow_dir(start: &Path, hint: &str) -> Result<PathBuf, CoreError> {
    Ok(find_workflow_dir(start, hint)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn generate_requires_sha_rejects_mutable_ref() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("ci.yml"),
            "jobs:\n  build:\n    steps:\n      - uses: actions/checkout@v4\n",
        )
        .unwrap();
        let output = dir.path().join("actions.lock.json");
        let config = Config {
            credential: None,
            max_concurrent: 4,
            request_timeout: std::time::Duration::from_secs(5),
        };
        let options = GenerateOptions {
            workflow_dir: dir.path().to_path_buf(),
            output_path: output.clone(),
            require_sha: true,
        };
        let error = generate(&config, &options).await.unwrap_err();
        assert!(matches!(error, CoreError::RequireShaViolation(_)));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn generate_rejects_empty_workflow_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            credential: None,
            max_concurrent: 4,
            request_timeout: std::time::Duration::from_secs(5),
        };
        let options = GenerateOptions {
            workflow_dir: dir.path().to_path_buf(),
            output_path: dir.path().join("actions.lock.json"),
            require_sha: false,
        };
        let error = generate(&config, &options).await.unwrap_err();
        assert!(matches!(error, CoreError::NoWorkflows(_)));
    }
}
