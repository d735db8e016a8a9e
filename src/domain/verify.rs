//! Verification: structural diff, drift (SHA) check, and integrity check.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::lockfile::{Lockfile, is_sri_sha256};
use crate::domain::reference::ActionReference;
use crate::domain::resolver::RemoteSource;

/// The result of comparing a workflow set's references against a stored
/// lockfile, structurally (no network calls).
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct VerifyResult {
    pub new_actions: Vec<(String, String)>,
    pub removed: Vec<(String, String)>,
    pub changed: Vec<(String, String, String)>,
}

impl VerifyResult {
    /// True iff no structural differences were found.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.new_actions.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Compares the action references found in `refs` against `lockfile`.
///
/// Transitive dependencies are not re-extracted from the workflow set; only
/// the top-level references each workflow directly names are compared. This
/// matches the lockfile's own contract: transitive entries are derived, not
/// declared.
#[must_use]
pub fn verify(refs: &[ActionReference], lockfile: &Lockfile) -> VerifyResult {
    let mut result = VerifyResult::default();
    let mut seen_names = HashSet::new();

    for reference in refs {
        let full_name = reference.full_name();
        seen_names.insert(full_name.clone());
        match lockfile.actions.get(&full_name) {
            None => result
                .new_actions
                .push((full_name.clone(), reference.version.clone())),
            Some(versions) => {
                if versions.iter().any(|v| v.version == reference.version) {
                    continue;
                }
                if let Some(existing) = versions.first() {
                    result.changed.push((
                        full_name.clone(),
                        existing.version.clone(),
                        reference.version.clone(),
                    ));
                } else {
                    result
                        .new_actions
                        .push((full_name.clone(), reference.version.clone()));
                }
            }
        }
    }

    for (full_name, versions) in &lockfile.actions {
        if seen_names.contains(full_name) {
            continue;
        }
        for version in versions {
            result
                .removed
                .push((full_name.clone(), version.version.clone()));
        }
    }

    result
}

/// The outcome of a best-effort remote check: `checked` only counts the
/// records that a network call actually completed for.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CheckResult {
    pub passed: bool,
    pub checked: u32,
    pub failures: Vec<String>,
}

/// Re-resolves every locked `version` against the remote source and
/// compares against the stored `sha`, detecting mutable-tag drift.
///
/// Network failures decrement `checked` rather than counting as a pass or
/// a failure — this check is explicitly best-effort.
pub async fn verify_shas(lockfile: &Lockfile, source: &dyn RemoteSource) -> CheckResult {
    let mut result = CheckResult {
        passed: true,
        checked: 0,
        failures: Vec::new(),
    };
    for (full_name, versions) in &lockfile.actions {
        let Some((owner, repo)) = split_owner_repo(full_name) else {
            continue;
        };
        for locked in versions {
            match source.resolve_ref(owner, repo, &locked.version).await {
                Ok(sha) => {
                    result.checked += 1;
                    if sha != locked.sha {
                        result.passed = false;
                        result.failures.push(format!(
                            "{full_name}@{}: locked {} but remote resolves to {sha}",
                            locked.version, locked.sha
                        ));
                    }
                }
                Err(error) => {
                    log::warn!("skipping drift check for {full_name}@{}: {error}", locked.version);
                }
            }
            for dependency in &locked.dependencies {
                let Ok(Some(dep_ref)) = crate::domain::reference::parse_action_ref(&dependency.reference) else {
                    continue;
                };
                match source
                    .resolve_ref(&dep_ref.owner, &dep_ref.repo, &dep_ref.version)
                    .await
                {
                    Ok(sha) => {
                        result.checked += 1;
                        if sha != dependency.sha {
                            result.passed = false;
                            result.failures.push(format!(
                                "{}: locked {} but remote resolves to {sha}",
                                dependency.reference, dependency.sha
                            ));
                        }
                    }
                    Err(error) => {
                        log::warn!("skipping drift check for {}: {error}", dependency.reference);
                    }
                }
            }
        }
    }
    result
}

/// Re-digests every commit archive in `lockfile` and compares against the
/// stored `integrity`. Same best-effort semantics as [`verify_shas`].
pub async fn verify_integrity(lockfile: &Lockfile, source: &dyn RemoteSource) -> CheckResult {
    let mut result = CheckResult {
        passed: true,
        checked: 0,
        failures: Vec::new(),
    };
    for (full_name, versions) in &lockfile.actions {
        let Some((owner, repo)) = split_owner_repo(full_name) else {
            continue;
        };
        for locked in versions {
            if locked.integrity.is_empty() || !is_sri_sha256(&locked.integrity) {
                continue;
            }
            match source.archive_sha256(owner, repo, &locked.sha).await {
                Ok(digest) => {
                    result.checked += 1;
                    if digest != locked.integrity {
                        result.passed = false;
                        result
                            .failures
                            .push(format!("{full_name}@{}: integrity mismatch", locked.version));
                    }
                }
                Err(error) => {
                    log::warn!("skipping integrity check for {full_name}: {error}");
                }
            }
        }
    }
    result
}

fn split_owner_repo(full_name: &str) -> Option<(&str, &str)> {
    let mut parts = full_name.splitn(3, '/');
    let owner = parts.next()?;
    let repo = parts.next()?;
    Some((owner, repo))
}
