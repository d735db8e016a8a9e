//! The resolver: walks a reference set, recurses into transitive
//! dependencies, and composes a [`Lockfile`].

use std::collections::HashSet;

use thiserror::Error;

use crate::domain::descriptor::ActionDescriptor;
use crate::domain::lockfile::{Lockfile, LockedAction, LockedDependency};
use crate::domain::reference::{ActionReference, parse_action_ref};

/// Maximum transitive-dependency recursion depth. Cuts runaway or cyclic
/// composite-action graphs.
pub const MAX_DEPTH: u32 = 10;

/// Errors from resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("dependency depth exceeded {MAX_DEPTH} at {0}")]
    DepthExceeded(String),

    #[error("failed to resolve {reference}: {source}")]
    Remote {
        reference: String,
        #[source]
        source: crate::infrastructure::remote::RemoteError,
    },
}

/// Abstraction over the code-hosting service, implemented by
/// [`crate::infrastructure::remote::GithubSource`] and by in-memory test
/// doubles.
#[async_trait::async_trait]
pub trait RemoteSource: Send + Sync {
    /// Resolves a mutable or already-pinned ref to a commit identifier.
    async fn resolve_ref(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
    ) -> Result<String, crate::infrastructure::remote::RemoteError>;

    /// Fetches and decodes an action's descriptor at a commit, if present.
    async fn get_action_descriptor(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        path: Option<&str>,
    ) -> Result<Option<ActionDescriptor>, crate::infrastructure::remote::RemoteError>;

    /// Computes the SRI `sha256-<base64>` digest of the commit's source
    /// archive.
    async fn archive_sha256(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<String, crate::infrastructure::remote::RemoteError>;
}

/// Resolves every reference in `refs`, recursing into transitive
/// dependencies, and returns the populated lockfile. Does not write to
/// disk.
///
/// # Errors
///
/// Returns [`ResolveError::Remote`] if resolving a commit identifier fails
/// (fatal — without it no valid lockfile entry can be produced), or
/// [`ResolveError::DepthExceeded`] if the transitive-dependency chain
/// exceeds [`MAX_DEPTH`].
pub async fn resolve_all(
    refs: &[ActionReference],
    source: &dyn RemoteSource,
    generated: impl Into<String>,
) -> Result<Lockfile, ResolveError> {
    let mut lockfile = Lockfile::new(generated);
    let mut visited = HashSet::new();
    for reference in refs {
        // boxed so the recursive future in resolve_one has a bounded size
        Box::pin(resolve_one(reference, source, &mut lockfile, &mut visited, 0)).await?;
    }
    Ok(lockfile)
}

async fn resolve_one(
    reference: &ActionReference,
    source: &dyn RemoteSource,
    lockfile: &mut Lockfile,
    visited: &mut HashSet<String>,
    depth: u32,
) -> Result<(), ResolveError> {
    if visited.contains(&reference.literal) {
        return Ok(());
    }
    if depth > MAX_DEPTH {
        return Err(ResolveError::DepthExceeded(reference.literal.clone()));
    }
    visited.insert(reference.literal.clone());

    log::debug!("resolving {}", reference.literal);
    let sha = source
        .resolve_ref(&reference.owner, &reference.repo, &reference.version)
        .await
        .map_err(|source| ResolveError::Remote {
            reference: reference.literal.clone(),
            source,
        })?;

    let integrity = match source
        .archive_sha256(&reference.owner, &reference.repo, &sha)
        .await
    {
        Ok(digest) => digest,
        Err(error) => {
            log::warn!("could not digest archive for {}: {error}", reference.literal);
            String::new()
        }
    };

    let descriptor = source
        .get_action_descriptor(
            &reference.owner,
            &reference.repo,
            &sha,
            reference.path.as_deref(),
        )
        .await
        .unwrap_or_else(|error| {
            log::warn!("could not fetch descriptor for {}: {error}", reference.literal);
            None
        });

    let mut dependencies = Vec::new();
    if let Some(descriptor) = descriptor {
        for raw in descriptor.nested_uses() {
            let Ok(Some(dep_ref)) = parse_action_ref(&raw) else {
                continue;
            };
            Box::pin(resolve_one(&dep_ref, source, lockfile, visited, depth + 1)).await?;
            let locked = lockfile.find(&dep_ref.full_name(), &dep_ref.version);
            dependencies.push(LockedDependency {
                reference: dep_ref.literal.clone(),
                sha: locked.map(|l| l.sha.clone()).unwrap_or_default(),
                integrity: locked.map(|l| l.integrity.clone()).unwrap_or_default(),
            });
        }
    }

    lockfile.insert(
        reference.full_name(),
        LockedAction {
            version: reference.version.clone(),
            sha,
            integrity,
            dependencies,
        },
    );
    Ok(())
}
