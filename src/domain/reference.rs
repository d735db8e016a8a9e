//! Action reference parsing: `owner/repo[/path]@ref` and its skip-cases.

use std::fmt::{self, Display, Formatter};

use regex::Regex;
use thiserror::Error;

/// A parsed `owner/repo[/path]@ref` action reference.
///
/// `literal` preserves the original string verbatim, used for deduplication
/// and for the lockfile's `dependencies[].ref` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionReference {
    pub owner: String,
    pub repo: String,
    pub path: Option<String>,
    pub version: String,
    pub literal: String,
}

impl ActionReference {
    /// `owner/repo[/path]`, used as the lockfile's top-level key.
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.path {
            Some(path) => format!("{}/{}/{path}", self.owner, self.repo),
            None => format!("{}/{}", self.owner, self.repo),
        }
    }

    /// `owner/repo`, without any sub-path.
    #[must_use]
    pub fn repo_full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// True when `version` is already a 40-hex commit identifier.
    #[must_use]
    pub fn is_sha(&self) -> bool {
        is_sha(&self.version)
    }
}

impl Display for ActionReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literal)
    }
}

/// Errors from reference parsing. Non-fatal: callers report and skip.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("invalid regex pattern")]
    Regex(#[from] regex::Error),

    #[error("malformed action reference: {0}")]
    Malformed(String),
}

/// True when `raw` begins with a same-repository or container-image prefix
/// that the resolver must never attempt to fetch.
#[must_use]
pub fn is_skip_reference(raw: &str) -> bool {
    raw.starts_with("./") || raw.starts_with("docker://")
}

/// True when `s` is a 40-character lowercase-hex commit identifier.
#[must_use]
pub fn is_sha(s: &str) -> bool {
    s.len() == 40 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

const REFERENCE_PATTERN: &str = r"^([^/@]+)/([^/@]+)(?:/([^@]+))?@(.+)$";

/// Parses `owner/repo[/path]@ref`.
///
/// Returns `Ok(None)` for skip-cases (`./local`, `docker://image`) and for
/// strings that simply don't match the grammar — both are non-fatal and the
/// caller decides whether to report them.
///
/// # Errors
///
/// Returns an error only if the internal regex fails to compile, which would
/// indicate a programming error rather than malformed input.
pub fn parse_action_ref(raw: &str) -> Result<Option<ActionReference>, ReferenceError> {
    if is_skip_reference(raw) {
        return Ok(None);
    }
    let re = Regex::new(REFERENCE_PATTERN)?;
    let Some(caps) = re.captures(raw) else {
        return Ok(None);
    };
    let owner = caps.get(1).map_or("", |m| m.as_str()).to_owned();
    let repo = caps.get(2).map_or("", |m| m.as_str()).to_owned();
    let path = caps.get(3).map(|m| m.as_str().to_owned());
    let version = caps.get(4).map_or("", |m| m.as_str()).to_owned();
    if owner.is_empty() || repo.is_empty() || version.is_empty() {
        return Ok(None);
    }
    Ok(Some(ActionReference {
        owner,
        repo,
        path,
        version,
        literal: raw.to_owned(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_reference() {
        let r = parse_action_ref("actions/checkout@v4").unwrap().unwrap();
        assert_eq!(r.owner, "actions");
        assert_eq!(r.repo, "checkout");
        assert_eq!(r.path, None);
        assert_eq!(r.version, "v4");
        assert_eq!(r.full_name(), "actions/checkout");
    }

    #[test]
    fn parses_reference_with_path() {
        let r = parse_action_ref("octo/monorepo/sub/action@v1")
            .unwrap()
            .unwrap();
        assert_eq!(r.owner, "octo");
        assert_eq!(r.repo, "monorepo");
        assert_eq!(r.path.as_deref(), Some("sub/action"));
        assert_eq!(r.full_name(), "octo/monorepo/sub/action");
    }

    #[test]
    fn parses_sha_pinned_reference() {
        let sha = "b4ffde65f46336ab88eb53be808477a3936bae11";
        let r = parse_action_ref(&format!("actions/checkout@{sha}"))
            .unwrap()
            .unwrap();
        assert!(r.is_sha());
    }

    #[test]
    fn skips_local_action() {
        assert_eq!(parse_action_ref("./local-action").unwrap(), None);
    }

    #[test]
    fn skips_docker_action() {
        assert_eq!(parse_action_ref("docker://alpine:3.18").unwrap(), None);
    }

    #[test]
    fn rejects_malformed_reference() {
        assert_eq!(parse_action_ref("not-a-reference").unwrap(), None);
        assert_eq!(parse_action_ref("owner/repo@").unwrap(), None);
        assert_eq!(parse_action_ref("owner@version").unwrap(), None);
    }

    #[test]
    fn round_trips_literal() {
        let raw = "owner/repo/sub@v2.1.0";
        let r = parse_action_ref(raw).unwrap().unwrap();
        assert_eq!(r.literal, raw);
        assert_eq!(r.to_string(), raw);
    }

    #[test]
    fn is_sha_rejects_wrong_length() {
        assert!(!is_sha("abc123"));
        assert!(!is_sha(&"a".repeat(41)));
    }
}
