//! The lockfile data model: `Lockfile`, `LockedAction`, `LockedDependency`.
//!
//! This module only defines the shape and its invariants; reading and
//! writing the JSON document lives in
//! [`crate::infrastructure::lockfile_fs`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current lockfile schema version. A document with any other `version`
/// field is rejected on read.
pub const LOCKFILE_VERSION: u32 = 1;

/// A resolved, transitive dependency of a `LockedAction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedDependency {
    #[serde(rename = "ref")]
    pub reference: String,
    pub sha: String,
    #[serde(default)]
    pub integrity: String,
}

/// One resolved version of a single action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedAction {
    pub version: String,
    pub sha: String,
    #[serde(default)]
    pub integrity: String,
    #[serde(default)]
    pub dependencies: Vec<LockedDependency>,
}

impl LockedAction {
    /// True when `sha` is a well-formed 40-hex commit identifier.
    #[must_use]
    pub fn has_valid_sha(&self) -> bool {
        crate::domain::reference::is_sha(&self.sha)
    }

    /// True when `integrity` is empty or matches the SRI `sha256-...` shape.
    #[must_use]
    pub fn has_valid_integrity(&self) -> bool {
        self.integrity.is_empty() || is_sri_sha256(&self.integrity)
    }
}

/// True when `s` matches `sha256-[A-Za-z0-9+/]+=*`.
#[must_use]
pub fn is_sri_sha256(s: &str) -> bool {
    let Some(rest) = s.strip_prefix("sha256-") else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }
    let mut chars = rest.chars();
    let body_ok = chars
        .by_ref()
        .take_while(|c| *c != '=')
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/');
    let pad_ok = chars.all(|c| c == '=');
    body_ok && pad_ok
}

/// The full lockfile document: every direct and transitive action
/// dependency pinned to a commit identifier and integrity digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    pub version: u32,
    pub generated: String,
    pub actions: BTreeMap<String, Vec<LockedAction>>,
}

impl Lockfile {
    /// An empty lockfile stamped with the given RFC-3339 timestamp.
    #[must_use]
    pub fn new(generated: impl Into<String>) -> Self {
        Self {
            version: LOCKFILE_VERSION,
            generated: generated.into(),
            actions: BTreeMap::new(),
        }
    }

    /// Inserts a `LockedAction` under `full_name`, appending to that name's
    /// version list unless an entry with the same `version` already exists.
    pub fn insert(&mut self, full_name: String, action: LockedAction) {
        let versions = self.actions.entry(full_name).or_default();
        if !versions.iter().any(|v| v.version == action.version) {
            versions.push(action);
        }
    }

    /// Finds the locked entry for `full_name`/`version`, if present.
    #[must_use]
    pub fn find(&self, full_name: &str, version: &str) -> Option<&LockedAction> {
        self.actions
            .get(full_name)
            .and_then(|versions| versions.iter().find(|v| v.version == version))
    }

    /// Every `(full_name, version)` pair recorded at the top level.
    #[must_use]
    pub fn all_pairs(&self) -> Vec<(String, String)> {
        self.actions
            .iter()
            .flat_map(|(name, versions)| {
                versions
                    .iter()
                    .map(move |v| (name.clone(), v.version.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent_per_version() {
        let mut lock = Lockfile::new("2024-01-01T00:00:00Z");
        lock.insert(
            "actions/checkout".to_owned(),
            LockedAction {
                version: "v4".to_owned(),
                sha: "a".repeat(40),
                integrity: String::new(),
                dependencies: Vec::new(),
            },
        );
        lock.insert(
            "actions/checkout".to_owned(),
            LockedAction {
                version: "v4".to_owned(),
                sha: "b".repeat(40),
                integrity: String::new(),
                dependencies: Vec::new(),
            },
        );
        assert_eq!(lock.actions.get("actions/checkout").unwrap().len(), 1);
        assert_eq!(lock.find("actions/checkout", "v4").unwrap().sha, "a".repeat(40));
    }

    #[test]
    fn multiple_versions_coexist() {
        let mut lock = Lockfile::new("2024-01-01T00:00:00Z");
        for version in ["v3", "v4"] {
            lock.insert(
                "actions/checkout".to_owned(),
                LockedAction {
                    version: version.to_owned(),
                    sha: "a".repeat(40),
                    integrity: String::new(),
                    dependencies: Vec::new(),
                },
            );
        }
        assert_eq!(lock.actions.get("actions/checkout").unwrap().len(), 2);
    }

    #[test]
    fn sri_format_validation() {
        assert!(is_sri_sha256("sha256-YWJjZGVm"));
        assert!(is_sri_sha256("sha256-YWJj=="));
        assert!(!is_sri_sha256("sha256-"));
        assert!(!is_sri_sha256("sha1-YWJj"));
        assert!(!is_sri_sha256(""));
    }

    #[test]
    fn serialization_is_deterministic_regardless_of_insertion_order() {
        let mut first = Lockfile::new("2024-01-01T00:00:00Z");
        first.insert(
            "actions/setup-node".to_owned(),
            LockedAction {
                version: "v4".to_owned(),
                sha: "a".repeat(40),
                integrity: String::new(),
                dependencies: Vec::new(),
            },
        );
        first.insert(
            "actions/checkout".to_owned(),
            LockedAction {
                version: "v4".to_owned(),
                sha: "b".repeat(40),
                integrity: String::new(),
                dependencies: Vec::new(),
            },
        );

        let mut second = Lockfile::new("2024-01-01T00:00:00Z");
        second.insert(
            "actions/checkout".to_owned(),
            LockedAction {
                version: "v4".to_owned(),
                sha: "b".repeat(40),
                integrity: String::new(),
                dependencies: Vec::new(),
            },
        );
        second.insert(
            "actions/setup-node".to_owned(),
            LockedAction {
                version: "v4".to_owned(),
                sha: "a".repeat(40),
                integrity: String::new(),
                dependencies: Vec::new(),
            },
        );

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn locked_action_validity_checks() {
        let good = LockedAction {
            version: "v4".to_owned(),
            sha: "a".repeat(40),
            integrity: "sha256-YWJj".to_owned(),
            dependencies: Vec::new(),
        };
        assert!(good.has_valid_sha());
        assert!(good.has_valid_integrity());

        let bad = LockedAction {
            version: "v4".to_owned(),
            sha: "too-short".to_owned(),
            integrity: "not-sri".to_owned(),
            dependencies: Vec::new(),
        };
        assert!(!bad.has_valid_sha());
        assert!(!bad.has_valid_integrity());
    }
}
