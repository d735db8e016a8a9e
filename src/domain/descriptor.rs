//! Action descriptor shapes: `action.yml` (composite actions) and the
//! `jobs` shape of a reusable workflow, minimally parsed for the one field
//! the resolver needs out of each: nested `uses` references.

use indexmap::IndexMap;
use serde::Deserialize;

/// The result of fetching and decoding an action's metadata document.
#[derive(Debug, Clone)]
pub enum ActionDescriptor {
    /// `runs.using: "composite"`, with an ordered list of steps.
    Composite { steps: Vec<DescriptorStep> },
    /// A reusable workflow, keyed by job name.
    ReusableWorkflow { jobs: Vec<DescriptorJob> },
    /// A descriptor that names a runtime (`node20`, `docker`, ...) with no
    /// further action dependencies.
    Other,
}

impl ActionDescriptor {
    /// Every nested `uses` reference, in discovery order, regardless of
    /// whether this descriptor is composite or a reusable workflow.
    #[must_use]
    pub fn nested_uses(&self) -> Vec<String> {
        match self {
            Self::Composite { steps } => steps.iter().filter_map(|s| s.uses.clone()).collect(),
            Self::ReusableWorkflow { jobs } => jobs
                .iter()
                .flat_map(|j| {
                    j.uses
                        .iter()
                        .cloned()
                        .chain(j.steps.iter().filter_map(|s| s.uses.clone()))
                })
                .collect(),
            Self::Other => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescriptorStep {
    pub uses: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescriptorJob {
    #[serde(default)]
    pub uses: Option<String>,
    #[serde(default)]
    pub steps: Vec<DescriptorStep>,
}

/// Raw shape of `action.yml`'s `runs` block, sufficient to classify it.
#[derive(Debug, Deserialize)]
struct RawRuns {
    using: Option<String>,
    #[serde(default)]
    steps: Vec<DescriptorStep>,
}

#[derive(Debug, Deserialize)]
struct RawActionYml {
    runs: Option<RawRuns>,
}

#[derive(Debug, Deserialize)]
struct RawJob {
    #[serde(default)]
    uses: Option<String>,
    #[serde(default)]
    steps: Vec<DescriptorStep>,
}

#[derive(Debug, Deserialize)]
struct RawReusableWorkflow {
    /// Discovery order matters here (§4.4); `IndexMap` preserves it where a
    /// `BTreeMap` would reorder jobs alphabetically.
    jobs: IndexMap<String, RawJob>,
}

/// Decodes the bytes of an `action.yml`/`action.yaml` file into a descriptor.
///
/// Returns `None` when the document has neither a composite `runs` block nor
/// a `jobs` mapping — i.e. an ordinary JavaScript/Docker/composite-less
/// action descriptor with no nested dependencies.
#[must_use]
pub fn parse_action_yml(contents: &str) -> Option<ActionDescriptor> {
    if let Ok(raw) = serde_saphyr::from_str::<RawActionYml>(contents) {
        if let Some(runs) = raw.runs {
            return Some(match runs.using.as_deref() {
                Some("composite") => ActionDescriptor::Composite { steps: runs.steps },
                _ => ActionDescriptor::Other,
            });
        }
    }
    if let Ok(raw) = serde_saphyr::from_str::<RawReusableWorkflow>(contents) {
        let jobs = raw
            .jobs
            .into_values()
            .map(|j| DescriptorJob {
                uses: j.uses,
                steps: j.steps,
            })
            .collect();
        return Some(ActionDescriptor::ReusableWorkflow { jobs });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_composite_action() {
        let yaml = r"
runs:
  using: composite
  steps:
    - uses: actions/setup-node@v4
    - run: echo hi
";
        let descriptor = parse_action_yml(yaml).unwrap();
        assert_eq!(
            descriptor.nested_uses(),
            vec!["actions/setup-node@v4".to_owned()]
        );
    }

    #[test]
    fn non_composite_runs_has_no_dependencies() {
        let yaml = "runs:\n  using: node20\n  main: index.js\n";
        let descriptor = parse_action_yml(yaml).unwrap();
        assert!(descriptor.nested_uses().is_empty());
    }

    #[test]
    fn parses_reusable_workflow_jobs() {
        let yaml = r"
jobs:
  build:
    uses: octo/shared/.github/workflows/build.yml@v1
  test:
    steps:
      - uses: actions/checkout@v4
";
        let descriptor = parse_action_yml(yaml).unwrap();
        let mut uses = descriptor.nested_uses();
        uses.sort();
        assert_eq!(
            uses,
            vec![
                "actions/checkout@v4".to_owned(),
                "octo/shared/.github/workflows/build.yml@v1".to_owned(),
            ]
        );
    }

    #[test]
    fn reusable_workflow_jobs_follow_document_order_not_alphabetical() {
        let yaml = r"
jobs:
  zzz-job:
    uses: octo/shared/.github/workflows/zzz.yml@v1
  aaa-job:
    uses: octo/shared/.github/workflows/aaa.yml@v1
";
        let descriptor = parse_action_yml(yaml).unwrap();
        assert_eq!(
            descriptor.nested_uses(),
            vec![
                "octo/shared/.github/workflows/zzz.yml@v1".to_owned(),
                "octo/shared/.github/workflows/aaa.yml@v1".to_owned(),
            ]
        );
    }

    #[test]
    fn unrecognized_document_returns_none() {
        assert!(parse_action_yml("name: just-a-name\n").is_none());
    }
}
