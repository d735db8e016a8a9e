//! Workflow document shape and reference extraction. Parsing a single
//! already-read YAML string is pure; walking a directory of files lives in
//! [`crate::infrastructure::workflow_fs`].

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::reference::{ActionReference, is_skip_reference, parse_action_ref};

/// Errors from decoding a single workflow document.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("failed to parse workflow YAML")]
    Parse(#[source] Box<serde_saphyr::Error>),

    #[error("invalid regex pattern")]
    Regex(#[from] regex::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    /// Keyed by job name, but iterated in document order — `IndexMap`
    /// preserves insertion order, unlike `BTreeMap`.
    #[serde(default)]
    pub jobs: IndexMap<String, Job>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub uses: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub uses: Option<String>,
}

/// Parses one workflow document's YAML contents.
///
/// # Errors
///
/// Returns an error if `contents` does not decode as the workflow shape.
pub fn parse_workflow(contents: &str) -> Result<Workflow, WorkflowError> {
    serde_saphyr::from_str(contents).map_err(|e| WorkflowError::Parse(Box::new(e)))
}

/// Every `uses` value appearing in `workflow`, job-level and step-level, in
/// document order.
#[must_use]
pub fn raw_uses_values(workflow: &Workflow) -> Vec<String> {
    let mut values = Vec::new();
    for job in workflow.jobs.values() {
        if let Some(uses) = &job.uses {
            values.push(uses.clone());
        }
        for step in &job.steps {
            if let Some(uses) = &step.uses {
                values.push(uses.clone());
            }
        }
    }
    values
}

/// Extracts the deduplicated, order-preserved set of action references from
/// a sequence of already-parsed workflows.
///
/// Skip-cases (`./local`, `docker://image`) and unparseable `uses` strings
/// are silently omitted — callers that want diagnostics should call
/// [`parse_action_ref`] on the raw values themselves.
#[must_use]
pub fn extract_action_refs(workflows: &[Workflow]) -> Vec<ActionReference> {
    let mut seen = std::collections::HashSet::new();
    let mut refs = Vec::new();
    for workflow in workflows {
        for raw in raw_uses_values(workflow) {
            if is_skip_reference(&raw) || !seen.insert(raw.clone()) {
                continue;
            }
            match parse_action_ref(&raw) {
                Ok(Some(reference)) => refs.push(reference),
                Ok(None) => log::warn!("skipping malformed action reference: {raw}"),
                Err(error) => log::warn!("skipping {raw}: {error}"),
            }
        }
    }
    refs
}
