pub mod descriptor;
pub mod lockfile;
pub mod reference;
pub mod resolver;
pub mod verify;
pub mod workflow;

pub use descriptor::ActionDescriptor;
pub use lockfile::{Lockfile, LockedAction, LockedDependency};
pub use reference::{ActionReference, ReferenceError, is_sha, is_skip_reference, parse_action_ref};
pub use resolver::{MAX_DEPTH, RemoteSource, ResolveError, resolve_all};
pub use verify::{CheckResult, VerifyResult, verify, verify_integrity, verify_shas};
pub use workflow::{Job, Step, Workflow, WorkflowError, extract_action_refs, parse_workflow};
