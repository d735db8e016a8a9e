pub mod discovery;
pub mod limiter;
pub mod lockfile_fs;
pub mod remote;
pub mod workflow_fs;

pub use discovery::{CONVENTIONAL_WORKFLOW_DIR, DiscoveryError, find_workflow_dir};
pub use limiter::Limiter;
pub use lockfile_fs::{LOCKFILE_NAME, LockfileFsError, read_lockfile, write_lockfile};
pub use remote::{GithubSource, RemoteError};
pub use workflow_fs::{LoadedWorkflow, WorkflowFsError, parse_workflow_dir};
