//! Reads and atomically writes the lockfile JSON document.

use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::domain::lockfile::{LOCKFILE_VERSION, Lockfile};

/// Conventional lockfile file name.
pub const LOCKFILE_NAME: &str = "actions.lock.json";

/// Errors from reading or writing the lockfile on disk.
#[derive(Debug, Error)]
pub enum LockfileFsError {
    #[error("failed to read lockfile: {}", path.display())]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write lockfile: {}", path.display())]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse lockfile: {}", path.display())]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize lockfile")]
    Serialize(#[source] serde_json::Error),

    #[error("unsupported lockfile version {found} at {}, expected {LOCKFILE_VERSION}", path.display())]
    UnsupportedVersion { path: std::path::PathBuf, found: u32 },
}

/// Reads and decodes the lockfile at `path`.
///
/// # Errors
///
/// Returns [`LockfileFsError::Read`] if the file cannot be read,
/// [`LockfileFsError::Parse`] if it is not valid JSON matching the lockfile
/// shape, or [`LockfileFsError::UnsupportedVersion`] if its `version` field
/// is not [`LOCKFILE_VERSION`].
pub fn read_lockfile(path: &Path) -> Result<Lockfile, LockfileFsError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LockfileFsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let lockfile: Lockfile =
        serde_json::from_str(&contents).map_err(|source| LockfileFsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    if lockfile.version != LOCKFILE_VERSION {
        return Err(LockfileFsError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: lockfile.version,
        });
    }
    Ok(lockfile)
}

/// Serializes `lockfile` to canonical JSON and writes it atomically:
/// write-then-`fsync`-then-rename into `path`.
///
/// # Errors
///
/// Returns [`LockfileFsError::Serialize`] if encoding fails, or
/// [`LockfileFsError::Write`] if the temporary file cannot be written,
/// synced, or renamed into place.
pub fn write_lockfile(path: &Path, lockfile: &Lockfile) -> Result<(), LockfileFsError> {
    let json = serde_json::to_string_pretty(lockfile).map_err(LockfileFsError::Serialize)?;
    let temp_path = path.with_extension("json.tmp");

    let write_result = (|| -> std::io::Result<()> {
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    })();

    write_result.map_err(|source| LockfileFsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCKFILE_NAME);
        let mut lockfile = Lockfile::new("2024-01-01T00:00:00Z");
        lockfile.insert(
            "actions/checkout".to_owned(),
            crate::domain::lockfile::LockedAction {
                version: "v4".to_owned(),
                sha: "a".repeat(40),
                integrity: "sha256-ZGlnZXN0".to_owned(),
                dependencies: Vec::new(),
            },
        );
        write_lockfile(&path, &lockfile).unwrap();
        let read_back = read_lockfile(&path).unwrap();
        assert_eq!(read_back, lockfile);
    }

    #[test]
    fn rejects_unsupported_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCKFILE_NAME);
        std::fs::write(&path, r#"{"version":2,"generated":"x","actions":{}}"#).unwrap();
        let error = read_lockfile(&path).unwrap_err();
        assert!(matches!(error, LockfileFsError::UnsupportedVersion { .. }));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCKFILE_NAME);
        let lockfile = Lockfile::new("2024-01-01T00:00:00Z");
        write_lockfile(&path, &lockfile).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
    }
}
