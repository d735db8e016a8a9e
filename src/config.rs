//! Invocation-scoped configuration, loaded once from the environment.

use std::env;
use std::time::Duration;

/// Default cap on in-flight remote requests when not overridden.
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Default per-request HTTP timeout when not overridden.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings for a single `generate`/`verify`/`list` invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Code-hosting-service credential, used for every outbound request
    /// when present. `None` selects unauthenticated access.
    pub credential: Option<String>,
    /// Cap on in-flight remote requests.
    pub max_concurrent: usize,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Config {
    /// Loads credential from `GITHUB_TOKEN`; other fields take their
    /// defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            credential: env::var("GITHUB_TOKEN").ok(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// True when a credential was found.
    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn reads_credential_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { env::set_var("GITHUB_TOKEN", "test-token") };
        let config = Config::from_env();
        assert!(config.has_credential());
        assert_eq!(config.credential.as_deref(), Some("test-token"));
        unsafe { env::remove_var("GITHUB_TOKEN") };
    }

    #[test]
    fn unauthenticated_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe { env::remove_var("GITHUB_TOKEN") };
        let config = Config::from_env();
        assert!(!config.has_credential());
    }

    #[test]
    fn defaults_are_sane() {
        let config = Config {
            credential: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };
        assert_eq!(config.max_concurrent, 8);
    }
}
