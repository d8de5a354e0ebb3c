//! Configuration types for the dyndns service
//!
//! Configuration is constructed once at process startup and threaded
//! explicitly into component constructors; no component reads ambient
//! environment state at call time.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Project/tenant identifier scoping the credential store and zones
    pub project: String,

    /// Socket address the HTTP endpoint listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Propagation-wait tuning
    #[serde(default)]
    pub propagation: PropagationConfig,
}

impl ServiceConfig {
    /// Create a configuration for a project with defaults elsewhere
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            listen_addr: default_listen_addr(),
            propagation: PropagationConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.project.is_empty() {
            return Err(crate::Error::config("project identifier cannot be empty"));
        }

        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(crate::Error::config(format!(
                "listen address '{}' is not a valid socket address",
                self.listen_addr
            )));
        }

        self.propagation.validate()
    }
}

/// Tuning for the bounded propagation wait
///
/// The reconciler polls an accepted change's status starting at
/// `poll_initial_ms`, doubling the interval up to `poll_max_ms`, and fails
/// with [`crate::Error::PropagationTimeout`] once `timeout_secs` has
/// elapsed without completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationConfig {
    /// First poll interval, in milliseconds
    #[serde(default = "default_poll_initial_ms")]
    pub poll_initial_ms: u64,

    /// Upper bound the poll interval backs off to, in milliseconds
    #[serde(default = "default_poll_max_ms")]
    pub poll_max_ms: u64,

    /// Overall deadline, in seconds, before the wait fails
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl PropagationConfig {
    /// First poll interval as a [`Duration`]
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.poll_initial_ms)
    }

    /// Poll interval cap as a [`Duration`]
    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.poll_max_ms)
    }

    /// Overall deadline as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the propagation tuning
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(100..=10_000).contains(&self.poll_initial_ms) {
            return Err(crate::Error::config(format!(
                "propagation poll interval must be between 100 and 10000 ms, got {}",
                self.poll_initial_ms
            )));
        }

        if self.poll_max_ms < self.poll_initial_ms {
            return Err(crate::Error::config(format!(
                "propagation poll cap ({} ms) must not be below the initial interval ({} ms)",
                self.poll_max_ms, self.poll_initial_ms
            )));
        }

        if !(5..=600).contains(&self.timeout_secs) {
            return Err(crate::Error::config(format!(
                "propagation timeout must be between 5 and 600 seconds, got {}",
                self.timeout_secs
            )));
        }

        Ok(())
    }
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            poll_initial_ms: default_poll_initial_ms(),
            poll_max_ms: default_poll_max_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_listen_addr() -> String {
    "[::]:8080".to_string()
}

fn default_poll_initial_ms() -> u64 {
    500
}

fn default_poll_max_ms() -> u64 {
    8_000
}

fn default_timeout_secs() -> u64 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServiceConfig::new("example-project");
        assert!(config.validate().is_ok());
        assert_eq!(config.propagation.poll_initial_ms, 500);
        assert_eq!(config.propagation.timeout_secs, 120);
    }

    #[test]
    fn test_empty_project_rejected() {
        let config = ServiceConfig::new("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_listen_addr_rejected() {
        let mut config = ServiceConfig::new("example-project");
        config.listen_addr = "not-an-addr".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_cap_below_initial_rejected() {
        let config = PropagationConfig {
            poll_initial_ms: 1_000,
            poll_max_ms: 500,
            timeout_secs: 120,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_range_enforced() {
        let config = PropagationConfig {
            poll_initial_ms: 500,
            poll_max_ms: 8_000,
            timeout_secs: 0,
        };
        assert!(config.validate().is_err());

        let config = PropagationConfig {
            timeout_secs: 601,
            ..PropagationConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
