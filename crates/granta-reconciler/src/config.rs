//! Worker configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the reconciliation worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Seconds between reconciliation passes.
    #[serde(default = "default_run_interval_secs")]
    pub run_interval_secs: u64,

    /// Maximum-run-duration budget for one pass, in seconds. The lock TTL
    /// is this budget plus the padding, so the lock outlives a slow pass.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Safety padding added to the lock TTL, in seconds.
    #[serde(default = "default_lock_padding_secs")]
    pub lock_padding_secs: u64,

    /// Whether organizational accounts are reconciled too.
    #[serde(default = "default_include_orgs")]
    pub include_orgs: bool,
}

fn default_run_interval_secs() -> u64 {
    5 * 60
}

fn default_run_timeout_secs() -> u64 {
    5 * 60
}

fn default_lock_padding_secs() -> u64 {
    60
}

fn default_include_orgs() -> bool {
    true
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            run_interval_secs: default_run_interval_secs(),
            run_timeout_secs: default_run_timeout_secs(),
            lock_padding_secs: default_lock_padding_secs(),
            include_orgs: default_include_orgs(),
        }
    }
}

impl WorkerConfig {
    /// Interval between pass attempts.
    #[must_use]
    pub fn run_interval(&self) -> Duration {
        Duration::from_secs(self.run_interval_secs)
    }

    /// Lock TTL: run budget plus safety padding.
    #[must_use]
    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs + self.lock_padding_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_five_minute_cadence() {
        let config = WorkerConfig::default();
        assert_eq!(config.run_interval(), Duration::from_secs(300));
        assert_eq!(config.lock_ttl(), Duration::from_secs(360));
        assert!(config.include_orgs);
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: WorkerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.run_timeout_secs, 300);
        assert_eq!(config.lock_padding_secs, 60);
    }
}
