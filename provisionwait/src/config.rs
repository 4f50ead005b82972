//! Polling configuration with type-safe validation.
//!
//! Timeouts and intervals use `nutype` validation so an invalid value is
//! rejected when the configuration is parsed, never discovered mid-wait.
//! The configuration is plain data passed to the presets; provisionwait
//! keeps no process-wide defaults.

use std::time::Duration;

use nutype::nutype;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::MaxAttempts;

/// Wait budget in whole seconds.
///
/// Validated to be between 1 second and 24 hours.
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 86_400),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct TimeoutSecs(u64);

impl TimeoutSecs {
    /// Convert to Duration for use with tokio timers.
    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.into_inner())
    }
}

/// Poll cadence in whole seconds.
///
/// Validated to be between 1 second and 1 hour; a zero interval would
/// hammer the API.
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 3_600),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct IntervalSecs(u64);

impl IntervalSecs {
    /// Convert to Duration for use with tokio timers.
    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.into_inner())
    }
}

/// Backoff step in whole seconds, at most 1 hour. Zero is allowed.
#[nutype(
    validate(less_or_equal = 3_600),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct BackoffSecs(u64);

impl BackoffSecs {
    /// Convert to Duration for use with tokio timers.
    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.into_inner())
    }
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON, names an unknown option, or holds
    /// an out-of-range value.
    #[error("malformed polling configuration: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A poll cadence is longer than the budget it polls within.
    #[error("{interval_field} ({interval}s) must not exceed {timeout_field} ({timeout}s)")]
    IntervalExceedsTimeout {
        /// Name of the interval option.
        interval_field: &'static str,
        /// Its value in seconds.
        interval: u64,
        /// Name of the timeout option.
        timeout_field: &'static str,
        /// Its value in seconds.
        timeout: u64,
    },

    /// The conflict backoff would start above its own cap.
    #[error("conflict_backoff_start ({start}s) exceeds conflict_backoff_max ({max}s)")]
    BackoffStartExceedsMax {
        /// Start value in seconds.
        start: u64,
        /// Cap in seconds.
        max: u64,
    },
}

/// Timeouts and cadences used by the presets.
///
/// Every option may be omitted from a configuration document; omitted
/// options keep their default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollingConfig {
    /// Budget for an instance to build (default 1800 s).
    pub database_build_timeout: TimeoutSecs,
    /// Budget for an instance restored from a backup (default 3600 s).
    pub database_restore_timeout: TimeoutSecs,
    /// Budget for a backup to complete (default 600 s).
    pub backup_wait_timeout: TimeoutSecs,
    /// Cadence of status polls (default 10 s).
    pub status_poll_interval: IntervalSecs,
    /// Budget for confirming a dependent resource is gone (default 15 s).
    pub removal_check_timeout: TimeoutSecs,
    /// Cadence of removal checks (default 3 s).
    pub removal_check_interval: IntervalSecs,
    /// Delete attempts on conflict, the first one included (default 15).
    pub conflict_retry_attempts: MaxAttempts,
    /// Delay after the first conflict (default 1 s).
    pub conflict_backoff_start: BackoffSecs,
    /// Growth of the delay per further conflict (default 1 s).
    pub conflict_backoff_increment: BackoffSecs,
    /// Cap on the delay between conflicting attempts (default 5 s).
    pub conflict_backoff_max: BackoffSecs,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            database_build_timeout: TimeoutSecs::try_new(1800).expect("1800 is a valid timeout"),
            database_restore_timeout: TimeoutSecs::try_new(3600).expect("3600 is a valid timeout"),
            backup_wait_timeout: TimeoutSecs::try_new(600).expect("600 is a valid timeout"),
            status_poll_interval: IntervalSecs::try_new(10).expect("10 is a valid interval"),
            removal_check_timeout: TimeoutSecs::try_new(15).expect("15 is a valid timeout"),
            removal_check_interval: IntervalSecs::try_new(3).expect("3 is a valid interval"),
            conflict_retry_attempts: MaxAttempts::try_new(15).expect("15 is a valid attempt count"),
            conflict_backoff_start: BackoffSecs::try_new(1).expect("1 is a valid backoff"),
            conflict_backoff_increment: BackoffSecs::try_new(1).expect("1 is a valid backoff"),
            conflict_backoff_max: BackoffSecs::try_new(5).expect("5 is a valid backoff"),
        }
    }
}

impl PollingConfig {
    /// Parse a JSON configuration document and check cross-field rules.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the rules that span several options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let interval = self.status_poll_interval.into_inner();
        let timeouts = [
            ("database_build_timeout", self.database_build_timeout),
            ("database_restore_timeout", self.database_restore_timeout),
            ("backup_wait_timeout", self.backup_wait_timeout),
        ];
        for (timeout_field, timeout) in timeouts {
            if interval > timeout.into_inner() {
                return Err(ConfigError::IntervalExceedsTimeout {
                    interval_field: "status_poll_interval",
                    interval,
                    timeout_field,
                    timeout: timeout.into_inner(),
                });
            }
        }

        let removal_interval = self.removal_check_interval.into_inner();
        let removal_timeout = self.removal_check_timeout.into_inner();
        if removal_interval > removal_timeout {
            return Err(ConfigError::IntervalExceedsTimeout {
                interval_field: "removal_check_interval",
                interval: removal_interval,
                timeout_field: "removal_check_timeout",
                timeout: removal_timeout,
            });
        }

        let start = self.conflict_backoff_start.into_inner();
        let max = self.conflict_backoff_max.into_inner();
        if start > max {
            return Err(ConfigError::BackoffStartExceedsMax { start, max });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = PollingConfig::from_json_str("{}").expect("valid config");
        assert_eq!(config, PollingConfig::default());
    }

    #[test]
    fn defaults_are_consistent() {
        assert!(PollingConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_document_overrides_named_options() {
        let config = PollingConfig::from_json_str(
            r#"{"database_build_timeout": 900, "status_poll_interval": 5}"#,
        )
        .expect("valid config");

        assert_eq!(
            config.database_build_timeout.as_duration(),
            Duration::from_secs(900)
        );
        assert_eq!(
            config.status_poll_interval.as_duration(),
            Duration::from_secs(5)
        );
        assert_eq!(
            config.backup_wait_timeout.as_duration(),
            Duration::from_secs(600)
        );
    }

    #[test]
    fn zero_interval_is_rejected_while_parsing() {
        let result = PollingConfig::from_json_str(r#"{"status_poll_interval": 0}"#);
        assert!(matches!(result, Err(ConfigError::Malformed(_))));
    }

    #[test]
    fn unknown_options_are_rejected() {
        let result = PollingConfig::from_json_str(r#"{"build_timeout": 30}"#);
        assert!(matches!(result, Err(ConfigError::Malformed(_))));
    }

    #[test]
    fn interval_longer_than_timeout_is_rejected() {
        let result = PollingConfig::from_json_str(
            r#"{"status_poll_interval": 120, "backup_wait_timeout": 60}"#,
        );

        assert!(matches!(
            result,
            Err(ConfigError::IntervalExceedsTimeout {
                timeout_field: "backup_wait_timeout",
                ..
            })
        ));
    }

    #[test]
    fn backoff_start_above_max_is_rejected() {
        let result = PollingConfig::from_json_str(
            r#"{"conflict_backoff_start": 10, "conflict_backoff_max": 5}"#,
        );

        assert!(matches!(
            result,
            Err(ConfigError::BackoffStartExceedsMax { start: 10, max: 5 })
        ));
    }
}
