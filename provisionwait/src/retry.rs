//! Retry configuration for deleting resources that may briefly refuse.
//!
//! Networking services can be slow to release ports from a network or
//! subnet after the instance using them is gone, and answer deletes with a
//! conflict until they do. [`RetrySpec`] bounds how often and how patiently
//! such deletes are retried, and how long removal is then confirmed for.

use std::time::Duration;

use nutype::nutype;
use provisionwait_types::ApiError;
use serde::{Deserialize, Serialize};

use crate::config::PollingConfig;
use crate::errors::RetrySpecError;

/// Total number of delete attempts, the first one included.
///
/// Validated to be at least 1; a spec always issues the delete once.
#[nutype(
    validate(greater_or_equal = 1),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Display,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct MaxAttempts(u32);

/// Delay schedule between conflicting delete attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// The same delay after every failed attempt.
    Fixed(Duration),
    /// `start` after the first failed attempt, growing by `increment` after
    /// each further one, never more than `max`.
    Incrementing {
        /// Delay after the first failed attempt.
        start: Duration,
        /// Growth per failed attempt.
        increment: Duration,
        /// Upper bound of any single delay.
        max: Duration,
    },
}

impl Backoff {
    /// Delay to sleep after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Incrementing {
                start,
                increment,
                max,
            } => {
                let grown = increment.saturating_mul(attempt.saturating_sub(1));
                start.saturating_add(grown).min(max)
            }
        }
    }
}

/// Which delete failures count as transient conflicts.
#[derive(Debug, Clone, Copy, Default)]
pub enum ConflictPolicy {
    /// Only [`ApiError::Conflict`] is retried.
    #[default]
    ConflictOnly,
    /// Custom predicate over the client's error.
    Custom(fn(&ApiError) -> bool),
}

impl ConflictPolicy {
    /// Whether `error` should be retried.
    pub fn is_conflict(&self, error: &ApiError) -> bool {
        match self {
            Self::ConflictOnly => error.is_conflict(),
            Self::Custom(predicate) => predicate(error),
        }
    }
}

/// Configuration of a retrying delete followed by removal confirmation.
///
/// The confirmation interval is always greater than zero and never longer
/// than the confirmation timeout.
#[derive(Debug, Clone)]
pub struct RetrySpec {
    conflict_policy: ConflictPolicy,
    backoff: Backoff,
    max_attempts: MaxAttempts,
    confirm_interval: Duration,
    confirm_timeout: Duration,
}

impl RetrySpec {
    /// Retry conflicts per `backoff`, at most `max_attempts` attempts in
    /// total, then confirm removal every 3 s for up to 15 s.
    pub const fn new(backoff: Backoff, max_attempts: MaxAttempts) -> Self {
        Self {
            conflict_policy: ConflictPolicy::ConflictOnly,
            backoff,
            max_attempts,
            confirm_interval: Duration::from_secs(3),
            confirm_timeout: Duration::from_secs(15),
        }
    }

    /// Spec for networks, subnets and routers built from the configuration.
    pub fn for_dependent_cleanup(config: &PollingConfig) -> Self {
        Self {
            conflict_policy: ConflictPolicy::ConflictOnly,
            backoff: Backoff::Incrementing {
                start: config.conflict_backoff_start.as_duration(),
                increment: config.conflict_backoff_increment.as_duration(),
                max: config.conflict_backoff_max.as_duration(),
            },
            max_attempts: config.conflict_retry_attempts,
            confirm_interval: config.removal_check_interval.as_duration(),
            confirm_timeout: config.removal_check_timeout.as_duration(),
        }
    }

    /// Replace the conflict classification.
    #[must_use]
    pub const fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Replace the removal-confirmation cadence and budget.
    ///
    /// # Errors
    ///
    /// Rejects a zero `interval`, and a `timeout` shorter than `interval`.
    pub fn with_confirmation(
        mut self,
        interval: Duration,
        timeout: Duration,
    ) -> Result<Self, RetrySpecError> {
        if interval.is_zero() {
            return Err(RetrySpecError::ZeroConfirmInterval);
        }
        if timeout < interval {
            return Err(RetrySpecError::ConfirmTimeoutBeforeInterval { interval, timeout });
        }
        self.confirm_interval = interval;
        self.confirm_timeout = timeout;
        Ok(self)
    }

    /// Conflict classification.
    pub const fn conflict_policy(&self) -> &ConflictPolicy {
        &self.conflict_policy
    }

    /// Delay schedule between conflicting attempts.
    pub const fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Attempt budget.
    pub const fn max_attempts(&self) -> MaxAttempts {
        self.max_attempts
    }

    /// Delay between existence checks after the delete.
    pub const fn confirm_interval(&self) -> Duration {
        self.confirm_interval
    }

    /// Budget for confirming removal.
    pub const fn confirm_timeout(&self) -> Duration {
        self.confirm_timeout
    }
}

impl Default for RetrySpec {
    fn default() -> Self {
        Self::for_dependent_cleanup(&PollingConfig::default())
    }
}
