//! Error types for provisionwait.
//!
//! Errors are layered the same way the calls are:
//!
//! - **ApiError** (re-exported from `provisionwait-types`): what a single
//!   client call reported. `NotFound` is never fatal on its own.
//! - **WaitSpecError**: a wait configuration that cannot be honoured,
//!   rejected when it is built.
//! - **RetrySpecError**: a removal-confirmation cadence that cannot be
//!   honoured, rejected when it is set.
//! - **LifecycleError**: the single typed failure of a wait or delete call.
//!   It carries the resource, the last observed status and the elapsed time
//!   so callers can report a precise assertion failure.
//!
//! # Handling Strategy
//!
//! - **UnexpectedTerminalState**: the resource failed; fail the test
//! - **Timeout**: the resource never settled; fail the test, the deadline
//!   is the only cancellation mechanism
//! - **DeletionTimeout**: cleanup could not confirm removal; usually logged
//!   by the harness as a leaked resource
//! - **Api**: propagated unchanged, including a conflict that outlived the
//!   retry budget

use std::time::Duration;

use provisionwait_types::{ApiError, ResourceHandle, ResourceStatus};
use thiserror::Error;

/// Reasons a [`crate::WaitSpec`] is rejected at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitSpecError {
    /// The poll interval must be strictly positive.
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    /// The total timeout has to leave room for the initial delay.
    #[error("timeout {timeout:?} is shorter than the initial delay {initial_delay:?}")]
    TimeoutBeforeInitialDelay {
        /// Configured total timeout.
        timeout: Duration,
        /// Configured delay before the first poll.
        initial_delay: Duration,
    },

    /// Nothing could ever end the wait except the deadline.
    #[error("wait has no terminal condition: accept at least one status or accept not-found")]
    NoTerminalCondition,

    /// A delete-and-wait needs the resource's disappearance to count as done.
    #[error("deletion wait must accept DELETED or not-found")]
    MissingDeletionCondition,
}

/// Reasons a [`crate::RetrySpec`] confirmation cadence is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrySpecError {
    /// Existence checks need a delay between them.
    #[error("confirmation interval must be greater than zero")]
    ZeroConfirmInterval,

    /// The budget must allow at least one full interval.
    #[error("confirmation timeout {timeout:?} is shorter than the interval {interval:?}")]
    ConfirmTimeoutBeforeInterval {
        /// Configured delay between existence checks.
        interval: Duration,
        /// Configured confirmation budget.
        timeout: Duration,
    },
}

/// Failure of a wait or delete call.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The resource settled in the designated failure state.
    #[error(
        "{handle} reached status {state}, expected one of [{}]",
        join_statuses(.expected)
    )]
    UnexpectedTerminalState {
        /// Resource that failed.
        handle: ResourceHandle,
        /// Failure status it reported.
        state: ResourceStatus,
        /// Statuses the caller was waiting for.
        expected: Vec<ResourceStatus>,
    },

    /// The deadline passed before the resource settled.
    #[error(
        "{handle} did not reach [{}] within {elapsed:?} (last observed status: {})",
        join_statuses(.expected),
        describe_last(.last_known)
    )]
    Timeout {
        /// Resource that was being polled.
        handle: ResourceHandle,
        /// Most recent status the API reported, if any.
        last_known: Option<ResourceStatus>,
        /// Statuses the caller was waiting for.
        expected: Vec<ResourceStatus>,
        /// Time spent waiting.
        elapsed: Duration,
    },

    /// The resource was still visible after the removal-confirmation window.
    #[error("{handle} was still present {elapsed:?} after it was deleted")]
    DeletionTimeout {
        /// Resource that was deleted.
        handle: ResourceHandle,
        /// Time spent confirming the removal.
        elapsed: Duration,
    },

    /// The wait configuration cannot be used for this call.
    #[error("invalid wait spec: {0}")]
    InvalidSpec(#[from] WaitSpecError),

    /// A client call failed in a way the core does not absorb.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl LifecycleError {
    /// Resource the failure concerns, when the error names one.
    pub const fn handle(&self) -> Option<&ResourceHandle> {
        match self {
            Self::UnexpectedTerminalState { handle, .. }
            | Self::Timeout { handle, .. }
            | Self::DeletionTimeout { handle, .. } => Some(handle),
            Self::Api(error) => Some(error.handle()),
            Self::InvalidSpec(_) => None,
        }
    }

    /// Whether the failure is a deadline rather than a bad state.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::DeletionTimeout { .. })
    }
}

fn join_statuses(statuses: &[ResourceStatus]) -> String {
    statuses
        .iter()
        .map(|status| status.as_str())
        .collect::<Vec<&str>>()
        .join(", ")
}

fn describe_last(status: &Option<ResourceStatus>) -> &str {
    status.as_ref().map_or("none", |status| status.as_str())
}
