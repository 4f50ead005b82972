use std::fmt;
use std::time::Duration;

use provisionwait_types::{ResourceHandle, ResourceStatus};

use crate::errors::LifecycleError;
use crate::spec::WaitSpec;

/// Result of one wait.
///
/// Produced exactly once per [`crate::wait`] call; every variant is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The resource reported an accepted status (or `DELETED` was accepted
    /// and the resource is gone).
    Reached(ResourceStatus),
    /// The deadline passed first.
    TimedOut {
        /// Most recent status observed, if the resource was ever visible.
        last_known: Option<ResourceStatus>,
        /// Time spent waiting, initial delay included.
        elapsed: Duration,
    },
    /// The resource is gone and not-found was accepted.
    Vanished,
    /// The resource reported the failure status.
    Failed(ResourceStatus),
}

impl PollOutcome {
    /// Whether the wait ended the way the caller wanted.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Reached(_) | Self::Vanished)
    }

    /// Status that ended the wait, for `Reached` and `Failed`.
    pub const fn status(&self) -> Option<&ResourceStatus> {
        match self {
            Self::Reached(status) | Self::Failed(status) => Some(status),
            Self::TimedOut { .. } | Self::Vanished => None,
        }
    }

    /// Turn the outcome into assertion-style failures.
    ///
    /// `Reached` yields its status, `Vanished` yields `None`, `Failed`
    /// becomes [`LifecycleError::UnexpectedTerminalState`] and `TimedOut`
    /// becomes [`LifecycleError::Timeout`].
    pub fn into_result(
        self,
        handle: &ResourceHandle,
        spec: &WaitSpec,
    ) -> Result<Option<ResourceStatus>, LifecycleError> {
        match self {
            Self::Reached(status) => Ok(Some(status)),
            Self::Vanished => Ok(None),
            Self::Failed(state) => Err(LifecycleError::UnexpectedTerminalState {
                handle: handle.clone(),
                state,
                expected: spec.expected_statuses(),
            }),
            Self::TimedOut {
                last_known,
                elapsed,
            } => Err(LifecycleError::Timeout {
                handle: handle.clone(),
                last_known,
                expected: spec.expected_statuses(),
                elapsed,
            }),
        }
    }
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reached(status) => write!(f, "reached {status}"),
            Self::TimedOut { elapsed, .. } => write!(f, "timed out after {elapsed:?}"),
            Self::Vanished => f.write_str("vanished"),
            Self::Failed(status) => write!(f, "failed with {status}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provisionwait_types::ResourceKind;

    fn backup() -> ResourceHandle {
        ResourceHandle::parse(ResourceKind::Backup, "b-7").expect("valid id")
    }

    fn backup_spec() -> WaitSpec {
        WaitSpec::builder()
            .accept(ResourceStatus::completed())
            .failure_state(ResourceStatus::failed())
            .build()
            .expect("valid spec")
    }

    #[test]
    fn reached_and_vanished_are_successes() {
        let spec = backup_spec();

        assert_eq!(
            PollOutcome::Reached(ResourceStatus::completed())
                .into_result(&backup(), &spec)
                .expect("success"),
            Some(ResourceStatus::completed())
        );
        assert_eq!(
            PollOutcome::Vanished
                .into_result(&backup(), &spec)
                .expect("success"),
            None
        );
    }

    #[test]
    fn failed_becomes_unexpected_terminal_state() {
        let error = PollOutcome::Failed(ResourceStatus::failed())
            .into_result(&backup(), &backup_spec())
            .expect_err("failure");

        assert!(matches!(
            error,
            LifecycleError::UnexpectedTerminalState { ref state, ref expected, .. }
                if *state == ResourceStatus::failed()
                    && *expected == vec![ResourceStatus::completed()]
        ));
    }

    #[test]
    fn timed_out_becomes_timeout_with_context() {
        let outcome = PollOutcome::TimedOut {
            last_known: Some(ResourceStatus::build()),
            elapsed: Duration::from_secs(600),
        };

        let error = outcome
            .into_result(&backup(), &backup_spec())
            .expect_err("failure");

        assert!(error.is_timeout());
        assert_eq!(error.handle(), Some(&backup()));
    }

    #[test]
    fn display_is_short_and_readable() {
        assert_eq!(
            PollOutcome::Reached(ResourceStatus::active()).to_string(),
            "reached ACTIVE"
        );
        assert_eq!(PollOutcome::Vanished.to_string(), "vanished");
        assert_eq!(
            PollOutcome::Failed(ResourceStatus::error()).to_string(),
            "failed with ERROR"
        );
    }
}
