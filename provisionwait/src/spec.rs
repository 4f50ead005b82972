//! Wait configuration.
//!
//! A [`WaitSpec`] says which statuses end a wait successfully, which status
//! means the resource failed, how often to poll and for how long. Specs are
//! validated when built and read-only afterwards.

use std::time::Duration;

use provisionwait_types::ResourceStatus;

use crate::config::PollingConfig;
use crate::errors::WaitSpecError;
use crate::outcome::PollOutcome;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1800);

/// Configuration of a single wait.
///
/// Invariants, enforced by [`WaitSpecBuilder::build`]:
/// - the poll interval is greater than zero
/// - the timeout is at least the initial delay
/// - at least one terminal condition exists (an accepted status, or
///   not-found counting as success)
///
/// The configured failure state may also appear among the accepted
/// statuses (a negative test waiting for a backup to go `FAILED`). The
/// failure check is then switched off, so the *effective* failure state
/// returned by [`WaitSpec::failure_state`] is always disjoint from the
/// accepted set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSpec {
    accepted: Vec<ResourceStatus>,
    failure_state: Option<ResourceStatus>,
    poll_interval: Duration,
    initial_delay: Duration,
    timeout: Duration,
    accept_not_found: bool,
}

/// Ready-made waits for the resources a provisioning test suite creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPreset {
    /// New or modified instance becoming `HEALTHY` or `ACTIVE`.
    InstanceBuild,
    /// Instance restored from a backup becoming `HEALTHY` or `ACTIVE`.
    InstanceRestore,
    /// Backup reaching `COMPLETED`.
    Backup,
    /// Instance disappearing after a delete.
    InstanceDeletion,
    /// Backup disappearing after a delete.
    BackupDeletion,
}

impl WaitSpec {
    /// Start building a spec. Defaults: no accepted statuses, failure state
    /// `ERROR`, 10 s interval, no initial delay, 1800 s timeout.
    pub fn builder() -> WaitSpecBuilder {
        WaitSpecBuilder::default()
    }

    /// Build the wait spec for `preset` from the configured timeouts.
    pub fn for_preset(preset: WaitPreset, config: &PollingConfig) -> Self {
        let (accepted, failure_state, timeout) = match preset {
            WaitPreset::InstanceBuild => (
                vec![ResourceStatus::healthy(), ResourceStatus::active()],
                ResourceStatus::error(),
                config.database_build_timeout.as_duration(),
            ),
            WaitPreset::InstanceRestore => (
                vec![ResourceStatus::healthy(), ResourceStatus::active()],
                ResourceStatus::error(),
                config.database_restore_timeout.as_duration(),
            ),
            WaitPreset::Backup => (
                vec![ResourceStatus::completed()],
                ResourceStatus::failed(),
                config.backup_wait_timeout.as_duration(),
            ),
            WaitPreset::InstanceDeletion => (
                vec![ResourceStatus::deleted()],
                ResourceStatus::error(),
                config.database_build_timeout.as_duration(),
            ),
            WaitPreset::BackupDeletion => (
                vec![ResourceStatus::deleted()],
                ResourceStatus::failed(),
                config.backup_wait_timeout.as_duration(),
            ),
        };

        // Config scalars are validated to be >= 1 s, so the invariants hold.
        Self {
            accepted,
            failure_state: Some(failure_state),
            poll_interval: config.status_poll_interval.as_duration(),
            initial_delay: Duration::ZERO,
            timeout,
            accept_not_found: false,
        }
    }

    /// Accepted terminal statuses, in the order they were added.
    pub fn accepted(&self) -> &[ResourceStatus] {
        &self.accepted
    }

    /// Whether `status` ends the wait successfully.
    pub fn accepts(&self, status: &ResourceStatus) -> bool {
        self.accepted.contains(status)
    }

    /// The effective failure state: the configured one, unless it is also
    /// accepted.
    pub fn failure_state(&self) -> Option<&ResourceStatus> {
        self.failure_state
            .as_ref()
            .filter(|status| !self.accepts(status))
    }

    /// Delay between the end of one poll and the start of the next.
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Delay before the first poll.
    pub const fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Total budget of the wait, initial delay included.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether not-found was explicitly configured as success.
    pub const fn accepts_not_found(&self) -> bool {
        self.accept_not_found
    }

    /// Whether a "not found" answer ends the wait (explicitly, or because
    /// `DELETED` is accepted).
    pub fn completes_on_not_found(&self) -> bool {
        self.accept_not_found || self.accepts(&ResourceStatus::deleted())
    }

    /// Statuses to name in failure messages.
    pub fn expected_statuses(&self) -> Vec<ResourceStatus> {
        let mut expected = self.accepted.clone();
        let deleted = ResourceStatus::deleted();
        if self.accept_not_found && !expected.contains(&deleted) {
            expected.push(deleted);
        }
        expected
    }

    /// Same spec with a different timeout, re-validated.
    pub fn with_timeout(self, timeout: Duration) -> Result<Self, WaitSpecError> {
        self.into_builder().timeout(timeout).build()
    }

    /// Same spec with a different initial delay, re-validated.
    pub fn with_initial_delay(self, initial_delay: Duration) -> Result<Self, WaitSpecError> {
        self.into_builder().initial_delay(initial_delay).build()
    }

    /// The outcome a "not found" answer produces, or `None` when it only
    /// means "not visible yet". `DELETED` takes precedence over `Vanished`.
    pub(crate) fn not_found_outcome(&self) -> Option<PollOutcome> {
        let deleted = ResourceStatus::deleted();
        if self.accepts(&deleted) {
            Some(PollOutcome::Reached(deleted))
        } else if self.accept_not_found {
            Some(PollOutcome::Vanished)
        } else {
            None
        }
    }

    fn into_builder(self) -> WaitSpecBuilder {
        WaitSpecBuilder {
            accepted: self.accepted,
            failure_state: self.failure_state,
            poll_interval: self.poll_interval,
            initial_delay: self.initial_delay,
            timeout: self.timeout,
            accept_not_found: self.accept_not_found,
        }
    }
}

/// Builder for [`WaitSpec`].
#[derive(Debug, Clone)]
pub struct WaitSpecBuilder {
    accepted: Vec<ResourceStatus>,
    failure_state: Option<ResourceStatus>,
    poll_interval: Duration,
    initial_delay: Duration,
    timeout: Duration,
    accept_not_found: bool,
}

impl Default for WaitSpecBuilder {
    fn default() -> Self {
        Self {
            accepted: Vec::new(),
            failure_state: Some(ResourceStatus::error()),
            poll_interval: DEFAULT_POLL_INTERVAL,
            initial_delay: Duration::ZERO,
            timeout: DEFAULT_TIMEOUT,
            accept_not_found: false,
        }
    }
}

impl WaitSpecBuilder {
    /// Add an accepted terminal status. Duplicates are ignored.
    #[must_use]
    pub fn accept(mut self, status: ResourceStatus) -> Self {
        if !self.accepted.contains(&status) {
            self.accepted.push(status);
        }
        self
    }

    /// Add several accepted terminal statuses, keeping their order.
    #[must_use]
    pub fn accept_all(self, statuses: impl IntoIterator<Item = ResourceStatus>) -> Self {
        statuses.into_iter().fold(self, Self::accept)
    }

    /// Status that means the resource failed.
    #[must_use]
    pub fn failure_state(mut self, status: ResourceStatus) -> Self {
        self.failure_state = Some(status);
        self
    }

    /// Never stop early on a failure status.
    #[must_use]
    pub fn without_failure_state(mut self) -> Self {
        self.failure_state = None;
        self
    }

    /// Delay between polls.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Delay before the first poll, for APIs that have not yet applied the
    /// state transition when they acknowledge the request.
    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Total budget of the wait, initial delay included.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Treat "not found" as success.
    #[must_use]
    pub fn accept_not_found(mut self, accept: bool) -> Self {
        self.accept_not_found = accept;
        self
    }

    /// Validate and build the wait spec.
    pub fn build(self) -> Result<WaitSpec, WaitSpecError> {
        if self.poll_interval.is_zero() {
            return Err(WaitSpecError::ZeroPollInterval);
        }
        if self.timeout < self.initial_delay {
            return Err(WaitSpecError::TimeoutBeforeInitialDelay {
                timeout: self.timeout,
                initial_delay: self.initial_delay,
            });
        }
        if self.accepted.is_empty() && !self.accept_not_found {
            return Err(WaitSpecError::NoTerminalCondition);
        }

        Ok(WaitSpec {
            accepted: self.accepted,
            failure_state: self.failure_state,
            poll_interval: self.poll_interval,
            initial_delay: self.initial_delay,
            timeout: self.timeout,
            accept_not_found: self.accept_not_found,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(raw: &str) -> ResourceStatus {
        ResourceStatus::try_new(raw).expect("valid status")
    }

    #[test]
    fn builder_defaults_match_instance_waits() {
        let spec = WaitSpec::builder()
            .accept(ResourceStatus::active())
            .build()
            .expect("valid spec");

        assert_eq!(spec.poll_interval(), Duration::from_secs(10));
        assert_eq!(spec.timeout(), Duration::from_secs(1800));
        assert_eq!(spec.initial_delay(), Duration::ZERO);
        assert_eq!(spec.failure_state(), Some(&ResourceStatus::error()));
        assert!(!spec.completes_on_not_found());
    }

    #[test]
    fn accepted_statuses_keep_order_without_duplicates() {
        let spec = WaitSpec::builder()
            .accept_all([status("HEALTHY"), status("ACTIVE"), status("HEALTHY")])
            .build()
            .expect("valid spec");

        assert_eq!(spec.accepted(), &[status("HEALTHY"), status("ACTIVE")]);
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let result = WaitSpec::builder()
            .accept(ResourceStatus::active())
            .poll_interval(Duration::ZERO)
            .build();

        assert_eq!(result, Err(WaitSpecError::ZeroPollInterval));
    }

    #[test]
    fn timeout_shorter_than_initial_delay_is_rejected() {
        let result = WaitSpec::builder()
            .accept(ResourceStatus::active())
            .initial_delay(Duration::from_secs(5))
            .timeout(Duration::from_secs(4))
            .build();

        assert_eq!(
            result,
            Err(WaitSpecError::TimeoutBeforeInitialDelay {
                timeout: Duration::from_secs(4),
                initial_delay: Duration::from_secs(5),
            })
        );
    }

    #[test]
    fn timeout_equal_to_initial_delay_is_allowed() {
        let result = WaitSpec::builder()
            .accept(ResourceStatus::active())
            .initial_delay(Duration::from_secs(5))
            .timeout(Duration::from_secs(5))
            .build();

        assert!(result.is_ok());
    }

    #[test]
    fn spec_without_terminal_condition_is_rejected() {
        assert_eq!(
            WaitSpec::builder().build(),
            Err(WaitSpecError::NoTerminalCondition)
        );
    }

    #[test]
    fn accepting_not_found_alone_is_a_terminal_condition() {
        let spec = WaitSpec::builder()
            .accept_not_found(true)
            .build()
            .expect("valid spec");

        assert!(spec.completes_on_not_found());
        assert_eq!(spec.not_found_outcome(), Some(PollOutcome::Vanished));
        assert_eq!(spec.expected_statuses(), vec![ResourceStatus::deleted()]);
    }

    #[test]
    fn expected_failure_disables_failure_check() {
        let spec = WaitSpec::builder()
            .accept_all([ResourceStatus::completed(), ResourceStatus::failed()])
            .failure_state(ResourceStatus::failed())
            .build()
            .expect("valid spec");

        assert_eq!(spec.failure_state(), None);
    }

    #[test]
    fn deleted_takes_precedence_over_vanished() {
        let spec = WaitSpec::builder()
            .accept(ResourceStatus::deleted())
            .accept_not_found(true)
            .build()
            .expect("valid spec");

        assert_eq!(
            spec.not_found_outcome(),
            Some(PollOutcome::Reached(ResourceStatus::deleted()))
        );
    }

    #[test]
    fn with_timeout_revalidates() {
        let spec = WaitSpec::builder()
            .accept(ResourceStatus::active())
            .initial_delay(Duration::from_secs(3))
            .build()
            .expect("valid spec");

        let shortened = spec.clone().with_timeout(Duration::from_secs(30));
        assert_eq!(
            shortened.map(|spec| spec.timeout()),
            Ok(Duration::from_secs(30))
        );

        assert!(spec.with_timeout(Duration::from_secs(1)).is_err());
    }

    #[test]
    fn presets_follow_configured_timeouts() {
        let config = PollingConfig::default();

        let build = WaitSpec::for_preset(WaitPreset::InstanceBuild, &config);
        assert_eq!(
            build.accepted(),
            &[ResourceStatus::healthy(), ResourceStatus::active()]
        );
        assert_eq!(build.failure_state(), Some(&ResourceStatus::error()));
        assert_eq!(build.timeout(), Duration::from_secs(1800));

        let restore = WaitSpec::for_preset(WaitPreset::InstanceRestore, &config);
        assert_eq!(restore.timeout(), Duration::from_secs(3600));

        let backup = WaitSpec::for_preset(WaitPreset::Backup, &config);
        assert_eq!(backup.accepted(), &[ResourceStatus::completed()]);
        assert_eq!(backup.failure_state(), Some(&ResourceStatus::failed()));
        assert_eq!(backup.timeout(), Duration::from_secs(600));

        let deletion = WaitSpec::for_preset(WaitPreset::BackupDeletion, &config);
        assert!(deletion.completes_on_not_found());
        assert_eq!(deletion.poll_interval(), Duration::from_secs(10));
    }
}
