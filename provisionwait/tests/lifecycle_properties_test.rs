use std::time::Duration;

use proptest::prelude::*;
use provisionwait::{
    delete_and_confirm, wait, ApiError, Backoff, LifecycleError, MaxAttempts, PollOutcome,
    ResourceHandle, ResourceKind, ResourceStatus, RetrySpec, WaitSpec,
};
use provisionwait_memory::{InMemoryProvisioningApi, SimulatedResource};
use tokio::runtime::{Builder, Runtime};
use tokio::time::Instant;

fn paused_runtime() -> Runtime {
    Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("runtime builds")
}

fn instance() -> ResourceHandle {
    ResourceHandle::parse(ResourceKind::Instance, "prop-1").expect("valid id")
}

fn building_then(tail: &str, builds: usize) -> SimulatedResource {
    let mut statuses = vec![ResourceStatus::build(); builds];
    statuses.push(ResourceStatus::try_new(tail).expect("valid status"));
    SimulatedResource::with_statuses(statuses)
}

fn incrementing(start: u64, increment: u64, max: u64, attempts: u32) -> RetrySpec {
    RetrySpec::new(
        Backoff::Incrementing {
            start: Duration::from_secs(start),
            increment: Duration::from_secs(increment),
            max: Duration::from_secs(max),
        },
        MaxAttempts::try_new(attempts).expect("valid attempts"),
    )
}

proptest! {
    #[test]
    fn timeout_below_interval_polls_at_most_once(interval in 2u64..600, timeout_fraction in 0.0f64..1.0) {
        let interval = Duration::from_secs(interval);
        let timeout = interval.mul_f64(timeout_fraction);
        let spec = WaitSpec::builder()
            .accept(ResourceStatus::active())
            .poll_interval(interval)
            .timeout(timeout)
            .build()
            .expect("valid spec");
        let api = InMemoryProvisioningApi::new();
        let handle = instance();
        api.provision(&handle, SimulatedResource::settled(ResourceStatus::build()));

        let outcome = paused_runtime().block_on(wait(&handle, &api, &spec)).expect("wait succeeds");

        let timed_out = matches!(outcome, PollOutcome::TimedOut { .. });
        prop_assert!(timed_out);
        prop_assert!(api.calls(&handle).fetches <= 1);
    }

    #[test]
    fn accepted_first_answer_returns_after_initial_delay(delay in 0u64..120) {
        let spec = WaitSpec::builder()
            .accept(ResourceStatus::healthy())
            .initial_delay(Duration::from_secs(delay))
            .build()
            .expect("valid spec");
        let api = InMemoryProvisioningApi::new();
        let handle = instance();
        api.provision(&handle, SimulatedResource::settled(ResourceStatus::healthy()));

        let (outcome, elapsed) = paused_runtime().block_on(async {
            let started = Instant::now();
            let outcome = wait(&handle, &api, &spec).await;
            (outcome, started.elapsed())
        });

        prop_assert_eq!(outcome.expect("wait succeeds"), PollOutcome::Reached(ResourceStatus::healthy()));
        prop_assert_eq!(elapsed, Duration::from_secs(delay));
    }

    #[test]
    fn failure_state_ends_the_wait_when_observed(builds in 0usize..50, interval in 1u64..30) {
        let spec = WaitSpec::builder()
            .accept(ResourceStatus::active())
            .failure_state(ResourceStatus::error())
            .poll_interval(Duration::from_secs(interval))
            .timeout(Duration::from_secs(3600))
            .build()
            .expect("valid spec");
        let api = InMemoryProvisioningApi::new();
        let handle = instance();
        api.provision(&handle, building_then("ERROR", builds));

        let (outcome, elapsed) = paused_runtime().block_on(async {
            let started = Instant::now();
            let outcome = wait(&handle, &api, &spec).await;
            (outcome, started.elapsed())
        });

        prop_assert_eq!(outcome.expect("wait succeeds"), PollOutcome::Failed(ResourceStatus::error()));
        prop_assert_eq!(elapsed, Duration::from_secs(interval * builds as u64));
    }

    #[test]
    fn accepted_failure_state_is_reached(builds in 0usize..20) {
        let spec = WaitSpec::builder()
            .accept_all([ResourceStatus::completed(), ResourceStatus::failed()])
            .failure_state(ResourceStatus::failed())
            .build()
            .expect("valid spec");
        let api = InMemoryProvisioningApi::new();
        let handle = instance();
        api.provision(&handle, building_then("FAILED", builds));

        let outcome = paused_runtime().block_on(wait(&handle, &api, &spec));

        prop_assert_eq!(outcome.expect("wait succeeds"), PollOutcome::Reached(ResourceStatus::failed()));
    }

    #[test]
    fn fewer_conflicts_than_attempts_succeed_after_backoff(
        attempts in 2u32..20,
        conflict_seed in 0u32..20,
        start in 0u64..5,
        increment in 0u64..5,
        extra in 0u64..10,
    ) {
        let conflicts = conflict_seed % attempts;
        let max = start + extra;
        let retry = incrementing(start, increment, max, attempts);
        let api = InMemoryProvisioningApi::new();
        let handle = instance();
        api.provision(
            &handle,
            SimulatedResource::settled(ResourceStatus::active()).conflicting_deletes(conflicts),
        );

        let (result, elapsed) = paused_runtime().block_on(async {
            let started = Instant::now();
            let result = delete_and_confirm(&handle, &api, &api, &retry).await;
            (result, started.elapsed())
        });

        let expected_backoff: Duration = (1..=conflicts)
            .map(|attempt| retry.backoff().delay_after(attempt))
            .sum();
        prop_assert!(result.is_ok());
        prop_assert_eq!(api.calls(&handle).deletes, conflicts + 1);
        prop_assert_eq!(elapsed, expected_backoff);
    }

    #[test]
    fn persistent_conflicts_exhaust_exactly_the_budget(attempts in 1u32..20) {
        let retry = incrementing(1, 1, 5, attempts);
        let api = InMemoryProvisioningApi::new();
        let handle = instance();
        api.provision(
            &handle,
            SimulatedResource::settled(ResourceStatus::active()).conflicting_deletes(u32::MAX),
        );

        let result = paused_runtime().block_on(delete_and_confirm(&handle, &api, &api, &retry));

        let propagated = matches!(result, Err(LifecycleError::Api(ApiError::Conflict { .. })));
        prop_assert!(propagated);
        prop_assert_eq!(api.calls(&handle).deletes, attempts);
        prop_assert_eq!(api.calls(&handle).shows, 0);
    }
}
