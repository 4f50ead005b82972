//! The status waiter: poll a resource until it settles or the deadline passes.

use std::time::Duration;

use provisionwait_types::{ApiError, ResourceHandle, ResourceStatus, StatusProbe};
use tokio::time::{self, Instant};
use tracing::{debug, info, instrument, warn};

use crate::errors::LifecycleError;
use crate::outcome::PollOutcome;
use crate::spec::WaitSpec;

/// Stand-in deadline for budgets past what `Instant` can represent.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `start + budget`, or a deadline no test run reaches when that overflows.
pub(crate) fn deadline_after(start: Instant, budget: Duration) -> Instant {
    start
        .checked_add(budget)
        .unwrap_or_else(|| start + FAR_FUTURE)
}

/// What one poll decided.
#[derive(Debug)]
enum Verdict {
    Settled(PollOutcome),
    Pending(Option<ResourceStatus>),
}

/// Classify one probe answer against the wait spec.
///
/// "Not found" is only fatal to the wait when the wait spec counts it as done;
/// otherwise the resource may simply not be visible yet. Any other client
/// error is returned as is.
fn judge(
    spec: &WaitSpec,
    fetched: Result<ResourceStatus, ApiError>,
) -> Result<Verdict, ApiError> {
    match fetched {
        Ok(status) if spec.accepts(&status) => Ok(Verdict::Settled(PollOutcome::Reached(status))),
        Ok(status) if spec.failure_state() == Some(&status) => {
            Ok(Verdict::Settled(PollOutcome::Failed(status)))
        }
        Ok(status) => Ok(Verdict::Pending(Some(status))),
        Err(error) if error.is_not_found() => Ok(spec
            .not_found_outcome()
            .map_or(Verdict::Pending(None), Verdict::Settled)),
        Err(error) => Err(error),
    }
}

/// Poll `handle` through `probe` until `spec` says the wait is over.
///
/// Polls are strictly sequential: one probe call, then a sleep of the poll
/// interval, then the next call. The first poll happens after the initial
/// delay. A poll whose follow-up would start past the deadline is the last
/// one; the waiter then sleeps out the remaining budget and reports
/// [`PollOutcome::TimedOut`] with the last status it saw. A probe call still
/// in flight at the deadline is dropped. A timeout too large for the clock
/// leaves the wait without a practical deadline.
///
/// # Errors
///
/// Client errors other than "not found" end the wait immediately as
/// [`LifecycleError::Api`]. Reaching the failure state or the deadline is
/// not an error here; see [`PollOutcome::into_result`].
#[instrument(
    skip(handle, probe, spec),
    fields(
        resource = %handle,
        accepted = ?spec.accepted(),
        timeout = ?spec.timeout(),
    )
)]
pub async fn wait<P>(
    handle: &ResourceHandle,
    probe: &P,
    spec: &WaitSpec,
) -> Result<PollOutcome, LifecycleError>
where
    P: StatusProbe + ?Sized,
{
    let started = Instant::now();
    let deadline = deadline_after(started, spec.timeout());
    let mut last_known: Option<ResourceStatus> = None;
    let mut polls: u32 = 0;

    if !spec.initial_delay().is_zero() {
        debug!(delay = ?spec.initial_delay(), "Waiting before first poll");
        time::sleep(spec.initial_delay()).await;
    }

    loop {
        polls += 1;
        let Ok(fetched) = time::timeout_at(deadline, probe.fetch_state(handle)).await else {
            warn!(polls, "Status request still pending at the deadline");
            return Ok(timed_out(last_known, started));
        };

        match judge(spec, fetched)? {
            Verdict::Settled(outcome) => {
                match &outcome {
                    PollOutcome::Failed(status) => {
                        warn!(%status, polls, elapsed = ?started.elapsed(), "Resource failed");
                    }
                    _ => {
                        info!(%outcome, polls, elapsed = ?started.elapsed(), "Resource settled");
                    }
                }
                return Ok(outcome);
            }
            Verdict::Pending(status) => {
                debug!(status = ?status, polls, "Resource not settled yet");
                if status.is_some() {
                    last_known = status;
                }
            }
        }

        let next_poll = Instant::now()
            .checked_add(spec.poll_interval())
            .filter(|next| *next <= deadline);
        let Some(next_poll) = next_poll else {
            time::sleep_until(deadline).await;
            warn!(
                polls,
                last_known = ?last_known,
                "Resource did not settle before the deadline"
            );
            return Ok(timed_out(last_known, started));
        };
        time::sleep_until(next_poll).await;
    }
}

fn timed_out(last_known: Option<ResourceStatus>, started: Instant) -> PollOutcome {
    PollOutcome::TimedOut {
        last_known,
        elapsed: started.elapsed(),
    }
}
