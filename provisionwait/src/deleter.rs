//! Deleting resources and confirming that they are gone.

use provisionwait_types::{ResourceApi, ResourceDeleter, ResourceHandle, ResourceShow};
use tokio::time::{self, Instant};
use tracing::{debug, info, instrument, warn};

use crate::errors::{LifecycleError, WaitSpecError};
use crate::outcome::PollOutcome;
use crate::retry::RetrySpec;
use crate::spec::WaitSpec;
use crate::waiter::{deadline_after, wait};

/// Delete `handle`, retrying transient conflicts, then confirm it is gone.
///
/// A "not found" answer to the delete means the resource is already gone:
/// the call succeeds without checking existence. Conflicts, as classified by
/// the retry spec's [`crate::ConflictPolicy`], are retried after the backoff delay
/// until the attempt budget is spent. Once the delete is accepted, `show`
/// is polled at the confirmation interval until it answers "not found".
///
/// # Errors
///
/// - [`LifecycleError::Api`] with the last conflict once every attempt
///   conflicted, or immediately for any other delete failure
/// - [`LifecycleError::DeletionTimeout`] when the resource is still visible
///   after the confirmation budget
/// - [`LifecycleError::Api`] when an existence check fails with anything
///   other than "not found"
#[instrument(skip(handle, deleter, show, retry), fields(resource = %handle))]
pub async fn delete_and_confirm<D, S>(
    handle: &ResourceHandle,
    deleter: &D,
    show: &S,
    retry: &RetrySpec,
) -> Result<(), LifecycleError>
where
    D: ResourceDeleter + ?Sized,
    S: ResourceShow + ?Sized,
{
    if !delete_with_retry(handle, deleter, retry).await? {
        info!("Resource already absent");
        return Ok(());
    }
    confirm_removal(handle, show, retry).await
}

/// Issue the delete. Returns `false` when the resource was already gone.
async fn delete_with_retry<D>(
    handle: &ResourceHandle,
    deleter: &D,
    retry: &RetrySpec,
) -> Result<bool, LifecycleError>
where
    D: ResourceDeleter + ?Sized,
{
    let max_attempts = retry.max_attempts().into_inner();
    let mut attempt: u32 = 1;

    loop {
        match deleter.delete(handle).await {
            Ok(()) => {
                debug!(attempt, "Delete accepted");
                return Ok(true);
            }
            Err(error) if error.is_not_found() => return Ok(false),
            Err(error) if retry.conflict_policy().is_conflict(&error) => {
                if attempt >= max_attempts {
                    warn!(attempt, %error, "Delete still conflicting, giving up");
                    return Err(error.into());
                }
                let delay = retry.backoff().delay_after(attempt);
                debug!(attempt, ?delay, %error, "Delete conflicted, retrying");
                time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                warn!(attempt, %error, "Delete failed");
                return Err(error.into());
            }
        }
    }
}

async fn confirm_removal<S>(
    handle: &ResourceHandle,
    show: &S,
    retry: &RetrySpec,
) -> Result<(), LifecycleError>
where
    S: ResourceShow + ?Sized,
{
    let started = Instant::now();
    let deadline = deadline_after(started, retry.confirm_timeout());

    loop {
        match time::timeout_at(deadline, show.show(handle)).await {
            Ok(Err(error)) if error.is_not_found() => {
                info!(elapsed = ?started.elapsed(), "Removal confirmed");
                return Ok(());
            }
            Ok(Err(error)) => return Err(error.into()),
            Ok(Ok(())) => debug!("Resource still present"),
            Err(_) => return Err(deletion_timeout(handle, started)),
        }

        let next_check = Instant::now()
            .checked_add(retry.confirm_interval())
            .filter(|next| *next <= deadline);
        let Some(next_check) = next_check else {
            time::sleep_until(deadline).await;
            return Err(deletion_timeout(handle, started));
        };
        time::sleep_until(next_check).await;
    }
}

fn deletion_timeout(handle: &ResourceHandle, started: Instant) -> LifecycleError {
    let elapsed = started.elapsed();
    warn!(?elapsed, "Resource still present after delete");
    LifecycleError::DeletionTimeout {
        handle: handle.clone(),
        elapsed,
    }
}

/// Delete a primary resource and wait for it to disappear.
///
/// `spec` must count the disappearance as done, by accepting `DELETED` or
/// "not found". If the resource is already gone when the delete is issued,
/// the outcome that disappearance produces is returned without polling.
///
/// # Errors
///
/// - [`LifecycleError::InvalidSpec`] when `spec` cannot observe deletion
/// - [`LifecycleError::Api`] when the delete or a status poll fails with
///   anything other than "not found"
#[instrument(skip(handle, api, spec), fields(resource = %handle))]
pub async fn delete_and_wait<A>(
    handle: &ResourceHandle,
    api: &A,
    spec: &WaitSpec,
) -> Result<PollOutcome, LifecycleError>
where
    A: ResourceApi + ?Sized,
{
    let Some(absent) = spec.not_found_outcome() else {
        return Err(WaitSpecError::MissingDeletionCondition.into());
    };

    match api.delete(handle).await {
        Ok(()) => {}
        Err(error) if error.is_not_found() => {
            info!("Resource already absent");
            return Ok(absent);
        }
        Err(error) => return Err(LifecycleError::Api(error)),
    }

    wait(handle, api, spec).await
}
