//! `provisionwait` - waiting on asynchronous provisioning APIs from tests
//!
//! Every mutating call against a database-provisioning API (create, delete,
//! resize, restart, backup, promote) is accepted immediately and then moves
//! the resource through intermediate states. Integration tests need to block
//! until the resource settles, under a deadline, and to clean up dependent
//! network objects that the API may briefly refuse to delete.
//!
//! The crate provides two composed pieces:
//!
//! - [`wait`] polls a resource's status at a fixed interval until it reaches
//!   an accepted state, the designated failure state, disappears, or the
//!   deadline passes, producing exactly one [`PollOutcome`].
//! - [`delete_and_confirm`] deletes a resource with bounded retry on
//!   transient conflicts, then confirms it is gone.
//!
//! [`delete_and_wait`] combines a delete with a wait for `DELETED`, which is
//! how primary resources (instances, backups) are cleaned up.
//!
//! # Example
//!
//! ```rust,ignore
//! use provisionwait::{wait, PollingConfig, WaitPreset, WaitSpec};
//!
//! let config = PollingConfig::default();
//! let spec = WaitSpec::for_preset(WaitPreset::InstanceBuild, &config);
//! let status = wait(&handle, &client, &spec)
//!     .await?
//!     .into_result(&handle, &spec)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod deleter;
pub mod errors;
pub mod logging;
mod outcome;
pub mod retry;
mod spec;
mod waiter;

pub use config::{ConfigError, PollingConfig};
pub use deleter::{delete_and_confirm, delete_and_wait};
pub use errors::{LifecycleError, RetrySpecError, WaitSpecError};
pub use outcome::PollOutcome;
pub use retry::{Backoff, ConflictPolicy, MaxAttempts, RetrySpec};
pub use spec::{WaitPreset, WaitSpec, WaitSpecBuilder};
pub use waiter::wait;

pub use provisionwait_types::{
    ApiError, ResourceApi, ResourceDeleter, ResourceHandle, ResourceId, ResourceIdError,
    ResourceKind, ResourceShow, ResourceStatus, ResourceStatusError, StatusProbe,
};
