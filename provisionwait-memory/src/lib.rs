//! In-memory provisioning API for testing `provisionwait`
//!
//! This crate provides a scripted implementation of the client traits from
//! `provisionwait-types`. Each simulated resource replays a list of
//! statuses, can refuse deletes with conflicts a given number of times, and
//! can stay visible for a number of observations after it was deleted. Call
//! counters let tests assert how often the core talked to the API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::significant_drop_tightening)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use provisionwait_types::{
    ApiError, ResourceDeleter, ResourceHandle, ResourceShow, ResourceStatus, StatusProbe,
};
use tracing::trace;

/// Script for one simulated resource.
#[derive(Debug, Clone)]
pub struct SimulatedResource {
    // Replayed front to back; the last status repeats forever
    statuses: VecDeque<ResourceStatus>,
    conflicting_deletes: u32,
    failing_delete: Option<String>,
    lingering_observations: u32,
    deleting_status: ResourceStatus,
    deleting: bool,
}

impl SimulatedResource {
    /// Resource that reports `statuses` in order, then keeps reporting the
    /// last one. An empty list behaves like `[BUILD]`.
    pub fn with_statuses(statuses: impl IntoIterator<Item = ResourceStatus>) -> Self {
        let mut statuses: VecDeque<ResourceStatus> = statuses.into_iter().collect();
        if statuses.is_empty() {
            statuses.push_back(ResourceStatus::build());
        }
        Self {
            statuses,
            conflicting_deletes: 0,
            failing_delete: None,
            lingering_observations: 0,
            deleting_status: ResourceStatus::try_new("SHUTDOWN")
                .expect("SHUTDOWN is a valid status token"),
            deleting: false,
        }
    }

    /// Resource that is already settled in `status`.
    pub fn settled(status: ResourceStatus) -> Self {
        Self::with_statuses([status])
    }

    /// Answer the first `count` deletes with a conflict.
    #[must_use]
    pub const fn conflicting_deletes(mut self, count: u32) -> Self {
        self.conflicting_deletes = count;
        self
    }

    /// Answer every delete with a non-retryable failure.
    #[must_use]
    pub fn failing_deletes(mut self, detail: impl Into<String>) -> Self {
        self.failing_delete = Some(detail.into());
        self
    }

    /// Stay visible for `count` status or existence checks after an
    /// accepted delete.
    #[must_use]
    pub const fn lingering_after_delete(mut self, count: u32) -> Self {
        self.lingering_observations = count;
        self
    }

    /// Status reported while a deleted resource is still visible.
    #[must_use]
    pub fn deleting_status(mut self, status: ResourceStatus) -> Self {
        self.deleting_status = status;
        self
    }

    fn next_status(&mut self) -> ResourceStatus {
        if self.statuses.len() > 1 {
            if let Some(status) = self.statuses.pop_front() {
                return status;
            }
        }
        self.statuses
            .front()
            .cloned()
            .unwrap_or_else(ResourceStatus::build)
    }
}

/// How often each operation reached a handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `fetch_state` calls.
    pub fetches: u32,
    /// `delete` calls.
    pub deletes: u32,
    /// `show` calls.
    pub shows: u32,
}

#[derive(Debug, Default)]
struct State {
    resources: HashMap<ResourceHandle, SimulatedResource>,
    calls: HashMap<ResourceHandle, CallCounts>,
}

/// What an observation of a deleted resource found.
enum Observation {
    Present(ResourceStatus),
    Gone,
}

impl State {
    fn counts(&mut self, handle: &ResourceHandle) -> &mut CallCounts {
        self.calls.entry(handle.clone()).or_default()
    }

    fn observe(&mut self, handle: &ResourceHandle) -> Observation {
        let Some(resource) = self.resources.get_mut(handle) else {
            return Observation::Gone;
        };
        if !resource.deleting {
            return Observation::Present(resource.next_status());
        }
        if resource.lingering_observations > 0 {
            resource.lingering_observations -= 1;
            return Observation::Present(resource.deleting_status.clone());
        }
        let _removed = self.resources.remove(handle);
        trace!(resource = %handle, "Simulated resource removed");
        Observation::Gone
    }
}

/// Thread-safe scripted provisioning API for testing
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvisioningApi {
    state: Arc<RwLock<State>>,
}

impl InMemoryProvisioningApi {
    /// Create an API with no resources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the resource behind `handle`.
    pub fn provision(&self, handle: &ResourceHandle, resource: SimulatedResource) {
        let mut state = self.state.write().expect("RwLock poisoned");
        let _previous = state.resources.insert(handle.clone(), resource);
    }

    /// Whether `handle` is still visible.
    pub fn contains(&self, handle: &ResourceHandle) -> bool {
        let state = self.state.read().expect("RwLock poisoned");
        state.resources.contains_key(handle)
    }

    /// Calls made against `handle` so far.
    pub fn calls(&self, handle: &ResourceHandle) -> CallCounts {
        let state = self.state.read().expect("RwLock poisoned");
        state.calls.get(handle).copied().unwrap_or_default()
    }
}

#[async_trait]
impl StatusProbe for InMemoryProvisioningApi {
    async fn fetch_state(&self, handle: &ResourceHandle) -> Result<ResourceStatus, ApiError> {
        let mut state = self.state.write().expect("RwLock poisoned");
        state.counts(handle).fetches += 1;

        match state.observe(handle) {
            Observation::Present(status) => {
                trace!(resource = %handle, %status, "Simulated status");
                Ok(status)
            }
            Observation::Gone => Err(ApiError::not_found(handle)),
        }
    }
}

#[async_trait]
impl ResourceDeleter for InMemoryProvisioningApi {
    async fn delete(&self, handle: &ResourceHandle) -> Result<(), ApiError> {
        let mut state = self.state.write().expect("RwLock poisoned");
        state.counts(handle).deletes += 1;

        let Some(resource) = state.resources.get_mut(handle) else {
            return Err(ApiError::not_found(handle));
        };
        if resource.conflicting_deletes > 0 {
            resource.conflicting_deletes -= 1;
            return Err(ApiError::conflict(
                handle,
                "resource still has attached dependents",
            ));
        }
        if let Some(detail) = &resource.failing_delete {
            return Err(ApiError::other(handle, detail.clone()));
        }

        resource.deleting = true;
        if resource.lingering_observations == 0 {
            let _removed = state.resources.remove(handle);
        }
        trace!(resource = %handle, "Simulated delete accepted");
        Ok(())
    }
}

#[async_trait]
impl ResourceShow for InMemoryProvisioningApi {
    async fn show(&self, handle: &ResourceHandle) -> Result<(), ApiError> {
        let mut state = self.state.write().expect("RwLock poisoned");
        state.counts(handle).shows += 1;

        match state.observe(handle) {
            Observation::Present(_) => Ok(()),
            Observation::Gone => Err(ApiError::not_found(handle)),
        }
    }
}
