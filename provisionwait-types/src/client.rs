//! The Resource API Client seam.
//!
//! provisionwait never talks HTTP itself. Test plugins implement these
//! traits on top of their REST client (or use `provisionwait-memory`), and
//! the polling core drives them.

use crate::errors::ApiError;
use crate::resource::{ResourceHandle, ResourceStatus};
use async_trait::async_trait;
use std::sync::Arc;

/// Reads a resource's current lifecycle status.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Issue a single read of the resource's status.
    ///
    /// Must return [`ApiError::NotFound`] when the resource does not exist,
    /// and never for any other condition.
    async fn fetch_state(&self, handle: &ResourceHandle) -> Result<ResourceStatus, ApiError>;
}

/// Issues delete requests.
#[async_trait]
pub trait ResourceDeleter: Send + Sync {
    /// Issue one delete request for the resource.
    ///
    /// Conflicts (dependent objects still attached) must be reported as
    /// [`ApiError::Conflict`] so the retry policy can tell them apart.
    async fn delete(&self, handle: &ResourceHandle) -> Result<(), ApiError>;
}

/// Cheap existence check used to confirm that a delete completed.
#[async_trait]
pub trait ResourceShow: Send + Sync {
    /// `Ok(())` while the resource exists, [`ApiError::NotFound`] once it is gone.
    async fn show(&self, handle: &ResourceHandle) -> Result<(), ApiError>;
}

/// A client offering every operation the core needs.
pub trait ResourceApi: StatusProbe + ResourceDeleter + ResourceShow {}

impl<T> ResourceApi for T where T: StatusProbe + ResourceDeleter + ResourceShow + ?Sized {}

#[async_trait]
impl<T> StatusProbe for Arc<T>
where
    T: StatusProbe + ?Sized,
{
    async fn fetch_state(&self, handle: &ResourceHandle) -> Result<ResourceStatus, ApiError> {
        (**self).fetch_state(handle).await
    }
}

#[async_trait]
impl<T> ResourceDeleter for Arc<T>
where
    T: ResourceDeleter + ?Sized,
{
    async fn delete(&self, handle: &ResourceHandle) -> Result<(), ApiError> {
        (**self).delete(handle).await
    }
}

#[async_trait]
impl<T> ResourceShow for Arc<T>
where
    T: ResourceShow + ?Sized,
{
    async fn show(&self, handle: &ResourceHandle) -> Result<(), ApiError> {
        (**self).show(handle).await
    }
}
