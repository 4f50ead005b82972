use crate::resource::ResourceHandle;

/// Error returned by a Resource API Client call.
///
/// Clients must keep these three cases apart: the polling core reads
/// `NotFound` contextually (success for deletions, "not visible yet" for
/// builds), retries `Conflict` during deletes, and propagates `Other`
/// untouched.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The API reported that the resource does not exist.
    #[error("{handle} not found")]
    NotFound {
        /// Resource the request addressed.
        handle: ResourceHandle,
    },

    /// The request conflicts with the resource's current state, typically
    /// because dependent objects (ports on a network) are still attached.
    #[error("conflict on {handle}: {detail}")]
    Conflict {
        /// Resource the request addressed.
        handle: ResourceHandle,
        /// Server-provided explanation.
        detail: String,
    },

    /// Any transport or server failure not classified above.
    #[error("request for {handle} failed: {detail}")]
    Other {
        /// Resource the request addressed.
        handle: ResourceHandle,
        /// Transport or server explanation.
        detail: String,
    },
}

impl ApiError {
    /// Build a `NotFound` for `handle`.
    pub fn not_found(handle: &ResourceHandle) -> Self {
        Self::NotFound {
            handle: handle.clone(),
        }
    }

    /// Build a `Conflict` for `handle`.
    pub fn conflict(handle: &ResourceHandle, detail: impl Into<String>) -> Self {
        Self::Conflict {
            handle: handle.clone(),
            detail: detail.into(),
        }
    }

    /// Build an `Other` for `handle`.
    pub fn other(handle: &ResourceHandle, detail: impl Into<String>) -> Self {
        Self::Other {
            handle: handle.clone(),
            detail: detail.into(),
        }
    }

    /// Whether the API reported the resource as absent.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the API reported a conflict.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Resource the failed request addressed.
    pub const fn handle(&self) -> &ResourceHandle {
        match self {
            Self::NotFound { handle } | Self::Conflict { handle, .. } | Self::Other { handle, .. } => {
                handle
            }
        }
    }
}
