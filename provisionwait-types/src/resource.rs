use crate::validation::{is_status_token, no_uri_delimiters};
use nutype::nutype;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a remote resource as issued by the provisioning API.
///
/// Uses nutype for construction-time validation ensuring all identifiers are:
/// - Non-empty (trimmed strings with at least 1 character)
/// - Within reasonable length (max 255 characters)
/// - Free of URI delimiters (`/`, `?`, `#`, space), since ids are
///   interpolated into request paths
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255, predicate = no_uri_delimiters),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct ResourceId(String);

/// Kind of remote resource a handle addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// A database instance (primary or replica).
    Instance,
    /// A database backup.
    Backup,
    /// A tenant network created for database instances.
    Network,
    /// A subnet of a tenant network.
    Subnet,
    /// A router attaching a tenant subnet to the public network.
    Router,
}

impl ResourceKind {
    /// Singular lower-case name, as used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Instance => "instance",
            Self::Backup => "backup",
            Self::Network => "network",
            Self::Subnet => "subnet",
            Self::Router => "router",
        }
    }

    /// REST collection the kind lives under.
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Instance => "instances",
            Self::Backup => "backups",
            Self::Network => "networks",
            Self::Subnet => "subnets",
            Self::Router => "routers",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque address of a remote resource: its identifier plus its kind.
///
/// Handles are owned by the caller and cloned into the core; nothing in
/// provisionwait mutates one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    kind: ResourceKind,
    id: ResourceId,
}

impl ResourceHandle {
    /// Create a handle from an already validated identifier.
    pub const fn new(kind: ResourceKind, id: ResourceId) -> Self {
        Self { kind, id }
    }

    /// Validate a raw identifier and create a handle from it.
    pub fn parse(kind: ResourceKind, raw: impl Into<String>) -> Result<Self, ResourceIdError> {
        Ok(Self::new(kind, ResourceId::try_new(raw.into())?))
    }

    /// Kind of the addressed resource.
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Identifier of the addressed resource.
    pub const fn id(&self) -> &ResourceId {
        &self.id
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.collection(), self.id)
    }
}

/// Lifecycle status reported by the provisioning API.
///
/// Statuses are sanitized to upper case, so `"active"` and `"ACTIVE"` are
/// the same status. After sanitizing they must be non-empty tokens made of
/// upper-case letters, digits and underscores (`RESTART_REQUIRED`).
#[nutype(
    sanitize(trim, uppercase),
    validate(not_empty, len_char_max = 64, predicate = is_status_token),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct ResourceStatus(String);

impl ResourceStatus {
    fn known(raw: &'static str) -> Self {
        Self::try_new(raw).expect("well-known statuses are valid status tokens")
    }

    /// Sentinel for a resource that no longer exists.
    ///
    /// The API never reports it; a wait that accepts it completes when the
    /// resource returns "not found".
    pub fn deleted() -> Self {
        Self::known("DELETED")
    }

    /// Instance is up and serving.
    pub fn active() -> Self {
        Self::known("ACTIVE")
    }

    /// Instance is up and the guest agent reports a healthy datastore.
    pub fn healthy() -> Self {
        Self::known("HEALTHY")
    }

    /// Instance is being built.
    pub fn build() -> Self {
        Self::known("BUILD")
    }

    /// Instance failure status.
    pub fn error() -> Self {
        Self::known("ERROR")
    }

    /// Backup finished successfully.
    pub fn completed() -> Self {
        Self::known("COMPLETED")
    }

    /// Backup failure status.
    pub fn failed() -> Self {
        Self::known("FAILED")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_id_is_trimmed() {
        let id = ResourceId::try_new("  abc-123 ").expect("valid id");
        assert_eq!(id.as_ref(), "abc-123");
    }

    #[test]
    fn resource_id_rejects_empty_and_path_like_values() {
        assert!(ResourceId::try_new("   ").is_err());
        assert!(ResourceId::try_new("instances/abc").is_err());
        assert!(ResourceId::try_new("a".repeat(256)).is_err());
    }

    #[test]
    fn handle_displays_as_collection_path() {
        let handle = ResourceHandle::parse(ResourceKind::Backup, "b-1").expect("valid id");
        assert_eq!(handle.to_string(), "backups/b-1");
        assert_eq!(handle.kind(), ResourceKind::Backup);
        assert_eq!(handle.id().as_ref(), "b-1");
    }

    #[test]
    fn status_is_upper_cased() {
        let status = ResourceStatus::try_new(" active ").expect("valid status");
        assert_eq!(status, ResourceStatus::active());
    }

    #[test]
    fn status_rejects_free_text() {
        assert!(ResourceStatus::try_new("").is_err());
        assert!(ResourceStatus::try_new("in progress").is_err());
    }

    #[test]
    fn kind_serializes_lower_case() {
        let json = serde_json::to_string(&ResourceKind::Network).expect("serializable");
        assert_eq!(json, "\"network\"");
        assert_eq!(ResourceKind::Network.to_string(), "network");
    }
}
