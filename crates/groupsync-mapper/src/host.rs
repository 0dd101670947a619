//! Interface to the host identity system.
//!
//! The host owns users, groups and memberships. The mapper only reads
//! memberships, joins, leaves and creates groups through [`IdentityStore`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

/// Errors reported by the host identity system.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host's storage rejected or failed the operation.
    #[error("host storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A group referenced by the mapper no longer exists.
    #[error("group not found: {0}")]
    GroupNotFound(Uuid),
}

impl HostError {
    /// Storage error without an underlying cause.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }
}

/// A user as seen by the mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
    pub id: Uuid,
    /// Email address; also the key used to query the directory.
    pub email: String,
}

impl LocalUser {
    #[must_use]
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}

/// A group in the host identity system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalGroup {
    pub id: Uuid,
    pub name: String,
    /// Parent group id, `None` for top-level groups.
    pub parent_id: Option<Uuid>,
}

impl LocalGroup {
    #[must_use]
    pub fn new(id: Uuid, name: impl Into<String>, parent_id: Option<Uuid>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
        }
    }

    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Host-side user and group storage.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Groups the user is a direct member of.
    async fn user_groups(&self, user: &LocalUser) -> HostResult<Vec<LocalGroup>>;

    /// Adds the user to a group. Joining a group twice is a no-op.
    async fn join_group(&self, user: &LocalUser, group: &LocalGroup) -> HostResult<()>;

    /// Removes the user from a group. Leaving a group twice is a no-op.
    async fn leave_group(&self, user: &LocalUser, group: &LocalGroup) -> HostResult<()>;

    /// Creates a group under `parent`, or at top level if `parent` is `None`.
    async fn create_group(&self, name: &str, parent: Option<&LocalGroup>)
        -> HostResult<LocalGroup>;

    /// All groups without a parent.
    async fn top_level_groups(&self) -> HostResult<Vec<LocalGroup>>;

    /// Direct children of `parent`.
    async fn subgroups(&self, parent: &LocalGroup) -> HostResult<Vec<LocalGroup>>;

    /// Resolves a slash-separated group path such as `/org/google`.
    async fn find_group_by_path(&self, path: &str) -> HostResult<Option<LocalGroup>>;
}
