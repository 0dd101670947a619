//! Scope of the mapper's create/remove decisions and its resolution from
//! the configured parent path.

use tracing::{debug, instrument};

use crate::host::{HostResult, IdentityStore, LocalGroup};
use crate::{MapperError, MapperResult};

/// Where synced groups live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Groups without a parent.
    TopLevel,
    /// Direct children of the given group.
    UnderParent(LocalGroup),
}

impl Scope {
    /// Returns true if `group` sits directly in this scope.
    #[must_use]
    pub fn contains(&self, group: &LocalGroup) -> bool {
        match self {
            Self::TopLevel => group.parent_id.is_none(),
            Self::UnderParent(parent) => group.parent_id == Some(parent.id),
        }
    }

    /// Parent to create new groups under.
    #[must_use]
    pub fn parent(&self) -> Option<&LocalGroup> {
        match self {
            Self::TopLevel => None,
            Self::UnderParent(parent) => Some(parent),
        }
    }

    /// Lists the groups currently in this scope.
    pub async fn groups<S>(&self, store: &S) -> HostResult<Vec<LocalGroup>>
    where
        S: IdentityStore + ?Sized,
    {
        match self {
            Self::TopLevel => store.top_level_groups().await,
            Self::UnderParent(parent) => store.subgroups(parent).await,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TopLevel => write!(f, "top-level"),
            Self::UnderParent(parent) => write!(f, "under {}", parent.name),
        }
    }
}

/// Resolves the configured parent path into a [`Scope`].
///
/// An absent or blank path means top level. The parent itself is never
/// created.
///
/// # Errors
///
/// Returns `MapperError::ParentNotFound` if the path does not name an
/// existing group.
#[instrument(skip(store))]
pub async fn resolve_scope<S>(store: &S, parent_path: Option<&str>) -> MapperResult<Scope>
where
    S: IdentityStore + ?Sized,
{
    let Some(path) = parent_path.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(Scope::TopLevel);
    };

    let parent = store
        .find_group_by_path(path)
        .await?
        .ok_or_else(|| MapperError::ParentNotFound(path.to_string()))?;

    debug!(parent_id = %parent.id, "Resolved parent group");
    Ok(Scope::UnderParent(parent))
}
