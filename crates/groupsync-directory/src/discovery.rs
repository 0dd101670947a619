//! Bounded transitive group discovery.
//!
//! A user's groups are themselves members of other groups; membership in
//! those is inherited. Discovery expands the membership graph depth-first
//! from the user, stopping at a fixed depth. There is no visited set, so a
//! cyclic directory graph is cut off by the depth bound alone.

use tracing::{debug, info, instrument};

use crate::{DirectoryClient, DirectoryResult, DiscoveredGroup, DiscoveryResult, GroupKey};

/// Default expansion depth: user → group → parent group.
pub const DEFAULT_MAX_DEPTH: u32 = 2;

/// Depth-first expansion of a user's group memberships.
#[derive(Debug, Clone, Copy)]
pub struct GroupDiscovery {
    max_depth: u32,
}

impl Default for GroupDiscovery {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl GroupDiscovery {
    #[must_use]
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }

    #[must_use]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Collects the names of every group reachable from `root` within the
    /// depth bound, in depth-first pre-order.
    ///
    /// The root is queried at depth 0. Each returned group is recorded and,
    /// while its depth is below `max_depth`, queried in turn at depth + 1.
    /// Groups returned at `max_depth` are recorded but not expanded.
    ///
    /// # Errors
    ///
    /// Any directory failure aborts the whole discovery; no partial result
    /// is returned.
    #[instrument(skip(self, client), fields(max_depth = self.max_depth))]
    pub async fn discover_all_groups<C>(
        &self,
        client: &C,
        root: &GroupKey,
    ) -> DirectoryResult<DiscoveryResult>
    where
        C: DirectoryClient + ?Sized,
    {
        let mut result = DiscoveryResult::default();

        // Each frame holds the not yet visited siblings at one depth.
        let mut stack: Vec<(std::vec::IntoIter<DiscoveredGroup>, u32)> = Vec::new();

        let groups = client.list_immediate_groups(root).await?;
        result.lookups += 1;
        stack.push((groups.into_iter(), 0));

        while let Some((siblings, depth)) = stack.last_mut() {
            let depth = *depth;
            let Some(group) = siblings.next() else {
                stack.pop();
                continue;
            };

            result.names.push(group.name);

            if depth < self.max_depth {
                let children = client.list_immediate_groups(&group.id).await?;
                result.lookups += 1;
                debug!(group_id = %group.id, depth = depth + 1, count = children.len(), "Expanded group");
                stack.push((children.into_iter(), depth + 1));
            }
        }

        info!(
            root = %root,
            groups = result.names.len(),
            lookups = result.lookups,
            "Group discovery completed"
        );

        Ok(result)
    }
}

/// Discovers all groups of `root` with the given depth bound.
///
/// # Errors
///
/// Propagates the first directory failure.
pub async fn discover_all_groups<C>(
    client: &C,
    root: &GroupKey,
    max_depth: u32,
) -> DirectoryResult<DiscoveryResult>
where
    C: DirectoryClient + ?Sized,
{
    GroupDiscovery::new(max_depth)
        .discover_all_groups(client, root)
        .await
}
