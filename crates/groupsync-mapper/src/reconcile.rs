//! Membership reconciliation.
//!
//! Given the normalized names a user should be a member of, computes which
//! in-scope memberships to keep, which to drop and which groups to join
//! (creating them when missing), then applies that plan to the host.
//! Memberships outside the scope are never looked at.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::host::{IdentityStore, LocalGroup, LocalUser};
use crate::normalize::NameNormalizer;
use crate::scope::Scope;
use crate::MapperResult;

/// Normalized names of the groups a user should belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetGroupSet(BTreeSet<String>);

impl TargetGroupSet {
    /// Normalizes discovered names, collapsing duplicates.
    ///
    /// Names that normalize to an empty string are dropped, since the host
    /// cannot hold a group without a name.
    pub fn from_names<I, S, N>(names: I, normalizer: &N) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        N: NameNormalizer + ?Sized,
    {
        let mut set = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            let normalized = normalizer.normalize(name);
            if normalized.is_empty() {
                warn!(name = %name, "Skipping group whose normalized name is empty");
                continue;
            }
            set.insert(normalized);
        }
        Self(set)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TargetGroupSet {
    /// Builds a set from names that are already normalized.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// In-scope memberships split against a target set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    /// In-scope memberships that are still wanted.
    pub keep: Vec<LocalGroup>,
    /// In-scope memberships that are no longer wanted.
    pub leave: Vec<LocalGroup>,
    /// Target names without a current in-scope membership.
    pub join: BTreeSet<String>,
}

/// Splits the user's current memberships against `target`.
///
/// Only memberships that sit directly in `scope` are considered; all
/// others are ignored, whatever their name.
#[must_use]
pub fn diff_memberships(
    current: &[LocalGroup],
    target: &TargetGroupSet,
    scope: &Scope,
) -> MembershipDiff {
    let mut diff = MembershipDiff {
        join: target.0.clone(),
        ..MembershipDiff::default()
    };

    for group in current.iter().filter(|g| scope.contains(g)) {
        if target.contains(&group.name) {
            diff.join.remove(&group.name);
            diff.keep.push(group.clone());
        } else {
            diff.leave.push(group.clone());
        }
    }

    diff
}

/// A group the user is to join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum JoinTarget {
    /// The group already exists in scope.
    Existing(LocalGroup),
    /// No group of this name exists in scope yet.
    Create { name: String },
}

impl JoinTarget {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Existing(group) => &group.name,
            Self::Create { name } => name,
        }
    }
}

/// Matches join names against the groups that exist in scope.
#[must_use]
pub fn resolve_joins(join: &BTreeSet<String>, existing: Vec<LocalGroup>) -> Vec<JoinTarget> {
    let mut by_name: HashMap<String, LocalGroup> = HashMap::with_capacity(existing.len());
    for group in existing {
        by_name.entry(group.name.clone()).or_insert(group);
    }

    join.iter()
        .map(|name| match by_name.remove(name) {
            Some(group) => JoinTarget::Existing(group),
            None => JoinTarget::Create { name: name.clone() },
        })
        .collect()
}

/// Changes to make to one user's memberships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MembershipPlan {
    pub to_join: Vec<JoinTarget>,
    pub to_leave: Vec<LocalGroup>,
}

impl MembershipPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_join.is_empty() && self.to_leave.is_empty()
    }

    /// Number of groups that would be created.
    #[must_use]
    pub fn creates(&self) -> usize {
        self.to_join
            .iter()
            .filter(|t| matches!(t, JoinTarget::Create { .. }))
            .count()
    }
}

/// What a reconciliation run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub joined: Vec<String>,
    pub left: Vec<String>,
    pub created: Vec<String>,
}

impl ReconcileSummary {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.joined.is_empty() && self.left.is_empty() && self.created.is_empty()
    }
}

/// Computes and applies membership plans against a host store.
pub struct Reconciler<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> Reconciler<'a, S>
where
    S: IdentityStore + ?Sized,
{
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Computes the plan for `user` without changing anything.
    ///
    /// The groups in scope are only listed when there is something to join.
    ///
    /// # Errors
    ///
    /// Returns a host error if memberships or groups cannot be read.
    #[instrument(skip_all, fields(user_id = %user.id, scope = %scope))]
    pub async fn plan(
        &self,
        user: &LocalUser,
        target: &TargetGroupSet,
        scope: &Scope,
    ) -> MapperResult<MembershipPlan> {
        let current = self.store.user_groups(user).await?;
        let diff = diff_memberships(&current, target, scope);

        debug!(
            keep = diff.keep.len(),
            leave = diff.leave.len(),
            join = diff.join.len(),
            "Computed membership diff"
        );

        let to_join = if diff.join.is_empty() {
            Vec::new()
        } else {
            let existing = scope.groups(self.store).await?;
            resolve_joins(&diff.join, existing)
        };

        Ok(MembershipPlan {
            to_join,
            to_leave: diff.leave,
        })
    }

    /// Applies a plan: joins (creating groups where needed), then leaves.
    ///
    /// Stops at the first failing host call. Mutations already made stay
    /// in place; the next run converges the rest.
    ///
    /// # Errors
    ///
    /// Returns the first host error.
    #[instrument(skip_all, fields(user_id = %user.id, scope = %scope))]
    pub async fn apply(
        &self,
        user: &LocalUser,
        plan: MembershipPlan,
        scope: &Scope,
    ) -> MapperResult<ReconcileSummary> {
        let mut summary = ReconcileSummary::default();

        for target in plan.to_join {
            let group = match target {
                JoinTarget::Existing(group) => group,
                JoinTarget::Create { name } => {
                    let group = self.store.create_group(&name, scope.parent()).await?;
                    info!(group_id = %group.id, group = %group.name, "Created group");
                    summary.created.push(group.name.clone());
                    group
                }
            };
            self.store.join_group(user, &group).await?;
            debug!(group = %group.name, "Joined group");
            summary.joined.push(group.name);
        }

        for group in plan.to_leave {
            self.store.leave_group(user, &group).await?;
            debug!(group = %group.name, "Left group");
            summary.left.push(group.name);
        }

        Ok(summary)
    }

    /// Plans and applies in one step.
    ///
    /// # Errors
    ///
    /// Returns the first host error.
    pub async fn reconcile(
        &self,
        user: &LocalUser,
        target: &TargetGroupSet,
        scope: &Scope,
    ) -> MapperResult<ReconcileSummary> {
        let plan = self.plan(user, target, scope).await?;
        if plan.is_empty() {
            debug!("Memberships already in sync");
            return Ok(ReconcileSummary::default());
        }
        self.apply(user, plan, scope).await
    }
}
