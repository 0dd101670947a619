//! Common test utilities for groupsync-mapper integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use uuid::Uuid;

use groupsync_directory::{
    DirectoryClient, DirectoryError, DirectoryResult, DiscoveredGroup, GroupKey,
};
use groupsync_mapper::{
    DirectoryGroupsMapper, HostError, HostResult, IdentityStore, LocalGroup, LocalUser,
};

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

pub fn test_user(email: &str) -> LocalUser {
    LocalUser::new(Uuid::new_v4(), email)
}

/// Mapper over `directory` with the default depth.
pub fn mapper(directory: Arc<FakeDirectory>) -> DirectoryGroupsMapper {
    DirectoryGroupsMapper::new(directory, 2)
}

// =============================================================================
// Directory fake
// =============================================================================

/// In-memory directory keyed by member (user email or group id).
#[derive(Default)]
pub struct FakeDirectory {
    memberships: HashMap<String, Vec<DiscoveredGroup>>,
    failing_keys: HashSet<String>,
    lookups: AtomicUsize,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that `member` belongs directly to `group_id`, named `group_name`.
    pub fn with_membership(mut self, member: &str, group_id: &str, group_name: &str) -> Self {
        self.memberships
            .entry(member.to_string())
            .or_default()
            .push(DiscoveredGroup::new(group_name, group_id));
        self
    }

    /// Makes lookups for `key` fail as if the directory were down.
    pub fn with_failure(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryClient for FakeDirectory {
    async fn list_immediate_groups(&self, key: &GroupKey) -> DirectoryResult<Vec<DiscoveredGroup>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing_keys.contains(key.as_str()) {
            return Err(DirectoryError::Api {
                status: 503,
                message: "Backend Error".to_string(),
            });
        }
        Ok(self.memberships.get(key.as_str()).cloned().unwrap_or_default())
    }
}

// =============================================================================
// Host store fake
// =============================================================================

/// Groups and memberships held by [`InMemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    pub groups: Vec<LocalGroup>,
    pub memberships: HashMap<Uuid, BTreeSet<Uuid>>,
}

/// Host identity store backed by a mutex, with call counters.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    pub create_calls: AtomicUsize,
    pub join_calls: AtomicUsize,
    pub leave_calls: AtomicUsize,
    pub read_calls: AtomicUsize,
    fail_joins: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every join fail with a storage error.
    pub fn failing_joins() -> Self {
        Self {
            fail_joins: true,
            ..Self::default()
        }
    }

    pub fn add_group(&self, name: &str, parent: Option<&LocalGroup>) -> LocalGroup {
        let group = LocalGroup::new(Uuid::new_v4(), name, parent.map(|p| p.id));
        self.state.lock().unwrap().groups.push(group.clone());
        group
    }

    pub fn add_membership(&self, user: &LocalUser, group: &LocalGroup) {
        self.state
            .lock()
            .unwrap()
            .memberships
            .entry(user.id)
            .or_default()
            .insert(group.id);
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.lock().unwrap().clone()
    }

    /// Names of the user's groups that sit directly under `parent`.
    pub fn member_names(&self, user: &LocalUser, parent: Option<&LocalGroup>) -> BTreeSet<String> {
        let state = self.state.lock().unwrap();
        let parent_id = parent.map(|p| p.id);
        let ids = state.memberships.get(&user.id).cloned().unwrap_or_default();
        state
            .groups
            .iter()
            .filter(|g| ids.contains(&g.id) && g.parent_id == parent_id)
            .map(|g| g.name.clone())
            .collect()
    }

    pub fn groups_named(&self, name: &str) -> Vec<LocalGroup> {
        self.state
            .lock()
            .unwrap()
            .groups
            .iter()
            .filter(|g| g.name == name)
            .cloned()
            .collect()
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
            + self.join_calls.load(Ordering::SeqCst)
            + self.leave_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn user_groups(&self, user: &LocalUser) -> HostResult<Vec<LocalGroup>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        let ids = state.memberships.get(&user.id).cloned().unwrap_or_default();
        Ok(state
            .groups
            .iter()
            .filter(|g| ids.contains(&g.id))
            .cloned()
            .collect())
    }

    async fn join_group(&self, user: &LocalUser, group: &LocalGroup) -> HostResult<()> {
        self.join_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_joins {
            return Err(HostError::storage("join rejected"));
        }
        let mut state = self.state.lock().unwrap();
        if !state.groups.iter().any(|g| g.id == group.id) {
            return Err(HostError::GroupNotFound(group.id));
        }
        state.memberships.entry(user.id).or_default().insert(group.id);
        Ok(())
    }

    async fn leave_group(&self, user: &LocalUser, group: &LocalGroup) -> HostResult<()> {
        self.leave_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(ids) = state.memberships.get_mut(&user.id) {
            ids.remove(&group.id);
        }
        Ok(())
    }

    async fn create_group(
        &self,
        name: &str,
        parent: Option<&LocalGroup>,
    ) -> HostResult<LocalGroup> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let group = LocalGroup::new(Uuid::new_v4(), name, parent.map(|p| p.id));
        self.state.lock().unwrap().groups.push(group.clone());
        Ok(group)
    }

    async fn top_level_groups(&self) -> HostResult<Vec<LocalGroup>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state
            .groups
            .iter()
            .filter(|g| g.is_top_level())
            .cloned()
            .collect())
    }

    async fn subgroups(&self, parent: &LocalGroup) -> HostResult<Vec<LocalGroup>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state
            .groups
            .iter()
            .filter(|g| g.parent_id == Some(parent.id))
            .cloned()
            .collect())
    }

    async fn find_group_by_path(&self, path: &str) -> HostResult<Option<LocalGroup>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        let mut current: Option<LocalGroup> = None;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let parent_id = current.as_ref().map(|g| g.id);
            match state
                .groups
                .iter()
                .find(|g| g.name == segment && g.parent_id == parent_id)
            {
                Some(group) => current = Some(group.clone()),
                None => return Ok(None),
            }
        }
        Ok(current)
    }
}
