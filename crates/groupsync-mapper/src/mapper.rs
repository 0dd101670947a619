//! The identity-provider mapper and its lifecycle entry points.

use std::sync::Arc;

use groupsync_directory::{DirectoryClient, GoogleDirectoryClient, GroupDiscovery, GroupKey};
use tracing::{info, instrument, warn};

use crate::config::{MapperModelConfig, MapperSettings, SyncMode};
use crate::host::{IdentityStore, LocalUser};
use crate::normalize::{NameNormalizer, SlugNormalizer};
use crate::reconcile::{ReconcileSummary, Reconciler, TargetGroupSet};
use crate::scope::resolve_scope;
use crate::MapperResult;

pub const PROVIDER_ID: &str = "google-groups-idp-mapper";
pub const DISPLAY_CATEGORY: &str = "Google Workspace";
pub const DISPLAY_TYPE: &str = "Google Groups Importer";
pub const HELP_TEXT: &str = "Adds the user to all groups that the user is a member of in Google";

/// Keeps a brokered user's local groups in line with their directory groups.
///
/// The directory client is built once and shared by every run; the host
/// store is passed per call.
pub struct DirectoryGroupsMapper {
    client: Arc<dyn DirectoryClient>,
    discovery: GroupDiscovery,
    normalizer: Arc<dyn NameNormalizer>,
}

impl std::fmt::Debug for DirectoryGroupsMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryGroupsMapper")
            .field("discovery", &self.discovery)
            .finish_non_exhaustive()
    }
}

impl DirectoryGroupsMapper {
    /// Creates a mapper over `client`, slugifying group names.
    #[must_use]
    pub fn new(client: Arc<dyn DirectoryClient>, max_depth: u32) -> Self {
        Self {
            client,
            discovery: GroupDiscovery::new(max_depth),
            normalizer: Arc::new(SlugNormalizer),
        }
    }

    /// Replaces the name normalizer.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Arc<dyn NameNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Builds the mapper with a Google directory client.
    ///
    /// # Errors
    ///
    /// Returns `MapperError::CredentialSetupFailed` if the delegated
    /// credentials cannot be set up.
    pub fn from_settings(settings: &MapperSettings) -> MapperResult<Self> {
        let client = GoogleDirectoryClient::new(settings.directory_config()?)?;

        info!(
            delegated_user = %settings.service_account_user,
            max_depth = settings.max_depth,
            "Initialized directory groups mapper"
        );

        Ok(Self::new(Arc::new(client), settings.max_depth))
    }

    /// Sync modes this mapper runs in.
    #[must_use]
    pub fn supports_sync_mode(mode: SyncMode) -> bool {
        matches!(mode, SyncMode::Import | SyncMode::Force)
    }

    /// Called when a user is first provisioned from the identity provider.
    ///
    /// # Errors
    ///
    /// See [`DirectoryGroupsMapper::update_brokered_user`].
    pub async fn import_new_user<S>(
        &self,
        store: &S,
        user: &LocalUser,
        model: &MapperModelConfig,
    ) -> MapperResult<ReconcileSummary>
    where
        S: IdentityStore + ?Sized,
    {
        self.sync_user_groups(store, user, model).await
    }

    /// Called when an existing user's brokered identity is refreshed.
    ///
    /// # Errors
    ///
    /// - `ParentNotFound` if the configured parent group does not exist
    /// - `DirectoryUnavailable` if any directory lookup fails
    /// - `Host` if the host fails a read or mutation
    ///
    /// Nothing is changed locally unless discovery succeeded.
    pub async fn update_brokered_user<S>(
        &self,
        store: &S,
        user: &LocalUser,
        model: &MapperModelConfig,
    ) -> MapperResult<ReconcileSummary>
    where
        S: IdentityStore + ?Sized,
    {
        self.sync_user_groups(store, user, model).await
    }

    /// One reconciliation run: resolve scope, discover, normalize, reconcile.
    #[instrument(skip_all, fields(user_id = %user.id, email = %user.email))]
    async fn sync_user_groups<S>(
        &self,
        store: &S,
        user: &LocalUser,
        model: &MapperModelConfig,
    ) -> MapperResult<ReconcileSummary>
    where
        S: IdentityStore + ?Sized,
    {
        let scope = resolve_scope(store, model.parent_group.as_deref()).await?;
        info!(scope = %scope, "Syncing user groups");

        if user.email.trim().is_empty() {
            warn!("User has no email, leaving groups untouched");
            return Ok(ReconcileSummary::default());
        }

        let discovered = self
            .discovery
            .discover_all_groups(self.client.as_ref(), &GroupKey::new(user.email.trim()))
            .await?;

        let target = TargetGroupSet::from_names(&discovered.names, self.normalizer.as_ref());

        let summary = Reconciler::new(store)
            .reconcile(user, &target, &scope)
            .await?;

        info!(
            scope = %scope,
            discovered = discovered.len(),
            target = target.len(),
            joined = summary.joined.len(),
            left = summary.left.len(),
            created = summary.created.len(),
            "Synced user groups"
        );

        Ok(summary)
    }
}
