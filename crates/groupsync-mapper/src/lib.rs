//! Directory groups mapper for groupsync
//!
//! Reconciles a user's group memberships in a host identity system with
//! the user's Google Workspace groups whenever the user is imported or
//! logs in through the identity provider.
//!
//! A run resolves the configured parent group (the scope), discovers the
//! user's groups transitively, slugifies their names and then joins,
//! creates and leaves groups in scope so the two sides match. Memberships
//! outside the scope are left alone and no group is ever deleted.
//!
//! # Example
//!
//! ```no_run
//! use groupsync_mapper::{DirectoryGroupsMapper, IdentityStore, LocalUser, MapperModelConfig, MapperSettings};
//!
//! # async fn example(store: &dyn IdentityStore, user: LocalUser) -> Result<(), Box<dyn std::error::Error>> {
//! let settings = MapperSettings::from_env()?;
//! let mapper = DirectoryGroupsMapper::from_settings(&settings)?;
//!
//! let model = MapperModelConfig::with_parent_group("/google");
//! let summary = mapper.update_brokered_user(store, &user, &model).await?;
//! println!("joined {:?}, left {:?}", summary.joined, summary.left);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
pub mod host;
mod mapper;
pub mod normalize;
pub mod reconcile;
pub mod scope;

pub use config::{ConfigError, MapperModelConfig, MapperSettings, SyncMode};
pub use error::{MapperError, MapperResult};
pub use host::{HostError, HostResult, IdentityStore, LocalGroup, LocalUser};
pub use mapper::{DirectoryGroupsMapper, DISPLAY_CATEGORY, DISPLAY_TYPE, HELP_TEXT, PROVIDER_ID};
pub use normalize::{slugify, NameNormalizer, SlugNormalizer};
pub use reconcile::{
    diff_memberships, resolve_joins, JoinTarget, MembershipDiff, MembershipPlan,
    ReconcileSummary, Reconciler, TargetGroupSet,
};
pub use scope::{resolve_scope, Scope};
