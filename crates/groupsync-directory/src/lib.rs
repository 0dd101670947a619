//! Google Workspace directory access for groupsync
//!
//! This crate lists the groups a user belongs to in the Google Workspace
//! directory and expands them transitively, up to a fixed depth.
//!
//! # Features
//!
//! - Delegated (domain-wide) service-account authentication with token caching
//! - `groups.list` lookups with internal pagination
//! - Depth-bounded transitive discovery over any [`DirectoryClient`]
//!
//! # Example
//!
//! ```no_run
//! use groupsync_directory::{DirectoryConfig, GoogleDirectoryClient, GroupDiscovery, GroupKey};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DirectoryConfig::builder()
//!     .delegated_user("admin@example.com")
//!     .credentials_file("/etc/groupsync/service-account.json")
//!     .build()?;
//!
//! let client = GoogleDirectoryClient::new(config)?;
//! let result = GroupDiscovery::default()
//!     .discover_all_groups(&client, &GroupKey::new("jane@example.com"))
//!     .await?;
//! println!("{:?}", result.names);
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
pub mod config;
mod credentials;
mod discovery;
mod error;
mod types;

// Re-exports
pub use auth::TokenCache;
pub use client::{DirectoryClient, GoogleDirectoryClient, GroupEntry, GroupsPage};
pub use config::{DirectoryConfig, DirectoryConfigBuilder};
pub use credentials::{DelegatedCredentials, DEFAULT_TOKEN_URI};
pub use discovery::{discover_all_groups, GroupDiscovery, DEFAULT_MAX_DEPTH};
pub use error::{DirectoryError, DirectoryResult};
pub use types::{DiscoveredGroup, DiscoveryResult, GroupKey};
