//! Directory client configuration.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::{DirectoryError, DirectoryResult};

/// Default Admin SDK Directory API base URL.
pub const DEFAULT_BASE_URL: &str = "https://admin.googleapis.com/admin/directory/v1";

/// Default application name sent as the `User-Agent`.
pub const DEFAULT_APPLICATION_NAME: &str = "groupsync";

/// Largest page the groups endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Read-only scope for listing groups.
pub const DIRECTORY_GROUP_READONLY_SCOPE: &str =
    "https://www.googleapis.com/auth/admin.directory.group.readonly";

/// Environment variable holding the application-default credentials path.
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Configuration for the Google directory client.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Workspace account the service account acts on behalf of.
    pub delegated_user: String,
    /// Application name, sent as the `User-Agent`.
    pub application_name: String,
    /// Service-account key file. Falls back to `GOOGLE_APPLICATION_CREDENTIALS`.
    pub credentials_file: Option<PathBuf>,
    /// Directory API base URL.
    pub base_url: Url,
    /// Page size for group listing.
    pub page_size: u32,
    /// Per-request timeout enforced by the transport.
    pub request_timeout: Duration,
}

impl DirectoryConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> DirectoryConfigBuilder {
        DirectoryConfigBuilder::default()
    }

    /// Returns the key file path, consulting the environment if none was configured.
    #[must_use]
    pub fn resolve_credentials_file(&self) -> Option<PathBuf> {
        self.credentials_file.clone().or_else(|| {
            std::env::var(CREDENTIALS_ENV)
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
        })
    }

    /// URL of the groups listing endpoint.
    #[must_use]
    pub fn groups_url(&self) -> String {
        format!("{}/groups", self.base_url.as_str().trim_end_matches('/'))
    }
}

/// Builder for [`DirectoryConfig`].
#[derive(Debug, Default)]
pub struct DirectoryConfigBuilder {
    delegated_user: Option<String>,
    application_name: Option<String>,
    credentials_file: Option<PathBuf>,
    base_url: Option<String>,
    page_size: Option<u32>,
    request_timeout_secs: Option<u64>,
}

impl DirectoryConfigBuilder {
    /// Sets the delegated Workspace user.
    #[must_use]
    pub fn delegated_user(mut self, user: impl Into<String>) -> Self {
        self.delegated_user = Some(user.into());
        self
    }

    /// Sets the application name.
    #[must_use]
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Sets the service-account key file.
    #[must_use]
    pub fn credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the listing page size.
    #[must_use]
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Config` if the delegated user is missing,
    /// the page size is out of range or the base URL is invalid.
    pub fn build(self) -> DirectoryResult<DirectoryConfig> {
        let delegated_user = self
            .delegated_user
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| DirectoryError::Config("delegated_user is required".into()))?;

        let page_size = self.page_size.unwrap_or(MAX_PAGE_SIZE);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(DirectoryError::Config(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }

        let base_url = Url::parse(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))
            .map_err(|e| DirectoryError::Config(format!("invalid base_url: {e}")))?;

        let request_timeout_secs = self
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            return Err(DirectoryError::Config(
                "request_timeout_secs must be positive".into(),
            ));
        }

        Ok(DirectoryConfig {
            delegated_user,
            application_name: self
                .application_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_APPLICATION_NAME.to_string()),
            credentials_file: self.credentials_file,
            base_url,
            page_size,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}
