//! Directory client: lists the groups a user or group directly belongs to.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::{
    DelegatedCredentials, DirectoryConfig, DirectoryError, DirectoryResult, DiscoveredGroup,
    GroupKey, TokenCache,
};

/// Source of immediate group memberships.
///
/// Implementations exhaust pagination internally and return an empty
/// vector when the key has no groups.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Lists the groups `key` is a direct member of.
    async fn list_immediate_groups(&self, key: &GroupKey) -> DirectoryResult<Vec<DiscoveredGroup>>;
}

/// One page of the `groups.list` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupsPage {
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
    pub next_page_token: Option<String>,
}

/// A group resource as returned by the Directory API.
#[derive(Debug, Deserialize)]
pub struct GroupEntry {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl GroupEntry {
    /// Display name, falling back to the email address for unnamed groups.
    fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.email.as_deref())
            .unwrap_or_default()
            .to_string()
    }
}

impl From<GroupEntry> for DiscoveredGroup {
    fn from(entry: GroupEntry) -> Self {
        DiscoveredGroup::new(entry.display_name(), entry.id)
    }
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct GoogleApiError {
    pub error: GoogleApiErrorBody,
}

/// Google API error body.
#[derive(Debug, Deserialize)]
pub struct GoogleApiErrorBody {
    pub code: Option<u16>,
    pub message: String,
}

/// Admin SDK Directory API client acting through a delegated service account.
#[derive(Debug)]
pub struct GoogleDirectoryClient {
    http_client: reqwest::Client,
    token_cache: Arc<TokenCache>,
    config: DirectoryConfig,
}

impl GoogleDirectoryClient {
    /// Creates a client, loading credentials from the configured key file
    /// or from `GOOGLE_APPLICATION_CREDENTIALS`.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::CredentialSetupFailed` if no key file is
    /// available or it cannot be loaded.
    pub fn new(config: DirectoryConfig) -> DirectoryResult<Self> {
        let path = config.resolve_credentials_file().ok_or_else(|| {
            DirectoryError::CredentialSetupFailed(format!(
                "No service account key configured and {} is not set",
                crate::config::CREDENTIALS_ENV
            ))
        })?;
        let credentials = DelegatedCredentials::from_file(&path, &config.delegated_user)?;
        Self::with_credentials(config, credentials)
    }

    /// Creates a client from already loaded credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_credentials(
        config: DirectoryConfig,
        credentials: DelegatedCredentials,
    ) -> DirectoryResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.application_name.clone())
            .build()
            .map_err(|e| DirectoryError::Config(format!("Failed to create HTTP client: {e}")))?;

        let token_cache = Arc::new(TokenCache::new(credentials, http_client.clone()));

        Ok(Self {
            http_client,
            token_cache,
            config,
        })
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Returns the token cache.
    #[must_use]
    pub fn token_cache(&self) -> &Arc<TokenCache> {
        &self.token_cache
    }

    /// Fetches one page of groups for `key`.
    #[instrument(skip(self))]
    async fn get_page(&self, key: &GroupKey, page_token: Option<&str>) -> DirectoryResult<GroupsPage> {
        let token = self.token_cache.get_token().await?;
        let page_size = self.config.page_size.to_string();

        let mut query: Vec<(&str, &str)> =
            vec![("userKey", key.as_str()), ("maxResults", page_size.as_str())];
        if let Some(page_token) = page_token {
            query.push(("pageToken", page_token));
        }

        let response = self
            .http_client
            .get(self.config.groups_url())
            .bearer_auth(token.expose_secret())
            .query(&query)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(DirectoryError::from);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.token_cache.invalidate().await;
        }

        let error_body = response.text().await.unwrap_or_default();
        warn!(status = %status, key = %key, "Directory request failed");

        if let Ok(api_error) = serde_json::from_str::<GoogleApiError>(&error_body) {
            return Err(DirectoryError::Api {
                status: api_error.error.code.unwrap_or(status.as_u16()),
                message: api_error.error.message,
            });
        }

        Err(DirectoryError::Api {
            status: status.as_u16(),
            message: error_body,
        })
    }

    /// Fetches all pages for `key`, processing each page via callback.
    #[instrument(skip(self, callback))]
    pub async fn get_paginated<F>(&self, key: &GroupKey, mut callback: F) -> DirectoryResult<usize>
    where
        F: FnMut(Vec<GroupEntry>) -> DirectoryResult<()>,
    {
        let mut page_token: Option<String> = None;
        let mut pages = 0;

        loop {
            debug!(page = pages, "Fetching groups page");
            let page = self.get_page(key, page_token.as_deref()).await?;
            pages += 1;

            callback(page.groups)?;

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => return Ok(pages),
            }
        }
    }
}

#[async_trait]
impl DirectoryClient for GoogleDirectoryClient {
    #[instrument(skip(self))]
    async fn list_immediate_groups(&self, key: &GroupKey) -> DirectoryResult<Vec<DiscoveredGroup>> {
        let mut groups = Vec::new();

        let pages = self
            .get_paginated(key, |page| {
                groups.extend(page.into_iter().map(DiscoveredGroup::from));
                Ok(())
            })
            .await?;

        debug!(pages, count = groups.len(), "Listed immediate groups");
        Ok(groups)
    }
}
