//! OAuth2 JWT-bearer authentication for the Directory API.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::config::DIRECTORY_GROUP_READONLY_SCOPE;
use crate::{DelegatedCredentials, DirectoryError, DirectoryResult};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of the signed assertion; Google caps it at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Assertion claims for the JWT-bearer grant.
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[allow(dead_code)]
    token_type: String,
}

/// Cached OAuth2 access token.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: SecretString,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Returns true if the token is expired or will expire within the grace period.
    fn is_expired(&self, grace_period: Duration) -> bool {
        Utc::now() + grace_period >= self.expires_at
    }
}

/// Token cache for delegated access tokens.
#[derive(Debug)]
pub struct TokenCache {
    credentials: DelegatedCredentials,
    http_client: reqwest::Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    /// Grace period before expiry to trigger refresh (default: 5 minutes).
    grace_period: Duration,
}

impl TokenCache {
    /// Creates a new token cache.
    pub fn new(credentials: DelegatedCredentials, http_client: reqwest::Client) -> Self {
        Self {
            credentials,
            http_client,
            cached_token: Arc::new(RwLock::new(None)),
            grace_period: Duration::minutes(5),
        }
    }

    /// Gets a valid access token, refreshing if necessary.
    #[instrument(skip(self), fields(subject = %self.credentials.subject()))]
    pub async fn get_token(&self) -> DirectoryResult<SecretString> {
        {
            let cache = self.cached_token.read().await;
            if let Some(ref token) = *cache {
                if !token.is_expired(self.grace_period) {
                    debug!("Using cached token");
                    return Ok(token.access_token.clone());
                }
            }
        }

        debug!("Refreshing access token");
        let new_token = self.acquire_token().await?;

        {
            let mut cache = self.cached_token.write().await;
            *cache = Some(new_token.clone());
        }

        Ok(new_token.access_token)
    }

    /// Signs the delegation assertion.
    fn build_assertion(&self, now: DateTime<Utc>) -> DirectoryResult<String> {
        let claims = AssertionClaims {
            iss: self.credentials.client_email(),
            sub: self.credentials.subject(),
            scope: DIRECTORY_GROUP_READONLY_SCOPE,
            aud: self.credentials.token_uri(),
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.credentials.key_id().map(String::from);

        encode(&header, &claims, self.credentials.signing_key())
            .map_err(|e| DirectoryError::Auth(format!("Failed to sign assertion: {e}")))
    }

    /// Exchanges a signed assertion for an access token.
    #[instrument(skip(self))]
    async fn acquire_token(&self) -> DirectoryResult<CachedToken> {
        let assertion = self.build_assertion(Utc::now())?;
        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)];

        let response = self
            .http_client
            .post(self.credentials.token_uri())
            .form(&params)
            .send()
            .await
            .map_err(|e| DirectoryError::Auth(format!("Token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Auth(format!(
                "Token request failed with status {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| DirectoryError::Auth(format!("Failed to parse token response: {e}")))?;

        let expires_at = Utc::now() + Duration::seconds(token_response.expires_in);

        debug!(
            "Acquired new token, expires at {}",
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        Ok(CachedToken {
            access_token: token_response.access_token.into(),
            expires_at,
        })
    }

    /// Invalidates the cached token, forcing a refresh on next use.
    pub async fn invalidate(&self) {
        let mut cache = self.cached_token.write().await;
        *cache = None;
    }

    /// Returns true if a non-expired token is cached.
    pub async fn has_valid_token(&self) -> bool {
        self.cached_token
            .read()
            .await
            .as_ref()
            .is_some_and(|t| !t.is_expired(self.grace_period))
    }
}
