//! Service-account key loading for delegated (domain-wide) access.

use std::path::Path;

use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use tracing::debug;

use crate::{DirectoryError, DirectoryResult};

/// Token endpoint used when the key file does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Service-account key file contents.
#[derive(Deserialize)]
struct ServiceAccountKeyFile {
    #[serde(rename = "type")]
    key_type: Option<String>,
    client_email: String,
    private_key: String,
    private_key_id: Option<String>,
    token_uri: Option<String>,
}

/// Credentials for acting as `subject` through a service account.
///
/// Parsing the key happens once, here; the signing key is reused for every
/// token request afterwards.
#[derive(Clone)]
pub struct DelegatedCredentials {
    client_email: String,
    key_id: Option<String>,
    token_uri: String,
    subject: String,
    signing_key: EncodingKey,
}

impl std::fmt::Debug for DelegatedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegatedCredentials")
            .field("client_email", &self.client_email)
            .field("key_id", &self.key_id)
            .field("token_uri", &self.token_uri)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl DelegatedCredentials {
    /// Loads a service-account key file and delegates it to `subject`.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::CredentialSetupFailed` if the file cannot be
    /// read or parsed.
    pub fn from_file(path: &Path, subject: &str) -> DirectoryResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            DirectoryError::CredentialSetupFailed(format!(
                "Failed to read service account key {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&json, subject)
    }

    /// Parses service-account key JSON and delegates it to `subject`.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::CredentialSetupFailed` if the JSON is not a
    /// service-account key, the private key is not a valid RSA key or the
    /// subject is empty.
    pub fn from_json(json: &str, subject: &str) -> DirectoryResult<Self> {
        let file: ServiceAccountKeyFile = serde_json::from_str(json).map_err(|e| {
            DirectoryError::CredentialSetupFailed(format!("Invalid service account key: {e}"))
        })?;

        if let Some(ref key_type) = file.key_type {
            if key_type != "service_account" {
                return Err(DirectoryError::CredentialSetupFailed(format!(
                    "Expected a service_account key, got {key_type}"
                )));
            }
        }

        if subject.trim().is_empty() {
            return Err(DirectoryError::CredentialSetupFailed(
                "Delegated user must not be empty".into(),
            ));
        }

        let signing_key = EncodingKey::from_rsa_pem(file.private_key.as_bytes()).map_err(|e| {
            DirectoryError::CredentialSetupFailed(format!("Invalid service account private key: {e}"))
        })?;

        debug!(
            client_email = %file.client_email,
            subject = %subject,
            "Loaded delegated service account credentials"
        );

        Ok(Self {
            client_email: file.client_email,
            key_id: file.private_key_id,
            token_uri: file
                .token_uri
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            subject: subject.trim().to_string(),
            signing_key,
        })
    }

    /// Service account email (the JWT issuer).
    #[must_use]
    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Private key id, sent as the JWT `kid`.
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// OAuth2 token endpoint.
    #[must_use]
    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    /// The user the service account acts as.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub(crate) fn signing_key(&self) -> &EncodingKey {
        &self.signing_key
    }
}
