//! Error types for the directory client.

use thiserror::Error;

/// Result type alias using `DirectoryError`.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Errors that can occur when talking to the external directory.
///
/// Everything except [`DirectoryError::CredentialSetupFailed`] belongs to the
/// "directory unavailable" class: the call failed and the caller must abort.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Delegated credentials could not be established at construction.
    #[error("Credential setup failed: {0}")]
    CredentialSetupFailed(String),

    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Access token could not be obtained.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Directory API returned an error response.
    #[error("Directory API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl DirectoryError {
    /// Returns true if this error happened while setting up credentials.
    #[must_use]
    pub fn is_credential_setup(&self) -> bool {
        matches!(self, Self::CredentialSetupFailed(_) | Self::Config(_))
    }
}
