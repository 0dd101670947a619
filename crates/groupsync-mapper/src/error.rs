//! Error types for the groups mapper.

use groupsync_directory::DirectoryError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::host::HostError;

/// Result type for mapper operations.
pub type MapperResult<T> = Result<T, MapperError>;

/// Errors surfaced to the host's lifecycle caller.
#[derive(Debug, Error)]
pub enum MapperError {
    /// Delegated directory credentials could not be set up. The mapper is
    /// unusable until its configuration is fixed.
    #[error("credential setup failed: {0}")]
    CredentialSetupFailed(String),

    /// The directory could not be queried; nothing was changed locally.
    #[error("directory unavailable: {0}")]
    DirectoryUnavailable(#[source] DirectoryError),

    /// The configured parent group path does not exist.
    #[error("parent group not found: {0}")]
    ParentNotFound(String),

    /// The host failed a read or a mutation.
    #[error(transparent)]
    Host(#[from] HostError),

    /// Mapper configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<DirectoryError> for MapperError {
    fn from(err: DirectoryError) -> Self {
        if err.is_credential_setup() {
            Self::CredentialSetupFailed(err.to_string())
        } else {
            Self::DirectoryUnavailable(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_error_classification() {
        let err: MapperError = DirectoryError::CredentialSetupFailed("bad key".into()).into();
        assert!(matches!(err, MapperError::CredentialSetupFailed(_)));

        let err: MapperError = DirectoryError::Api {
            status: 503,
            message: "Backend Error".into(),
        }
        .into();
        assert!(matches!(err, MapperError::DirectoryUnavailable(_)));

        let err: MapperError = DirectoryError::Auth("token request failed".into()).into();
        assert!(matches!(err, MapperError::DirectoryUnavailable(_)));
    }

    #[test]
    fn test_parent_not_found_display() {
        let err = MapperError::ParentNotFound("/org/google".into());
        assert_eq!(err.to_string(), "parent group not found: /org/google");
    }
}
