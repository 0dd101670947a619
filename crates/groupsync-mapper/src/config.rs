//! Mapper configuration.
//!
//! Process-level settings come from the host's provider configuration (a
//! key/value map) or from `GROUPSYNC_*` environment variables. Loading is
//! fail-fast: a missing delegated user or an unparsable number is an error.
//! Per-instance settings (the parent group path) live in
//! [`MapperModelConfig`].

use std::collections::HashMap;
use std::path::PathBuf;

use groupsync_directory::{DirectoryConfig, DirectoryResult, DEFAULT_MAX_DEPTH};
use thiserror::Error;

pub const CONFIG_KEY_SERVICE_ACCOUNT_USER: &str = "service-account-user";
pub const CONFIG_KEY_APPLICATION_NAME: &str = "application-name";
pub const CONFIG_KEY_CREDENTIALS_FILE: &str = "credentials-file";
pub const CONFIG_KEY_MAX_DEPTH: &str = "max-depth";
pub const CONFIG_KEY_PAGE_SIZE: &str = "page-size";
pub const CONFIG_KEY_REQUEST_TIMEOUT_SECS: &str = "request-timeout-secs";
pub const CONFIG_KEY_DIRECTORY_BASE_URL: &str = "directory-base-url";

/// Mapper model key holding the parent group path.
pub const MAPPER_MODEL_KEY_PARENT_GROUP: &str = "parentGroup";

/// Prefix for environment variables.
pub const ENV_PREFIX: &str = "GROUPSYNC_";

/// Upper bound on the discovery depth. Traversal has no cycle detection.
pub const MAX_ALLOWED_DEPTH: u32 = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration key: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Process-level mapper settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperSettings {
    /// Workspace user the service account impersonates.
    pub service_account_user: String,
    /// Application name reported to the directory.
    pub application_name: Option<String>,
    /// Service-account key file.
    pub credentials_file: Option<PathBuf>,
    /// Discovery depth bound.
    pub max_depth: u32,
    pub page_size: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub directory_base_url: Option<String>,
}

impl MapperSettings {
    /// Loads settings from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the service account user is missing or a
    /// numeric value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let service_account_user = get(CONFIG_KEY_SERVICE_ACCOUNT_USER)
            .ok_or_else(|| ConfigError::MissingVar(CONFIG_KEY_SERVICE_ACCOUNT_USER.to_string()))?;

        let max_depth = parse_opt::<u32>(CONFIG_KEY_MAX_DEPTH, get(CONFIG_KEY_MAX_DEPTH))?
            .unwrap_or(DEFAULT_MAX_DEPTH);
        if max_depth > MAX_ALLOWED_DEPTH {
            return Err(ConfigError::InvalidValue {
                var: CONFIG_KEY_MAX_DEPTH.to_string(),
                message: format!("must be at most {MAX_ALLOWED_DEPTH}, got {max_depth}"),
            });
        }

        Ok(Self {
            service_account_user,
            application_name: get(CONFIG_KEY_APPLICATION_NAME),
            credentials_file: get(CONFIG_KEY_CREDENTIALS_FILE).map(PathBuf::from),
            max_depth,
            page_size: parse_opt(CONFIG_KEY_PAGE_SIZE, get(CONFIG_KEY_PAGE_SIZE))?,
            request_timeout_secs: parse_opt(
                CONFIG_KEY_REQUEST_TIMEOUT_SECS,
                get(CONFIG_KEY_REQUEST_TIMEOUT_SECS),
            )?,
            directory_base_url: get(CONFIG_KEY_DIRECTORY_BASE_URL),
        })
    }

    /// Loads settings from the host's provider configuration map.
    ///
    /// # Errors
    ///
    /// See [`MapperSettings::from_lookup`].
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| map.get(key).cloned())
    }

    /// Loads settings from `GROUPSYNC_*` environment variables, e.g.
    /// `GROUPSYNC_SERVICE_ACCOUNT_USER`.
    ///
    /// # Errors
    ///
    /// See [`MapperSettings::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(env_var_name(key)).ok())
    }

    /// Builds the directory client configuration.
    ///
    /// # Errors
    ///
    /// Returns a directory configuration error if a value is out of range.
    pub fn directory_config(&self) -> DirectoryResult<DirectoryConfig> {
        let mut builder = DirectoryConfig::builder().delegated_user(&self.service_account_user);

        if let Some(ref name) = self.application_name {
            builder = builder.application_name(name);
        }
        if let Some(ref path) = self.credentials_file {
            builder = builder.credentials_file(path);
        }
        if let Some(size) = self.page_size {
            builder = builder.page_size(size);
        }
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.request_timeout_secs(secs);
        }
        if let Some(ref url) = self.directory_base_url {
            builder = builder.base_url(url);
        }

        builder.build()
    }
}

/// Maps a configuration key to its environment variable name.
#[must_use]
pub fn env_var_name(key: &str) -> String {
    format!("{ENV_PREFIX}{}", key.to_uppercase().replace('-', "_"))
}

fn parse_opt<T>(var: &str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                var: var.to_string(),
                message: format!("{v:?}: {e}"),
            })
        })
        .transpose()
}

/// Per-instance mapper settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapperModelConfig {
    /// Path of the group new groups are created under.
    pub parent_group: Option<String>,
}

impl MapperModelConfig {
    #[must_use]
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        Self {
            parent_group: map
                .get(MAPPER_MODEL_KEY_PARENT_GROUP)
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        }
    }

    #[must_use]
    pub fn with_parent_group(path: impl Into<String>) -> Self {
        Self {
            parent_group: Some(path.into()),
        }
    }
}

/// How the host synchronizes brokered users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Host-specific legacy behaviour.
    Legacy,
    /// Apply mappers only when the user is first imported.
    Import,
    /// Apply mappers on every login.
    Force,
}

impl SyncMode {
    /// Parses a host sync mode name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "legacy" => Some(Self::Legacy),
            "import" => Some(Self::Import),
            "force" => Some(Self::Force),
            _ => None,
        }
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Import => write!(f, "import"),
            Self::Force => write!(f, "force"),
        }
    }
}
