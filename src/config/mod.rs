//! Endpoint authentication configuration (layered: code > env > config file).

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::auth::{static_authentication_service, Authenticator, SerializedAuthenticationService};
use crate::error::{BridgeError, Result};

/// Environment variable holding a static endpoint token.
pub const TOKEN_ENV_VAR: &str = "AUTHBRIDGE_TOKEN";

/// How an endpoint authenticates its peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AuthMode {
    /// No authentication at all.
    None,
    /// A single preconfigured token.
    StaticToken,
    /// An injected authenticator callback.
    Callback,
}

/// Authentication settings for one endpoint.
///
/// A static token takes precedence over a callback authenticator; with
/// neither, the endpoint is unauthenticated.
///
/// # Example
/// ```
/// use authbridge::config::{AuthMode, EndpointAuthConfig};
///
/// let config = EndpointAuthConfig::builder().token("staticToken".to_string()).build();
/// assert_eq!(config.mode(true), AuthMode::StaticToken);
/// ```
#[derive(Clone, Default, Builder, Serialize, Deserialize)]
pub struct EndpointAuthConfig {
    pub token: Option<String>,
}

impl fmt::Debug for EndpointAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointAuthConfig")
            .field("token", &self.token.as_ref().map(|_| ".."))
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    auth: EndpointAuthConfig,
}

impl EndpointAuthConfig {
    /// Read overrides from the environment (loads `.env` if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            token: lookup(TOKEN_ENV_VAR),
        }
    }

    /// Parse the `[auth]` table of a TOML config file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(raw)?;
        Ok(file.auth)
    }

    /// Platform config file location (e.g. `~/.config/authbridge/config.toml`).
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "authbridge")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load the config file at `path`, or the default location if it exists,
    /// then apply environment overrides.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.exists() => {
                return Err(BridgeError::Configuration(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Self::load_from_path(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::load_from_path(&path)?,
                _ => Self::default(),
            },
        };
        Ok(file.overlay(Self::from_env()))
    }

    /// Fields set in `other` win over fields set in `self`.
    pub fn overlay(self, other: Self) -> Self {
        Self {
            token: non_empty(other.token).or_else(|| non_empty(self.token)),
        }
    }

    /// The static token, ignoring empty values.
    pub fn static_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.is_empty())
    }

    pub fn mode(&self, has_callback: bool) -> AuthMode {
        if self.static_token().is_some() {
            AuthMode::StaticToken
        } else if has_callback {
            AuthMode::Callback
        } else {
            AuthMode::None
        }
    }

    /// Build the service for this endpoint, or `None` when it is unauthenticated.
    pub fn build_service(
        &self,
        callback: Option<Arc<dyn Authenticator>>,
    ) -> Result<Option<SerializedAuthenticationService>> {
        let mode = self.mode(callback.is_some());
        tracing::debug!(mode = %mode, "endpoint authentication configured");
        let service = match (self.static_token(), callback) {
            (Some(token), _) => Some(static_authentication_service(token)?),
            (None, Some(authenticator)) => Some(SerializedAuthenticationService::new(authenticator)?),
            (None, None) => None,
        };
        Ok(service)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
