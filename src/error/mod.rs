//! Error types for authbridge.
//!
//! Authentication outcomes are reported through [`crate::auth::AuthError`];
//! [`BridgeError`] covers everything around them (runtime lifecycle, worker
//! management, configuration).

use thiserror::Error;

/// Primary error type for bridge lifecycle and configuration operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Runtime not initialized: call authbridge::runtime::init() first")]
    NotInitialized,

    #[error("Failed to spawn authentication worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("Authentication worker panicked")]
    WorkerPanicked,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

impl BridgeError {
    /// Whether the error is caused by caller misuse rather than the environment.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::NotInitialized | Self::Configuration(_))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, BridgeError>;
