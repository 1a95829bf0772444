use strum::{Display, EnumString};
use thiserror::Error;

/// Message carried by every [`AuthErrorKind::Internal`] failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal error";

/// Message carried by requests resolved during disposal or explicit cancellation.
pub const CANCELED_MESSAGE: &str = "Operation was cancelled";

/// Broad classification of an authentication failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AuthErrorKind {
    /// The token was rejected; the message explains why.
    InvalidArgument,
    /// The authenticator produced no usable result.
    Internal,
    /// The request was canceled before the authenticator ran.
    Canceled,
}

/// Terminal failure delivered to the caller of an authentication request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct AuthError {
    kind: AuthErrorKind,
    message: String,
}

impl AuthError {
    /// Token rejected with a caller-visible reason (surfaced verbatim).
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            kind: AuthErrorKind::InvalidArgument,
            message: message.into(),
        }
    }

    /// The canonical internal failure. Takes no message on purpose: the text
    /// is always [`INTERNAL_ERROR_MESSAGE`].
    pub fn internal() -> Self {
        Self {
            kind: AuthErrorKind::Internal,
            message: INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn canceled() -> Self {
        Self::canceled_with(CANCELED_MESSAGE)
    }

    pub fn canceled_with(message: impl Into<String>) -> Self {
        Self {
            kind: AuthErrorKind::Canceled,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_canceled(&self) -> bool {
        self.kind == AuthErrorKind::Canceled
    }
}
