//! Convenience re-exports for common use.

pub use crate::auth::{
    authenticator_fn, AuthContext, AuthError, AuthErrorKind, AuthResult, AuthenticationService,
    Authenticator, SerializedAuthenticationService, SessionInfo, Token, Verdict,
};
pub use crate::config::{AuthMode, EndpointAuthConfig};
pub use crate::error::{BridgeError, Result};
