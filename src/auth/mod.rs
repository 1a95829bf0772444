//! Serialized token authentication.

pub mod authenticator;
pub mod error;
pub(crate) mod queue;
pub mod request;
pub mod service;
pub mod static_token;
pub mod token;

pub use authenticator::{authenticator_fn, AuthContext, Authenticator, FnAuthenticator, RequestId, Verdict};
pub use error::{AuthError, AuthErrorKind, INTERNAL_ERROR_MESSAGE};
pub use request::{AuthResult, CompletionSink};
pub use service::{AuthenticationService, SerializedAuthenticationService};
pub use static_token::{static_authentication_service, StaticTokenAuthenticator};
pub use token::{SessionInfo, Token};
