//! Authentication against a single preconfigured token.

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::authenticator::{AuthContext, Authenticator, Verdict};
use super::service::SerializedAuthenticationService;
use super::token::{SessionInfo, Token};
use crate::error::Result;

/// Session info handed out by [`StaticTokenAuthenticator`].
pub const STATIC_SESSION_INFO: &str = "{}";

pub const INCORRECT_TOKEN_MESSAGE: &str = "Incorrect token";

/// Accepts exactly one token. Only its SHA-256 digest is kept, and digests
/// are compared without early exit.
#[derive(Clone)]
pub struct StaticTokenAuthenticator {
    token_hash: [u8; 32],
}

impl StaticTokenAuthenticator {
    pub fn new(token: impl AsRef<[u8]>) -> Self {
        Self {
            token_hash: digest(token.as_ref()),
        }
    }

    pub fn matches(&self, token: &[u8]) -> bool {
        let input = digest(token);
        let diff = input
            .iter()
            .zip(self.token_hash.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        diff == 0
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate(&self, _context: &AuthContext, token: &Token) -> Verdict {
        if self.matches(token.as_bytes()) {
            Verdict::Granted(SessionInfo::from(STATIC_SESSION_INFO))
        } else {
            Verdict::Rejected(INCORRECT_TOKEN_MESSAGE.to_string())
        }
    }
}

impl fmt::Debug for StaticTokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenAuthenticator").finish_non_exhaustive()
    }
}

/// Service that accepts only `token`.
pub fn static_authentication_service(
    token: impl AsRef<[u8]>,
) -> Result<SerializedAuthenticationService> {
    SerializedAuthenticationService::new(Arc::new(StaticTokenAuthenticator::new(token)))
}

fn digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::error::AuthErrorKind;
    use crate::auth::service::AuthenticationService;
    use chrono::Utc;
    use uuid::Uuid;

    fn context() -> AuthContext {
        AuthContext {
            request_id: Uuid::new_v4(),
            sequence: 0,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn matching_token_is_granted() {
        let auth = StaticTokenAuthenticator::new("staticToken");
        assert_eq!(
            auth.authenticate(&context(), &Token::from("staticToken")),
            Verdict::Granted(SessionInfo::from("{}"))
        );
    }

    #[test]
    fn other_token_is_rejected() {
        let auth = StaticTokenAuthenticator::new("staticToken");
        assert!(!auth.matches(b"statictoken"));
        assert_eq!(
            auth.authenticate(&context(), &Token::from("nope")),
            Verdict::Rejected("Incorrect token".into())
        );
    }

    #[test]
    fn debug_does_not_leak_digest() {
        let auth = StaticTokenAuthenticator::new("staticToken");
        assert_eq!(format!("{auth:?}"), "StaticTokenAuthenticator { .. }");
    }

    #[tokio::test]
    async fn static_service_reports_incorrect_token() {
        crate::runtime::init();
        let svc = static_authentication_service("staticToken").unwrap();
        let err = svc
            .authenticate_async("wrong".into(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::InvalidArgument);
        assert_eq!(err.message(), "Incorrect token");

        let ok = svc
            .authenticate_async("staticToken".into(), None)
            .await
            .unwrap();
        assert_eq!(ok.as_str(), Some("{}"));
    }
}
