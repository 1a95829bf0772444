//! The external decision function plugged into a service.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::token::{SessionInfo, Token};

/// Identifier assigned to every submitted request.
pub type RequestId = Uuid;

/// Per-call information handed to an [`Authenticator`] alongside the token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub request_id: RequestId,
    /// Position of the request in its service's submission order, starting at 0.
    pub sequence: u64,
    pub submitted_at: DateTime<Utc>,
}

/// Decision returned by an [`Authenticator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Authenticated; the blob becomes the caller's session info.
    Granted(SessionInfo),
    /// Explicitly rejected, with a reason shown to the caller.
    Rejected(String),
    /// No result and no reason.
    Unavailable,
}

impl From<Option<SessionInfo>> for Verdict {
    fn from(value: Option<SessionInfo>) -> Self {
        match value {
            Some(info) => Verdict::Granted(info),
            None => Verdict::Unavailable,
        }
    }
}

/// Opaque token -> session decision function.
///
/// Called from a single worker thread, one call at a time, and allowed to
/// block. The token is only borrowed for the duration of the call.
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self, context: &AuthContext, token: &Token) -> Verdict;
}

impl<F> Authenticator for F
where
    F: Fn(&AuthContext, &Token) -> Verdict + Send + Sync + 'static,
{
    fn authenticate(&self, context: &AuthContext, token: &Token) -> Verdict {
        self(context, token)
    }
}

/// Adapter for string callbacks: an empty return value means "not authenticated".
pub struct FnAuthenticator<F> {
    callback: F,
}

impl<F> std::fmt::Debug for FnAuthenticator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAuthenticator").finish_non_exhaustive()
    }
}

impl<F> Authenticator for FnAuthenticator<F>
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    fn authenticate(&self, _context: &AuthContext, token: &Token) -> Verdict {
        let text = String::from_utf8_lossy(token.as_bytes());
        let session = (self.callback)(&text);
        if session.is_empty() {
            Verdict::Unavailable
        } else {
            Verdict::Granted(SessionInfo::from(session))
        }
    }
}

/// Wrap a `Fn(&str) -> String` callback as an [`Authenticator`].
///
/// # Example
/// ```
/// use authbridge::auth::authenticator_fn;
///
/// let auth = authenticator_fn(|token| {
///     if token == "secret_token" {
///         "session-1".to_string()
///     } else {
///         String::new()
///     }
/// });
/// # let _ = auth;
/// ```
pub fn authenticator_fn<F>(callback: F) -> FnAuthenticator<F>
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    FnAuthenticator { callback }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> AuthContext {
        AuthContext {
            request_id: Uuid::new_v4(),
            sequence: 0,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn string_callback_empty_result_is_unavailable() {
        let auth = authenticator_fn(|_| String::new());
        assert_eq!(
            auth.authenticate(&context(), &Token::from("x")),
            Verdict::Unavailable
        );
    }

    #[test]
    fn string_callback_non_empty_result_is_granted() {
        let auth = authenticator_fn(|token| format!("ok:{token}"));
        assert_eq!(
            auth.authenticate(&context(), &Token::from("A")),
            Verdict::Granted(SessionInfo::from("ok:A"))
        );
    }

    #[test]
    fn closures_implement_authenticator() {
        let auth = |_: &AuthContext, _: &Token| Verdict::Rejected("nope".into());
        assert_eq!(
            auth.authenticate(&context(), &Token::from("A")),
            Verdict::Rejected("nope".into())
        );
    }

    #[test]
    fn verdict_from_option() {
        assert_eq!(Verdict::from(None), Verdict::Unavailable);
        assert_eq!(
            Verdict::from(Some(SessionInfo::from("s"))),
            Verdict::Granted(SessionInfo::from("s"))
        );
    }
}
