//! One in-flight authentication and its completion.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tokio_util::sync::CancellationToken;

use super::authenticator::{AuthContext, RequestId};
use super::error::AuthError;
use super::token::{SessionInfo, Token};

/// Caller-supplied completion callback. Invoked once, on the worker thread.
pub type CompletionSink = Box<dyn FnOnce(AuthResult) + Send + 'static>;

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompletionKind {
    Success,
    Error,
    Canceled,
}

/// Lifecycle of an [`AuthRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestState {
    Pending,
    Executing,
    Completed(CompletionKind),
}

impl RequestState {
    /// Whether `self -> next` is a legal transition.
    fn can_transition_to(self, next: RequestState) -> bool {
        match (self, next) {
            (RequestState::Pending, RequestState::Executing) => true,
            (RequestState::Pending, RequestState::Completed(_)) => true,
            (RequestState::Executing, RequestState::Completed(_)) => true,
            _ => false,
        }
    }
}

/// Terminal outcome of a request, handed to the completion sink.
///
/// Only built once a request has completed. Pass it to
/// [`AuthenticationService::finish`](super::service::AuthenticationService::finish)
/// to take the session info or error out of it.
pub struct AuthResult {
    request_id: RequestId,
    sequence: u64,
    outcome: Result<SessionInfo, AuthError>,
}

impl AuthResult {
    pub(crate) fn new(context: &AuthContext, outcome: Result<SessionInfo, AuthError>) -> Self {
        Self {
            request_id: context.request_id,
            sequence: context.sequence,
            outcome,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub(crate) fn into_outcome(self) -> Result<SessionInfo, AuthError> {
        self.outcome
    }
}

impl fmt::Debug for AuthResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResult")
            .field("request_id", &self.request_id)
            .field("sequence", &self.sequence)
            .field("success", &self.outcome.is_ok())
            .finish()
    }
}

/// A queued authentication: owned token, optional cancellation, and sink.
///
/// Dropping a request that was never completed delivers a `Canceled` error,
/// so a request discarded with the queue still reaches its caller.
pub(crate) struct AuthRequest {
    context: AuthContext,
    token: Token,
    cancellation: Option<CancellationToken>,
    sink: Option<CompletionSink>,
    state: RequestState,
}

impl AuthRequest {
    pub(crate) fn new(
        context: AuthContext,
        token: Token,
        cancellation: Option<CancellationToken>,
        sink: CompletionSink,
    ) -> Self {
        Self {
            context,
            token,
            cancellation,
            sink: Some(sink),
            state: RequestState::Pending,
        }
    }

    pub(crate) fn context(&self) -> &AuthContext {
        &self.context
    }

    pub(crate) fn token(&self) -> &Token {
        &self.token
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> RequestState {
        self.state
    }

    pub(crate) fn is_canceled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Move to `Executing`. Returns `false` if the request is not pending.
    pub(crate) fn begin(&mut self) -> bool {
        self.transition(RequestState::Executing)
    }

    /// Deliver the outcome to the sink. Consumes the request, so a request
    /// completes at most once.
    pub(crate) fn complete(mut self, outcome: Result<SessionInfo, AuthError>) {
        self.deliver(outcome);
    }

    fn transition(&mut self, next: RequestState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                request_id = %self.context.request_id,
                from = ?self.state,
                to = ?next,
                "refusing illegal auth request transition"
            );
            return false;
        }
        self.state = next;
        true
    }

    fn deliver(&mut self, outcome: Result<SessionInfo, AuthError>) {
        let kind = match &outcome {
            Ok(_) => CompletionKind::Success,
            Err(err) if err.is_canceled() => CompletionKind::Canceled,
            Err(_) => CompletionKind::Error,
        };
        if !self.transition(RequestState::Completed(kind)) {
            return;
        }
        let Some(sink) = self.sink.take() else {
            return;
        };

        tracing::debug!(
            request_id = %self.context.request_id,
            sequence = self.context.sequence,
            outcome = ?kind,
            "auth request completed"
        );
        let result = AuthResult::new(&self.context, outcome);
        if panic::catch_unwind(AssertUnwindSafe(move || sink(result))).is_err() {
            tracing::warn!(
                request_id = %self.context.request_id,
                "auth completion callback panicked"
            );
        }
    }
}

impl Drop for AuthRequest {
    fn drop(&mut self) {
        if self.sink.is_some() {
            self.deliver(Err(AuthError::canceled()));
        }
    }
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthRequest")
            .field("context", &self.context)
            .field("token", &self.token)
            .field("state", &self.state)
            .finish()
    }
}
