use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::authenticator::{AuthContext, Authenticator, RequestId};
use super::error::AuthError;
use super::queue::SerializationQueue;
use super::request::{AuthRequest, AuthResult, CompletionSink};
use super::token::{SessionInfo, Token};
use crate::error::Result;
use crate::runtime;

static NEXT_SERVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Asynchronous token authentication, as consumed by a hosting endpoint.
///
/// `authenticate` submits and returns at once; the outcome arrives in the
/// completion sink as an [`AuthResult`], which is turned into the session or
/// error by [`finish`](Self::finish).
#[async_trait]
pub trait AuthenticationService: Send + Sync {
    /// Submit `token` for authentication. Never blocks.
    ///
    /// `on_complete` runs exactly once, possibly on another thread.
    fn authenticate(
        &self,
        token: Token,
        cancellation: Option<CancellationToken>,
        on_complete: CompletionSink,
    ) -> RequestId;

    /// Take the terminal outcome out of a completed request.
    fn finish(&self, result: AuthResult) -> std::result::Result<SessionInfo, AuthError> {
        result.into_outcome()
    }

    /// Submit and await the outcome.
    async fn authenticate_async(
        &self,
        token: Token,
        cancellation: Option<CancellationToken>,
    ) -> std::result::Result<SessionInfo, AuthError> {
        let (tx, rx) = oneshot::channel();
        self.authenticate(
            token,
            cancellation,
            Box::new(move |result: AuthResult| {
                let _ = tx.send(result);
            }),
        );
        match rx.await {
            Ok(result) => self.finish(result),
            Err(_) => Err(AuthError::canceled()),
        }
    }
}

/// Authentication service that runs an [`Authenticator`] one request at a
/// time, in submission order, on a dedicated worker thread.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use authbridge::auth::{authenticator_fn, AuthenticationService, SerializedAuthenticationService};
///
/// # async fn example() -> authbridge::error::Result<()> {
/// authbridge::runtime::init();
/// let service = SerializedAuthenticationService::new(Arc::new(authenticator_fn(|token| {
///     format!("ok:{token}")
/// })))?;
/// let session = service.authenticate_async("A".into(), None).await;
/// assert_eq!(session.unwrap().as_str(), Some("ok:A"));
/// service.shutdown()?;
/// # Ok(())
/// # }
/// ```
pub struct SerializedAuthenticationService {
    id: u64,
    queue: Arc<SerializationQueue>,
}

impl SerializedAuthenticationService {
    /// Start a service around `authenticator`.
    ///
    /// Fails with [`BridgeError::NotInitialized`](crate::error::BridgeError::NotInitialized)
    /// unless [`runtime::init`] has been called.
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Result<Self> {
        runtime::ensure_initialized()?;
        let id = NEXT_SERVICE_ID.fetch_add(1, Ordering::Relaxed);
        let queue = Arc::new(SerializationQueue::spawn(
            format!("authbridge-worker-{id}"),
            authenticator,
        )?);
        runtime::register(id, Arc::downgrade(&queue))?;
        Ok(Self { id, queue })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Requests submitted but not yet fully processed.
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Stop running new requests. Anything still queued completes with
    /// `Canceled`; a request already executing finishes normally.
    pub fn close(&self) {
        self.queue.close();
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    /// Close the service and wait until every outstanding request has been
    /// resolved and the worker has exited.
    pub fn shutdown(self) -> Result<()> {
        self.queue.shutdown()
    }
}

#[async_trait]
impl AuthenticationService for SerializedAuthenticationService {
    fn authenticate(
        &self,
        token: Token,
        cancellation: Option<CancellationToken>,
        on_complete: CompletionSink,
    ) -> RequestId {
        let request_id = Uuid::new_v4();
        self.queue.push(|sequence| {
            tracing::debug!(
                service = self.id,
                request_id = %request_id,
                sequence,
                "auth request queued"
            );
            let context = AuthContext {
                request_id,
                sequence,
                submitted_at: Utc::now(),
            };
            AuthRequest::new(context, token, cancellation, on_complete)
        });
        request_id
    }
}

impl Drop for SerializedAuthenticationService {
    fn drop(&mut self) {
        runtime::unregister(self.id);
        self.queue.close();
    }
}

impl fmt::Debug for SerializedAuthenticationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializedAuthenticationService")
            .field("id", &self.id)
            .field("pending", &self.queue.pending())
            .field("closed", &self.queue.is_closed())
            .finish()
    }
}
