//! Single-consumer FIFO queue drained by one dedicated worker thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use tokio::sync::mpsc;

use super::authenticator::{Authenticator, Verdict};
use super::error::AuthError;
use super::request::AuthRequest;
use super::token::SessionInfo;
use crate::error::{BridgeError, Result};

pub(crate) const CLOSED_MESSAGE: &str = "Authentication service is closed";
pub(crate) const EMPTY_TOKEN_MESSAGE: &str = "Token must not be empty";

/// State shared between the submitting side and the worker.
#[derive(Debug, Default)]
struct QueueShared {
    closing: AtomicBool,
    pending: AtomicUsize,
}

/// Serialization queue for one service instance.
///
/// The worker owns the receiving end and its own `Arc` of the authenticator,
/// so nothing it uses can be released while a request is running. Dropping
/// the queue closes it and detaches the worker, which cancels what is left
/// and exits.
pub(crate) struct SerializationQueue {
    label: String,
    sender: Mutex<Option<mpsc::UnboundedSender<AuthRequest>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    shared: Arc<QueueShared>,
    next_sequence: AtomicU64,
}

impl SerializationQueue {
    pub(crate) fn spawn(label: String, authenticator: Arc<dyn Authenticator>) -> Result<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(QueueShared::default());

        let worker_shared = shared.clone();
        let worker_label = label.clone();
        let worker = std::thread::Builder::new()
            .name(label.clone())
            .spawn(move || run_worker(&worker_label, receiver, authenticator, &worker_shared))
            .map_err(BridgeError::WorkerSpawn)?;

        tracing::debug!(service = %label, "auth worker started");
        Ok(Self {
            label,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            shared,
            next_sequence: AtomicU64::new(0),
        })
    }

    /// Append a request built by `make` from its sequence number. Never blocks.
    ///
    /// The sequence is drawn while the sender is locked, so sequence order and
    /// queue order agree even with many submitting threads.
    pub(crate) fn push(&self, make: impl FnOnce(u64) -> AuthRequest) {
        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        let rejected = {
            let sender = lock(&self.sender);
            let request = make(self.next_sequence.fetch_add(1, Ordering::Relaxed));
            match sender.as_ref() {
                Some(sender) => sender.send(request).err().map(|e| e.0),
                None => Some(request),
            }
        };
        if let Some(request) = rejected {
            self.shared.pending.fetch_sub(1, Ordering::SeqCst);
            request.complete(Err(AuthError::canceled_with(CLOSED_MESSAGE)));
        }
    }

    /// Stop executing new work. Requests still queued are canceled by the worker.
    pub(crate) fn close(&self) {
        if !self.shared.closing.swap(true, Ordering::SeqCst) {
            tracing::debug!(service = %self.label, "auth service closing");
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.shared.closing.load(Ordering::SeqCst)
    }

    pub(crate) fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }

    /// Close, let the worker resolve everything queued, and wait for it to exit.
    ///
    /// Called from the worker itself (inside a completion sink), the worker is
    /// detached instead of joined; it exits once the queue is drained.
    pub(crate) fn shutdown(&self) -> Result<()> {
        self.close();
        drop(lock(&self.sender).take());
        let worker = lock(&self.worker).take();
        match worker {
            Some(handle) if handle.thread().id() == std::thread::current().id() => {
                tracing::debug!(service = %self.label, "shutdown requested from worker, detaching");
                Ok(())
            }
            Some(handle) => handle.join().map_err(|_| BridgeError::WorkerPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for SerializationQueue {
    fn drop(&mut self) {
        self.close();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn run_worker(
    label: &str,
    mut receiver: mpsc::UnboundedReceiver<AuthRequest>,
    authenticator: Arc<dyn Authenticator>,
    shared: &QueueShared,
) {
    while let Some(request) = receiver.blocking_recv() {
        process(request, authenticator.as_ref(), shared);
        shared.pending.fetch_sub(1, Ordering::SeqCst);
    }
    tracing::debug!(service = %label, "auth worker stopped");
}

fn process(mut request: AuthRequest, authenticator: &dyn Authenticator, shared: &QueueShared) {
    if shared.closing.load(Ordering::SeqCst) {
        request.complete(Err(AuthError::canceled_with(CLOSED_MESSAGE)));
        return;
    }
    if request.is_canceled() {
        request.complete(Err(AuthError::canceled()));
        return;
    }
    if request.token().is_empty() {
        request.complete(Err(AuthError::invalid_argument(EMPTY_TOKEN_MESSAGE)));
        return;
    }

    request.begin();
    let verdict = panic::catch_unwind(AssertUnwindSafe(|| {
        authenticator.authenticate(request.context(), request.token())
    }));
    let outcome = match verdict {
        Ok(verdict) => map_verdict(verdict),
        Err(_) => {
            tracing::warn!(
                request_id = %request.context().request_id,
                "authenticator panicked"
            );
            Err(AuthError::internal())
        }
    };
    request.complete(outcome);
}

pub(crate) fn map_verdict(verdict: Verdict) -> std::result::Result<SessionInfo, AuthError> {
    match verdict {
        Verdict::Granted(info) if !info.is_empty() => Ok(info),
        Verdict::Granted(_) | Verdict::Unavailable => Err(AuthError::internal()),
        Verdict::Rejected(message) => Err(AuthError::invalid_argument(message)),
    }
}
