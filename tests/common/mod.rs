//! Shared test helpers: recording authenticator, gate, completion collector.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use authbridge::auth::{
    AuthContext, AuthError, AuthResult, AuthenticationService, Authenticator, CompletionSink,
    SerializedAuthenticationService, SessionInfo, Token, Verdict,
};

pub const WAIT: Duration = Duration::from_secs(5);

/// Start a service around `auth`, initializing the runtime first.
pub fn start(auth: Arc<dyn Authenticator>) -> SerializedAuthenticationService {
    authbridge::runtime::init();
    SerializedAuthenticationService::new(auth).expect("service starts")
}

/// Records every call and tracks how many run at once.
pub struct Recorder {
    calls: Mutex<Vec<Vec<u8>>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    delay: Duration,
    respond: Box<dyn Fn(&Token) -> Verdict + Send + Sync>,
}

impl Recorder {
    /// Answers `"ok:" + token`.
    pub fn ok_prefix(delay: Duration) -> Arc<Self> {
        Self::with(delay, |token| {
            let text = String::from_utf8_lossy(token.as_bytes());
            Verdict::Granted(SessionInfo::from(format!("ok:{text}")))
        })
    }

    pub fn with(
        delay: Duration,
        respond: impl Fn(&Token) -> Verdict + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            delay,
            respond: Box::new(respond),
        })
    }

    pub fn calls(&self) -> Vec<Vec<u8>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl Authenticator for Recorder {
    fn authenticate(&self, _context: &AuthContext, token: &Token) -> Verdict {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(token.as_bytes().to_vec());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let verdict = (self.respond)(token);
        self.active.fetch_sub(1, Ordering::SeqCst);
        verdict
    }
}

/// Blocks every call until released, announcing when a call has started.
pub struct Gate {
    started: Mutex<mpsc::Sender<Vec<u8>>>,
    release: Mutex<mpsc::Receiver<()>>,
}

pub struct GateHandle {
    pub started: mpsc::Receiver<Vec<u8>>,
    release: mpsc::Sender<()>,
}

impl GateHandle {
    pub fn release_one(&self) {
        let _ = self.release.send(());
    }
}

impl Gate {
    pub fn new() -> (Arc<Self>, GateHandle) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        (
            Arc::new(Self {
                started: Mutex::new(started_tx),
                release: Mutex::new(release_rx),
            }),
            GateHandle {
                started: started_rx,
                release: release_tx,
            },
        )
    }
}

impl Authenticator for Gate {
    fn authenticate(&self, _context: &AuthContext, token: &Token) -> Verdict {
        let _ = self.started.lock().unwrap().send(token.as_bytes().to_vec());
        let _ = self.release.lock().unwrap().recv();
        Verdict::Granted(SessionInfo::from(format!(
            "ok:{}",
            String::from_utf8_lossy(token.as_bytes())
        )))
    }
}

/// Collects `(label, result)` pairs from completion sinks.
pub struct Completions {
    tx: mpsc::Sender<(String, AuthResult)>,
    rx: mpsc::Receiver<(String, AuthResult)>,
}

impl Completions {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sink(&self, label: impl Into<String>) -> CompletionSink {
        let tx = self.tx.clone();
        let label = label.into();
        Box::new(move |result: AuthResult| {
            let _ = tx.send((label, result));
        })
    }

    /// Wait for exactly `n` completions and map them through `finish`.
    pub fn take(
        &self,
        service: &dyn AuthenticationService,
        n: usize,
    ) -> Vec<(String, Result<SessionInfo, AuthError>)> {
        (0..n)
            .map(|_| {
                let (label, result) = self.rx.recv_timeout(WAIT).expect("completion in time");
                (label, service.finish(result))
            })
            .collect()
    }

    /// Nothing else arrives within a short grace period.
    pub fn assert_quiet(&self) {
        assert!(
            self.rx.recv_timeout(Duration::from_millis(100)).is_err(),
            "unexpected extra completion"
        );
    }
}
