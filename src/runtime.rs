//! Process-wide bridge runtime.
//!
//! [`init`] must run before the first service is created. [`deinit`] is its
//! teardown: it closes every live service, so their queued requests complete
//! with `Canceled`, and refuses new services until `init` is called again.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, Weak};

use crate::auth::queue::SerializationQueue;
use crate::error::{BridgeError, Result};

#[derive(Default)]
struct RuntimeState {
    initialized: bool,
    services: HashMap<u64, Weak<SerializationQueue>>,
}

static RUNTIME: Mutex<Option<RuntimeState>> = Mutex::new(None);

fn state() -> MutexGuard<'static, Option<RuntimeState>> {
    RUNTIME.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Initialize the runtime. Repeated calls are no-ops.
pub fn init() {
    let mut guard = state();
    let runtime = guard.get_or_insert_with(RuntimeState::default);
    if !runtime.initialized {
        runtime.initialized = true;
        tracing::debug!("authbridge runtime initialized");
    }
}

/// Tear the runtime down, closing all live services.
pub fn deinit() {
    let services: Vec<Weak<SerializationQueue>> = {
        let mut guard = state();
        let Some(runtime) = guard.as_mut() else {
            return;
        };
        if !runtime.initialized {
            return;
        }
        runtime.initialized = false;
        runtime.services.drain().map(|(_, queue)| queue).collect()
    };

    let mut closed = 0usize;
    for queue in services.iter().filter_map(Weak::upgrade) {
        queue.close();
        closed += 1;
    }
    tracing::debug!(closed, "authbridge runtime deinitialized");
}

pub fn is_initialized() -> bool {
    state().as_ref().is_some_and(|runtime| runtime.initialized)
}

/// Number of services created since `init` that are still alive.
pub fn live_services() -> usize {
    state().as_ref().map_or(0, |runtime| {
        runtime
            .services
            .values()
            .filter(|queue| queue.strong_count() > 0)
            .count()
    })
}

pub(crate) fn ensure_initialized() -> Result<()> {
    if is_initialized() {
        Ok(())
    } else {
        Err(BridgeError::NotInitialized)
    }
}

pub(crate) fn register(id: u64, queue: Weak<SerializationQueue>) -> Result<()> {
    match state().as_mut() {
        Some(runtime) if runtime.initialized => {
            runtime.services.insert(id, queue);
            Ok(())
        }
        _ => Err(BridgeError::NotInitialized),
    }
}

pub(crate) fn unregister(id: u64) {
    if let Some(runtime) = state().as_mut() {
        runtime.services.remove(&id);
    }
}
