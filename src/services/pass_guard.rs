use std::sync::Arc;

use metrics::counter;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Non-blocking single-flight guard for a periodic pass.
///
/// If the previous invocation still holds the guard, the new one is dropped
/// rather than queued.
#[derive(Debug, Clone)]
pub struct PassGuard {
    name: &'static str,
    lock: Arc<Mutex<()>>,
}

impl PassGuard {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Enter the pass, or `None` if it is already running.
    pub fn try_enter(&self) -> Option<OwnedMutexGuard<()>> {
        match self.lock.clone().try_lock_owned() {
            Ok(guard) => Some(guard),
            Err(_) => {
                counter!("passes_skipped_total", "pass" => self.name).increment(1);
                tracing::warn!(pass = self.name, "Previous pass still running, skipping");
                None
            }
        }
    }
}
