use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Single-slot delayed trigger. While one job is waiting out the delay, new
/// requests are dropped, so a burst of page mutations collapses into one pass.
pub struct MutationDebouncer {
    delay: Duration,
    pending: Arc<AtomicBool>,
    cancel_token: CancellationToken,
}

impl MutationDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(AtomicBool::new(false)),
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Run `job` once `delay` has elapsed. Returns false when the request was
    /// coalesced into an already pending one, or the debouncer is shut down.
    pub fn schedule<F>(&self, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.cancel_token.is_cancelled() {
            return false;
        }
        if self.pending.swap(true, Ordering::SeqCst) {
            return false;
        }

        let pending = Arc::clone(&self.pending);
        let token = self.cancel_token.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    // Free the slot first: mutations made while the job runs
                    // must be able to schedule the next one.
                    pending.store(false, Ordering::SeqCst);
                    job.await;
                }
                _ = token.cancelled() => {
                    pending.store(false, Ordering::SeqCst);
                }
            }
        });
        true
    }

    /// Drop any pending job and refuse new ones.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Default for MutationDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
