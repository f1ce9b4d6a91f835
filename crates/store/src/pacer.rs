//! Request pacing for the record store's rate limit.
//!
//! The store enforces a global request budget, so all outgoing requests
//! must be spaced by a minimum interval. [`RequestPacer`] is an explicit
//! serialization primitive owned by the adapter: a mutex-guarded "last
//! request" timestamp with a trailing-edge delay. Sharing one pacer via
//! `Arc` gives a process-wide ordering guarantee without hidden
//! module-level state.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum spacing between store requests (5 requests per second).
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(200);

/// Serializes callers and enforces a minimum interval between the
/// moments [`acquire`](Self::acquire) returns.
#[derive(Debug)]
pub struct RequestPacer {
    interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    /// Create a pacer with the given minimum inter-request interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Mutex::new(None),
        }
    }

    /// Wait until the next request is allowed to start.
    ///
    /// The mutex is held across the sleep, so concurrent callers are
    /// strictly serialized and each departure is spaced by at least the
    /// configured interval.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for RequestPacer {
    fn default() -> Self {
        Self::new(MIN_REQUEST_INTERVAL)
    }
}
