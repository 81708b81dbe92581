//! Identify-rate pacing for gateway shards.
//!
//! Discord allows one `Identify` per roughly 5 seconds within a given
//! concurrency bucket. The [`Shard`] state machine doesn't pace itself; it
//! asks a [`Queue`] for permission before sending Identify, and the queue
//! decides when to grant it. [`LocalQueue`] is the in-process implementation
//! the [`Shard Manager`] installs by default, one per bucket.
//!
//! [`Shard`]: https://docs.rs/relay-gateway
//! [`Shard Manager`]: https://docs.rs/relay-gateway

use std::{fmt::Debug, time::Duration};
use tokio::sync::{mpsc, oneshot};

/// Something that can authorize a shard to identify.
///
/// Implementors decide *when* to grant a request, not *whether*; every
/// request is eventually granted.
#[async_trait::async_trait]
pub trait Queue: Debug + Send + Sync {
    /// Wait until this shard is allowed to send its Identify payload.
    async fn request(&self, shard_id: [u64; 2]);
}

/// An in-process queue that releases one waiting shard every `interval`.
///
/// Not suitable for bots whose shards run across multiple processes: two
/// processes each running their own `LocalQueue` can grant identifies
/// concurrently, which Discord's real rate limiter will reject.
#[derive(Debug, Clone)]
pub struct LocalQueue {
    tx: mpsc::UnboundedSender<oneshot::Sender<()>>,
}

impl LocalQueue {
    /// Create a queue that releases one request every `interval`.
    pub fn new(interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx, interval));

        Self { tx }
    }
}

impl Default for LocalQueue {
    /// Releases one request every 6 seconds, matching Discord's documented
    /// identify rate limit of 1 per 5 seconds with headroom for jitter.
    fn default() -> Self {
        Self::new(Duration::from_secs(6))
    }
}

async fn run(mut rx: mpsc::UnboundedReceiver<oneshot::Sender<()>>, interval: Duration) {
    while let Some(waiter) = rx.recv().await {
        if waiter.send(()).is_err() {
            tracing::warn!("identify waiter dropped before being granted");
        }

        tokio::time::sleep(interval).await;
    }
}

#[async_trait::async_trait]
impl Queue for LocalQueue {
    async fn request(&self, [id, total]: [u64; 2]) {
        let (tx, rx) = oneshot::channel();

        if self.tx.send(tx).is_err() {
            tracing::warn!("queue waiter task is gone, identifying unthrottled");
            return;
        }

        tracing::debug!(shard.id = id, shard.total = total, "waiting for identify allowance");
        let _ = rx.await;
    }
}

/// A queue that never delays requests.
///
/// Useful under `disable_bucket_ratelimits`, or in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopQueue;

#[async_trait::async_trait]
impl Queue for NoopQueue {
    async fn request(&self, _shard_id: [u64; 2]) {}
}

#[cfg(test)]
mod tests {
    use super::{LocalQueue, NoopQueue, Queue};
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn local_queue_spaces_requests() {
        let queue = LocalQueue::new(Duration::from_millis(100));

        let start = Instant::now();
        queue.request([0, 1]).await;
        queue.request([1, 1]).await;

        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn noop_queue_never_blocks() {
        NoopQueue.request([0, 1]).await;
    }
}
