//! The per-shard outbound send queue.
//!
//! `send()` calls made while a shard isn't `Running` are held here in FIFO
//! order rather than failing outright; entering `Running` drains them
//! before any caller-issued send made afterward can overtake them. Frames
//! the protocol engine itself emits (Heartbeat, Identify, Resume, the
//! reconnect-triggered Identify after a non-resumable `InvalidSession`)
//! bypass this queue entirely.

use crate::error::{ShardError, ShardErrorType};
use std::collections::VecDeque;
use tokio::sync::oneshot;

pub(crate) struct QueuedFrame {
    pub(crate) payload: String,
    pub(crate) resolve: oneshot::Sender<Result<(), ShardError>>,
}

#[derive(Default)]
pub(crate) struct SendQueue {
    queue: VecDeque<QueuedFrame>,
}

impl SendQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, payload: String, resolve: oneshot::Sender<Result<(), ShardError>>) {
        self.queue.push_back(QueuedFrame { payload, resolve });
    }

    pub(crate) fn pop(&mut self) -> Option<QueuedFrame> {
        self.queue.pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Reject every pending frame with a "force flushed" error. Used by
    /// `kill()`, which must not leave callers waiting forever.
    pub(crate) fn force_flush(&mut self) {
        for frame in self.queue.drain(..) {
            let _ = frame
                .resolve
                .send(Err(ShardError::new(ShardErrorType::SendQueueForceFlushed)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SendQueue;
    use tokio::sync::oneshot;

    #[test]
    fn preserves_fifo_order() {
        let mut queue = SendQueue::new();
        let (tx1, _rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();
        queue.push("a".into(), tx1);
        queue.push("b".into(), tx2);

        assert_eq!("a", queue.pop().unwrap().payload);
        assert_eq!("b", queue.pop().unwrap().payload);
        assert!(queue.pop().is_none());
    }

    #[tokio::test]
    async fn force_flush_rejects_all_waiters() {
        let mut queue = SendQueue::new();
        let (tx, rx) = oneshot::channel();
        queue.push("a".into(), tx);

        queue.force_flush();
        assert!(queue.is_empty());
        assert!(rx.await.unwrap().is_err());
    }
}
