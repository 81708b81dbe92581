//! Session state shared between a shard's actor task and its public handle.

use crate::stage::ShardState;
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Mutex,
    },
    time::{Duration, Instant},
};
use tokio::sync::watch;

/// The mutable session state of a shard: resume tokens, sequence tracking,
/// heartbeat bookkeeping, and the current lifecycle state.
///
/// Held behind an `Arc` and shared between the shard's actor task (the only
/// writer) and its [`Shard`](crate::shard::Shard) handle (readers, plus the
/// `killed` flag which any handle may set).
#[derive(Debug)]
pub(crate) struct Session {
    state_tx: watch::Sender<ShardState>,
    state_rx: watch::Receiver<ShardState>,
    session_id: Mutex<Option<String>>,
    resume_url: Mutex<Option<String>>,
    last_sequence: AtomicU64,
    has_sequence: AtomicBool,
    heartbeat_interval_ms: AtomicU64,
    heartbeat_waiting_since: Mutex<Option<Instant>>,
    ping_ms: AtomicU64,
    killed: AtomicBool,
}

impl Session {
    pub(crate) fn new() -> Self {
        let (state_tx, state_rx) = watch::channel(ShardState::Idle);

        Self {
            state_tx,
            state_rx,
            session_id: Mutex::new(None),
            resume_url: Mutex::new(None),
            last_sequence: AtomicU64::new(0),
            has_sequence: AtomicBool::new(false),
            heartbeat_interval_ms: AtomicU64::new(0),
            heartbeat_waiting_since: Mutex::new(None),
            ping_ms: AtomicU64::new(0),
            killed: AtomicBool::new(false),
        }
    }

    pub(crate) fn state(&self) -> ShardState {
        *self.state_rx.borrow()
    }

    pub(crate) fn watch_state(&self) -> watch::Receiver<ShardState> {
        self.state_rx.clone()
    }

    /// Set the state, returning the prior state for event emission.
    pub(crate) fn set_state(&self, to: ShardState) -> ShardState {
        let from = self.state();
        let _ = self.state_tx.send(to);
        from
    }

    pub(crate) fn session_id(&self) -> Option<String> {
        self.session_id.lock().unwrap().clone()
    }

    pub(crate) fn set_session_id(&self, value: Option<String>) {
        *self.session_id.lock().unwrap() = value;
    }

    pub(crate) fn resume_url(&self) -> Option<String> {
        self.resume_url.lock().unwrap().clone()
    }

    pub(crate) fn set_resume_url(&self, value: Option<String>) {
        *self.resume_url.lock().unwrap() = value;
    }

    pub(crate) fn last_sequence(&self) -> Option<u64> {
        self.has_sequence
            .load(Ordering::Acquire)
            .then(|| self.last_sequence.load(Ordering::Acquire))
    }

    pub(crate) fn set_last_sequence(&self, value: u64) {
        self.last_sequence.store(value, Ordering::Release);
        self.has_sequence.store(true, Ordering::Release);
    }

    pub(crate) fn reset_sequence(&self) {
        self.has_sequence.store(false, Ordering::Release);
    }

    /// Whether a resume is possible: both a session id and a last sequence
    /// are on hand.
    pub(crate) fn can_resume(&self) -> bool {
        self.session_id().is_some() && self.last_sequence().is_some()
    }

    pub(crate) fn discard_session(&self) {
        self.set_session_id(None);
        self.reset_sequence();
    }

    pub(crate) fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms.load(Ordering::Acquire))
    }

    pub(crate) fn set_heartbeat_interval(&self, value: Duration) {
        self.heartbeat_interval_ms
            .store(value.as_millis() as u64, Ordering::Release);
    }

    pub(crate) fn mark_heartbeat_sent(&self) {
        *self.heartbeat_waiting_since.lock().unwrap() = Some(Instant::now());
    }

    /// Record an ACK, returning the observed round trip if one was pending.
    pub(crate) fn mark_heartbeat_acked(&self) -> Option<Duration> {
        let sent_at = self.heartbeat_waiting_since.lock().unwrap().take();
        let ping = sent_at.map(|sent_at| sent_at.elapsed());

        if let Some(ping) = ping {
            self.ping_ms.store(ping.as_millis() as u64, Ordering::Release);
        }

        ping
    }

    /// Whether a heartbeat was sent without a matching ACK yet: a zombie
    /// connection if this is still true when the next tick is due.
    pub(crate) fn is_awaiting_ack(&self) -> bool {
        self.heartbeat_waiting_since.lock().unwrap().is_some()
    }

    pub(crate) fn ping(&self) -> Duration {
        Duration::from_millis(self.ping_ms.load(Ordering::Acquire))
    }

    pub(crate) fn kill(&self) {
        self.killed.store(true, Ordering::Release);
    }

    pub(crate) fn is_killed(&self) -> bool {
        self.killed.load(Ordering::Acquire)
    }

    /// Clear the kill flag for a fresh `spawn()` after a prior `kill()`.
    pub(crate) fn revive(&self) {
        self.killed.store(false, Ordering::Release);
    }
}
