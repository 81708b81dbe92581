//! The public [`Shard`] handle and the event stream paired with it.
//!
//! # State machine
//!
//! ```text
//! Idle --spawn()--> Connecting --Hello, no session--> Identifying --Ready--> Running
//!                    Connecting --Hello, resumable---> Resuming  --Resumed-> Running
//! Running --socket closes, reconnectable-------------> Disconnected -> Connecting (auto)
//! Running --zombie (missed heartbeat ack)-------------> Disconnected -> Connecting (auto, Resume)
//! (any)   --socket closes, non-reconnectable----------> Idle (Fatal event, no further retries)
//! (any)   --kill()-------------------------------------> Idle
//! ```
//!
//! A [`Shard`] is a cheap, `Clone`-able handle to a background actor task
//! (see [`crate::actor`]) that owns the socket, the heartbeat timer, and the
//! outbound send queue. The handle and the actor communicate entirely by
//! message passing; there is no shared mutable protocol state beyond the
//! read-only snapshot in [`Session`](crate::session::Session).

use crate::{
    actor::{ActorCommand, ShardActor},
    config::ShardConfig,
    error::ShardError,
    event::ShardEvent,
    session::Session,
    stage::ShardState,
};
use relay_gateway_queue::{NoopQueue, Queue};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch, Notify};

/// A stream of events produced by a [`Shard`], returned alongside it from
/// [`Shard::new`].
pub struct ShardEvents(mpsc::UnboundedReceiver<ShardEvent>);

impl ShardEvents {
    /// Wait for the next event. Returns `None` once the shard handle and
    /// its actor have both been dropped.
    pub async fn next(&mut self) -> Option<ShardEvent> {
        self.0.recv().await
    }
}

/// A handle to a single shard's connection to the gateway.
///
/// Cloning a `Shard` is cheap: all clones refer to the same actor task and
/// session state. Dropping every clone (and the paired [`ShardEvents`])
/// tears the actor down.
#[derive(Clone)]
pub struct Shard {
    id: u64,
    total_shards: u64,
    config: ShardConfig,
    session: Arc<Session>,
    command_tx: mpsc::UnboundedSender<ActorCommand>,
    kill_notify: Arc<Notify>,
}

impl Shard {
    /// Create a shard and its actor task. The actor is idle until
    /// [`Shard::spawn`] is called.
    pub fn new(id: u64, total_shards: u64, config: ShardConfig) -> (Self, ShardEvents) {
        Self::with_queue(id, total_shards, config, Arc::new(NoopQueue))
    }

    /// Like [`Shard::new`], but with an explicit identify-pacing queue.
    /// Used by the shard manager, which installs one [`Queue`] per
    /// concurrency bucket rather than the no-op default.
    pub fn with_queue(
        id: u64,
        total_shards: u64,
        config: ShardConfig,
        identify_queue: Arc<dyn Queue>,
    ) -> (Self, ShardEvents) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let session = Arc::new(Session::new());
        let kill_notify = Arc::new(Notify::new());

        let actor = ShardActor::new(
            id,
            total_shards,
            config.clone(),
            identify_queue,
            Arc::clone(&session),
            events_tx,
            command_rx,
            Arc::clone(&kill_notify),
        );

        tokio::spawn(actor.run());

        let shard = Self {
            id,
            total_shards,
            config,
            session,
            command_tx,
            kill_notify,
        };

        (shard, ShardEvents(events_rx))
    }

    /// This shard's zero-based id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The total shard count this shard was configured with.
    pub fn total_shards(&self) -> u64 {
        self.total_shards
    }

    /// The current connection state.
    pub fn state(&self) -> ShardState {
        self.session.state()
    }

    /// Subscribe to state changes without draining the event stream.
    pub fn watch_state(&self) -> watch::Receiver<ShardState> {
        self.session.watch_state()
    }

    /// The most recently observed heartbeat round-trip time.
    pub fn latency(&self) -> std::time::Duration {
        self.session.ping()
    }

    /// Connect, retrying up to `spawn_max_attempts` times with
    /// `spawn_attempt_delay` between attempts, each bounded by
    /// `spawn_timeout`. Returns once the shard reaches `Running`, or once
    /// every attempt has failed.
    ///
    /// Once connected, reconnects after a transient drop happen
    /// automatically and indefinitely in the background — callers don't
    /// need to call `spawn()` or [`Shard::restart`] again unless the shard
    /// reached a fatal close or was killed.
    pub async fn spawn(&self) -> Result<(), ShardError> {
        self.connect(Some(self.config.spawn_max_attempts())).await
    }

    /// Like [`Shard::spawn`], but retries indefinitely rather than giving
    /// up after a bounded number of attempts. Useful for explicitly
    /// restarting a shard that is `Idle` after a prior `kill()`.
    pub async fn restart(&self) -> Result<(), ShardError> {
        self.connect(None).await
    }

    async fn connect(&self, bounded_attempts: Option<u8>) -> Result<(), ShardError> {
        let (ack, rx) = oneshot::channel();

        if self
            .command_tx
            .send(ActorCommand::Connect { bounded_attempts, ack })
            .is_err()
        {
            return Err(ShardError::new(
                crate::error::ShardErrorType::InterruptFromKill,
            ));
        }

        rx.await.unwrap_or(Err(ShardError::new(
            crate::error::ShardErrorType::InterruptFromKill,
        )))
    }

    /// Send a frame. Outside the `Running` state, the frame is queued and
    /// flushed in order as soon as `Running` is reached. Kill()-ing the
    /// shard resolves any still-queued sends with an error instead.
    pub async fn send(&self, payload: String) -> Result<(), ShardError> {
        let (resolve, rx) = oneshot::channel();

        if self
            .command_tx
            .send(ActorCommand::Send { payload, resolve })
            .is_err()
        {
            return Err(ShardError::new(
                crate::error::ShardErrorType::SendQueueForceFlushed,
            ));
        }

        rx.await.unwrap_or(Err(ShardError::new(
            crate::error::ShardErrorType::SendQueueForceFlushed,
        )))
    }

    /// Close the connection (if any) with the given close code and reason,
    /// discard any still-queued sends, and stop reconnecting. Idempotent.
    pub fn kill(&self, code: u16, reason: impl Into<String>) {
        self.session.kill();
        self.kill_notify.notify_waiters();
        let _ = self.command_tx.send(ActorCommand::Kill {
            code,
            reason: reason.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::Shard;
    use crate::{config::ShardConfig, stage::ShardState};

    #[tokio::test]
    async fn a_fresh_shard_starts_idle_with_no_latency() {
        let (shard, _events) = Shard::new(0, 1, ShardConfig::builder("token").build());

        assert_eq!(ShardState::Idle, shard.state());
        assert_eq!(0, shard.id());
        assert_eq!(1, shard.total_shards());
        assert_eq!(std::time::Duration::ZERO, shard.latency());
    }

    #[tokio::test]
    async fn clones_observe_the_same_session_state() {
        let (shard, _events) = Shard::new(0, 2, ShardConfig::builder("token").build());
        let clone = shard.clone();

        assert_eq!(shard.state(), clone.state());

        let watch = clone.watch_state();
        assert_eq!(ShardState::Idle, *watch.borrow());
    }

    #[tokio::test]
    async fn killing_an_idle_shard_does_not_panic_and_stays_idle() {
        let (shard, _events) = Shard::new(0, 1, ShardConfig::builder("token").build());

        shard.kill(1000, "test");

        assert_eq!(ShardState::Idle, shard.state());
    }
}
