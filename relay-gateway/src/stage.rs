//! The shard's connection state machine.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// The state of a single shard's session.
///
/// See the module documentation of [`crate::shard`] for the allowed
/// transitions between these states.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ShardState {
    /// No socket, no reconnect pending. Initial state, and the state a
    /// shard returns to after [`Shard::kill`] or exhausting its spawn
    /// attempts.
    ///
    /// [`Shard::kill`]: crate::shard::Shard::kill
    Idle,
    /// The socket is opening; Hello has not yet been received.
    Connecting,
    /// Hello was received on a session with no resumable state; Identify
    /// has been sent and Ready is awaited.
    Identifying,
    /// Hello was received on a resumable session; Resume has been sent and
    /// Resumed is awaited.
    Resuming,
    /// Ready or Resumed was received. Dispatches and commands flow freely.
    Running,
    /// The socket closed or failed. Awaiting the spawn/restart loop's
    /// decision on whether, and how, to reconnect.
    Disconnected,
}

impl ShardState {
    /// Whether this state has live send-queue draining, i.e. whether
    /// [`Shard::send`] is expected to go out immediately rather than queue.
    ///
    /// [`Shard::send`]: crate::shard::Shard::send
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl Display for ShardState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting",
            Self::Identifying => "Identifying",
            Self::Resuming => "Resuming",
            Self::Running => "Running",
            Self::Disconnected => "Disconnected",
        })
    }
}
