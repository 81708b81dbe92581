//! Events a [`Shard`](crate::shard::Shard) emits to its consumer.

use crate::stage::ShardState;
use serde_json::Value;
use std::time::Duration;

/// One observable occurrence on a shard.
///
/// A consumer (almost always the [`ShardManager`]) drains these from the
/// channel returned alongside the [`Shard`] handle and relays dispatches
/// onward, typically into a cache and then to user-facing listeners.
///
/// [`Shard`]: crate::shard::Shard
/// [`ShardManager`]: crate::manager::ShardManager
#[derive(Debug, Clone)]
pub enum ShardEvent {
    /// The shard transitioned to a new state. Emitted once per transition.
    StateUpdate {
        from: ShardState,
        to: ShardState,
    },
    /// A payload was written to the socket.
    SentPayload {
        /// Size, in bytes, of the serialized frame.
        bytes: usize,
    },
    /// An inbound dispatch (opcode 0) was received and parsed.
    ReceivedPayload {
        /// The dispatch's event name, e.g. `"MESSAGE_CREATE"`.
        kind: String,
        /// The dispatch's monotonic sequence number.
        sequence: u64,
        /// The dispatch's inner data payload.
        data: Value,
    },
    /// The last heartbeat was acknowledged; `ping` is the observed round
    /// trip time.
    HeartbeatAck {
        ping: Duration,
    },
    /// The shard hit a fatal, non-reconnectable close and is now Idle
    /// permanently (until a fresh call to `spawn()`).
    Fatal {
        close_code: u16,
    },
}
