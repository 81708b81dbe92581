//! Events the [`ShardManager`](super::ShardManager) emits, and the hook it
//! offers dispatches to before re-emitting them.

use serde_json::Value;
use tokio::sync::mpsc;

/// Something that wants first look at every dispatch the manager relays,
/// before user-facing re-emission.
///
/// `relay-cache-inmemory`'s cache implements this; kept here as a narrow
/// trait so this crate never depends on the cache crate.
pub trait DispatchSink: Send + Sync {
    fn handle_dispatch(&self, kind: &str, data: &Value);
}

/// One observable occurrence on a [`ShardManager`](super::ShardManager).
#[derive(Debug, Clone)]
pub enum ManagerEvent {
    /// A shard transitioned between connection states.
    ShardStateUpdate {
        shard_id: u64,
        from: crate::stage::ShardState,
        to: crate::stage::ShardState,
    },
    /// A shard hit a fatal, non-reconnectable close.
    ShardFatal { shard_id: u64, close_code: u16 },
    /// The wildcard "any dispatch" event, emitted for every dispatch before
    /// its per-kind re-emission on a `subscribe()` stream.
    Dispatch {
        shard_id: u64,
        kind: String,
        sequence: u64,
        data: Value,
    },
}

/// A stream of [`ManagerEvent`]s, returned alongside a [`ShardManager`].
///
/// [`ShardManager`]: super::ShardManager
pub struct ManagerEvents(pub(crate) mpsc::UnboundedReceiver<ManagerEvent>);

impl ManagerEvents {
    pub async fn next(&mut self) -> Option<ManagerEvent> {
        self.0.recv().await
    }
}
