//! The shard manager: owns a whole shard fleet, computes topology, spawns
//! shards in rate-limit-respecting waves, routes guild-scoped commands, and
//! coordinates scatter/gather member requests.

mod config;
pub mod error;
pub mod event;
mod members;
pub mod rest;
mod topology;

pub use config::{ShardManagerConfig, ShardManagerConfigBuilder};
pub use error::{ManagerError, ManagerErrorType};
pub use event::{DispatchSink, ManagerEvent, ManagerEvents};
pub use members::MemberChunkResult;
pub use rest::{GatewayBotInfo, SessionStartLimit};
pub use topology::{ShardingRequest, Topology};

use crate::shard::Shard;
use dashmap::DashMap;
use members::MemberRequestRegistry;
use relay_gateway_queue::{LocalQueue, NoopQueue, Queue};
use relay_model::id::{GuildMarker, Id};
use serde_json::Value;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, RwLock,
};
use tokio::sync::{mpsc, oneshot};

/// Which shards an `update_presence` call should target.
#[derive(Clone, Debug)]
pub enum PresenceTarget {
    Shard(u64),
    Shards(Vec<u64>),
    All,
}

struct Inner {
    config: ShardManagerConfig,
    shards: DashMap<u64, Shard>,
    topology: RwLock<Option<Topology>>,
    connected: AtomicBool,
    request_nonce_counter: AtomicU64,
    member_requests: MemberRequestRegistry,
    events_tx: mpsc::UnboundedSender<ManagerEvent>,
    typed_listeners: DashMap<String, Vec<mpsc::UnboundedSender<Value>>>,
    dispatch_sink: Option<Arc<dyn DispatchSink>>,
}

/// Owns a fleet of [`Shard`]s and the topology they were spawned under.
///
/// Cheap to clone; every clone shares the same shard set and routing table.
#[derive(Clone)]
pub struct ShardManager(Arc<Inner>);

impl ShardManager {
    /// Create a manager. It owns no shards and is unconnected until
    /// [`ShardManager::connect`] succeeds.
    pub fn new(config: ShardManagerConfig, dispatch_sink: Option<Arc<dyn DispatchSink>>) -> (Self, ManagerEvents) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let inner = Inner {
            config,
            shards: DashMap::new(),
            topology: RwLock::new(None),
            connected: AtomicBool::new(false),
            request_nonce_counter: AtomicU64::new(0),
            member_requests: MemberRequestRegistry::new(),
            events_tx,
            typed_listeners: DashMap::new(),
            dispatch_sink,
        };

        (Self(Arc::new(inner)), ManagerEvents(events_rx))
    }

    /// The resolved topology, once `connect()` has succeeded.
    pub fn topology(&self) -> Option<Topology> {
        *self.0.topology.read().unwrap()
    }

    /// Look up a managed shard by id.
    pub fn shard(&self, id: u64) -> Option<Shard> {
        self.0.shards.get(&id).map(|entry| entry.value().clone())
    }

    /// The shard id responsible for a guild, per the `(guild_id >> 22) mod
    /// total_bot_shards` formula.
    pub fn guild_shard_id(&self, guild_id: Id<GuildMarker>) -> Option<u64> {
        let topology = self.topology()?;
        Some(relay_model::id::guild_shard_id(guild_id, topology.total_bot_shards))
    }

    /// The shard managing a guild's traffic.
    pub fn guild_shard(&self, guild_id: Id<GuildMarker>) -> Result<Shard, ManagerError> {
        let shard_id = self
            .guild_shard_id(guild_id)
            .ok_or_else(|| ManagerError::new(ManagerErrorType::NoShard { guild_id: guild_id.get() }))?;

        self.shard(shard_id)
            .ok_or_else(|| ManagerError::new(ManagerErrorType::NoShard { guild_id: guild_id.get() }))
    }

    /// Resolve topology, validate it, spawn shards in concurrency-bucketed
    /// waves, and wire up their event relay.
    ///
    /// `bot_info` is the (possibly caller-prefetched) "get gateway bot"
    /// response; this manager performs no HTTP itself, treating the REST
    /// client as an external collaborator.
    pub async fn connect(&self, bot_info: GatewayBotInfo) -> Result<(), ManagerError> {
        if self.0.connected.swap(true, Ordering::AcqRel) {
            return Err(ManagerError::new(ManagerErrorType::GatewayAlreadyConnected));
        }

        let topology = match Topology::resolve(
            self.0.config.sharding,
            bot_info.shards,
            bot_info.session_start_limit.max_concurrency,
            bot_info.session_start_limit.remaining,
        ) {
            Ok(topology) => topology,
            Err(error) => {
                self.0.connected.store(false, Ordering::Release);
                return Err(error);
            }
        };

        *self.0.topology.write().unwrap() = Some(topology);

        let gateway_url = self
            .0
            .config
            .custom_gateway_socket_url
            .clone()
            .unwrap_or(bot_info.url);

        let buckets: Vec<Arc<dyn Queue>> = (0..topology.max_concurrency)
            .map(|_| -> Arc<dyn Queue> {
                if self.0.config.disable_bucket_ratelimits {
                    Arc::new(NoopQueue)
                } else {
                    Arc::new(LocalQueue::default())
                }
            })
            .collect();

        let waves = topology.waves();
        let wave_count = waves.len();

        for (wave_index, wave) in waves.into_iter().enumerate() {
            let spawns = wave.into_iter().map(|shard_id| {
                let queue = Arc::clone(&buckets[topology.bucket_id(shard_id) as usize]);
                let shard_config = self.0.config.shard_config.clone().with_gateway_url(gateway_url.clone());
                let manager = self.clone();

                async move {
                    let (shard, events) = Shard::with_queue(shard_id, topology.total_bot_shards, shard_config, queue);
                    manager.0.shards.insert(shard_id, shard.clone());
                    tokio::spawn(manager.relay(shard_id, events));
                    shard.spawn().await
                }
            });

            futures_util::future::join_all(spawns).await;

            let is_last_wave = wave_index + 1 == wave_count;
            if !is_last_wave && !self.0.config.disable_bucket_ratelimits {
                tokio::time::sleep(self.0.config.bucket_cooldown).await;
            }
        }

        Ok(())
    }

    /// Forward one shard's events onto the manager's stream, offering
    /// dispatches to the cache sink first.
    async fn relay(self, shard_id: u64, mut events: crate::shard::ShardEvents) {
        while let Some(event) = events.next().await {
            match event {
                crate::event::ShardEvent::StateUpdate { from, to } => {
                    let _ = self.0.events_tx.send(ManagerEvent::ShardStateUpdate { shard_id, from, to });
                }
                crate::event::ShardEvent::Fatal { close_code } => {
                    let _ = self.0.events_tx.send(ManagerEvent::ShardFatal { shard_id, close_code });
                }
                crate::event::ShardEvent::ReceivedPayload { kind, sequence, data } => {
                    if kind == "GUILD_MEMBERS_CHUNK" {
                        if let Ok(chunk) = serde_json::from_value(data.clone()) {
                            self.0.member_requests.handle_chunk(chunk);
                        }
                    }

                    if let Some(sink) = &self.0.dispatch_sink {
                        sink.handle_dispatch(&kind, &data);
                    }

                    let _ = self.0.events_tx.send(ManagerEvent::Dispatch {
                        shard_id,
                        kind: kind.clone(),
                        sequence,
                        data: data.clone(),
                    });

                    if let Some(listeners) = self.0.typed_listeners.get(&kind) {
                        for listener in listeners.iter() {
                            let _ = listener.send(data.clone());
                        }
                    }
                }
                crate::event::ShardEvent::SentPayload { .. } => {}
                crate::event::ShardEvent::HeartbeatAck { .. } => {}
            }
        }
    }

    /// Subscribe to a specific dispatch kind (e.g. `"MESSAGE_CREATE"`),
    /// receiving just its `d` payload. Delivered after the wildcard
    /// [`ManagerEvent::Dispatch`] for the same event.
    pub fn subscribe(&self, kind: impl Into<String>) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.0.typed_listeners.entry(kind.into()).or_default().push(tx);
        rx
    }

    /// Request a page of guild members, returning a future that resolves
    /// once every `GuildMembersChunk` has arrived.
    pub async fn request_guild_members(
        &self,
        guild_id: Id<GuildMarker>,
        nonce: Option<String>,
        query: Option<String>,
        limit: Option<u64>,
        presences: Option<bool>,
        user_ids: Option<Vec<Id<relay_model::id::UserMarker>>>,
    ) -> Result<oneshot::Receiver<MemberChunkResult>, ManagerError> {
        if query.is_some() && user_ids.is_some() {
            return Err(ManagerError::new(ManagerErrorType::MemberRequestConflict));
        }

        let nonce = match nonce {
            Some(nonce) if nonce.len() > 32 => {
                return Err(ManagerError::new(ManagerErrorType::MemberNonceTooBig { len: nonce.len() }));
            }
            Some(nonce) => nonce,
            None => self.0.request_nonce_counter.fetch_add(1, Ordering::Relaxed).to_string(),
        };

        let shard = self.guild_shard(guild_id)?;
        let receiver = self.0.member_requests.register(nonce.clone(), guild_id);

        let request = relay_model::outgoing::RequestGuildMembers {
            guild_id,
            query,
            limit,
            presences,
            user_ids,
            nonce,
        };

        let frame = relay_model::outgoing::OutgoingFrame::new(relay_model::opcode::OpCode::RequestGuildMembers, request);
        let payload = serde_json::to_string(&frame).expect("request_guild_members payload always serializes");
        let _ = shard.send(payload).await;

        Ok(receiver)
    }

    /// Update this client's presence on one shard, a subset, or every shard.
    pub async fn update_presence(
        &self,
        target: PresenceTarget,
        presence: relay_model::outgoing::UpdatePresence,
    ) -> Result<(), ManagerError> {
        let frame = relay_model::outgoing::OutgoingFrame::new(relay_model::opcode::OpCode::PresenceUpdate, presence);
        let payload = serde_json::to_string(&frame).expect("update_presence payload always serializes");

        let ids: Vec<u64> = match target {
            PresenceTarget::Shard(id) => vec![id],
            PresenceTarget::Shards(ids) => ids,
            PresenceTarget::All => self.0.shards.iter().map(|entry| *entry.key()).collect(),
        };

        for id in ids {
            if let Some(shard) = self.shard(id) {
                let _ = shard.send(payload.clone()).await;
            }
        }

        Ok(())
    }

    /// Join, move, or leave a voice channel. Always routed by guild.
    pub async fn update_voice_state(
        &self,
        voice_state: relay_model::outgoing::UpdateVoiceState,
    ) -> Result<(), ManagerError> {
        let shard = self.guild_shard(voice_state.guild_id)?;
        let frame = relay_model::outgoing::OutgoingFrame::new(
            relay_model::opcode::OpCode::VoiceStateUpdate,
            voice_state,
        );
        let payload = serde_json::to_string(&frame).expect("update_voice_state payload always serializes");
        let _ = shard.send(payload).await;
        Ok(())
    }

    /// Close every managed shard.
    pub fn shutdown(&self, code: u16, reason: impl Into<String> + Clone) {
        for entry in self.0.shards.iter() {
            entry.value().kill(code, reason.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GatewayBotInfo, ShardManager, ShardManagerConfig, SessionStartLimit};
    use crate::config::ShardConfig;

    #[tokio::test]
    async fn connect_twice_is_rejected() {
        let config = ShardManagerConfig::builder(ShardConfig::builder("token").build())
            .total_bot_shards(1)
            .build();
        let (manager, _events) = ShardManager::new(config, None);

        let bot_info = GatewayBotInfo {
            url: "wss://gateway.discord.gg".into(),
            shards: 1,
            session_start_limit: SessionStartLimit {
                remaining: 1000,
                reset_after: 0,
                max_concurrency: 1,
            },
        };

        // The first connect attempt will fail to actually open a socket in
        // this sandboxed test environment, but it must still claim the
        // "connected" flag before that failure surfaces asynchronously.
        let _ = tokio::time::timeout(std::time::Duration::from_millis(50), manager.connect(bot_info.clone())).await;

        let result = manager.connect(bot_info).await;
        assert!(matches!(
            result,
            Err(error) if matches!(error.kind(), super::ManagerErrorType::GatewayAlreadyConnected)
        ));
    }
}
