//! Client facade: wires the [shard manager](relay_gateway::manager::ShardManager)
//! and the [in-memory cache](relay_cache_inmemory::InMemoryCache) under one
//! configuration root. The REST client and the logging sink stay external
//! collaborators: this crate consumes a `GatewayBotInfo` however the caller
//! obtained it, and logs through `tracing` like the rest of the workspace
//! rather than exposing a callback.
//!
//! ```rust,no_run
//! use relay::ClientBuilder;
//! use relay_gateway::manager::{GatewayBotInfo, SessionStartLimit};
//! use relay_model::intents::Intents;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let (client, mut events) = ClientBuilder::new(std::env::var("RELAY_TOKEN")?)
//!     .intents(Intents::GUILDS | Intents::GUILD_MESSAGES)
//!     .cache(|cache| cache.guilds(["name", "channels"]).channels(["name"]))
//!     .build();
//!
//! client
//!     .connect(GatewayBotInfo {
//!         url: "wss://gateway.discord.gg".into(),
//!         shards: 1,
//!         session_start_limit: SessionStartLimit { remaining: 1000, reset_after: 0, max_concurrency: 1 },
//!     })
//!     .await?;
//!
//! while let Some(event) = events.next().await {
//!     tracing::debug!(?event, "dispatch relayed");
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unused_must_use)]

mod builder;

pub use builder::ClientBuilder;

pub use relay_cache_inmemory::InMemoryCache;
pub use relay_gateway::manager::{self, GatewayBotInfo, ManagerError, ManagerErrorType, PresenceTarget, SessionStartLimit};

use relay_gateway::manager::{MemberChunkResult, ShardManager};
use relay_model::id::{GuildMarker, Id, UserMarker};
use relay_model::outgoing::{UpdatePresence, UpdateVoiceState};
use std::sync::Arc;
use tokio::sync::oneshot;

/// A configured gateway client: a shard manager plus, if configured, the
/// cache fed from its dispatch stream.
pub struct Client {
    manager: ShardManager,
    cache: Option<Arc<InMemoryCache>>,
}

impl Client {
    /// Start building a client from a bot token.
    pub fn builder(token: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(token)
    }

    /// The underlying shard manager, for APIs this facade doesn't re-expose.
    pub fn manager(&self) -> &ShardManager {
        &self.manager
    }

    /// The cache fed from this client's dispatch stream, if one was
    /// configured via [`ClientBuilder::cache`].
    pub fn cache(&self) -> Option<&Arc<InMemoryCache>> {
        self.cache.as_ref()
    }

    /// Resolve topology and spawn every configured shard.
    ///
    /// `bot_info` is the "get gateway bot" response; fetching it is the
    /// caller's job, since the REST client is an external collaborator this
    /// crate never depends on.
    pub async fn connect(&self, bot_info: GatewayBotInfo) -> Result<(), ManagerError> {
        self.manager.connect(bot_info).await
    }

    /// Request a page of guild members, resolving once every
    /// `GuildMembersChunk` has arrived.
    #[allow(clippy::too_many_arguments)]
    pub async fn request_guild_members(
        &self,
        guild_id: Id<GuildMarker>,
        nonce: Option<String>,
        query: Option<String>,
        limit: Option<u64>,
        presences: Option<bool>,
        user_ids: Option<Vec<Id<UserMarker>>>,
    ) -> Result<oneshot::Receiver<MemberChunkResult>, ManagerError> {
        self.manager.request_guild_members(guild_id, nonce, query, limit, presences, user_ids).await
    }

    /// Update this client's presence on one shard, a subset, or every shard.
    pub async fn update_presence(&self, target: PresenceTarget, presence: UpdatePresence) -> Result<(), ManagerError> {
        self.manager.update_presence(target, presence).await
    }

    /// Join, move, or leave a voice channel.
    pub async fn update_voice_state(&self, voice_state: UpdateVoiceState) -> Result<(), ManagerError> {
        self.manager.update_voice_state(voice_state).await
    }

    /// Close every managed shard.
    pub fn shutdown(&self, code: u16, reason: impl Into<String> + Clone) {
        self.manager.shutdown(code, reason);
    }
}
