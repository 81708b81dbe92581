//! An in-process-memory cache that projects the gateway dispatch stream into
//! queryable entity maps.
//!
//! The cache is a pure function of the dispatches it's fed and its
//! configured projection: construct one, hand it to a shard manager as a
//! [`DispatchSink`](relay_gateway::manager::DispatchSink), and read its maps
//! from a dispatch callback or from user code running alongside it.
//!
//! ```rust,no_run
//! use relay_cache_inmemory::{CacheConfigBuilder, InMemoryCache};
//!
//! let config = CacheConfigBuilder::new()
//!     .guilds(["name", "owner_id"])
//!     .users(["username", "discriminator"])
//!     .build();
//! let cache = InMemoryCache::with_config(config);
//! ```

#![deny(unused_must_use)]

mod builder;
pub mod config;
mod entity;
mod event;
mod store;

pub use builder::InMemoryCacheBuilder;
pub use config::{CacheConfig, CacheConfigBuilder, Kind};
pub use entity::Entity;

use relay_gateway::manager::DispatchSink;
use serde_json::Value;
use store::{FlatStore, GuildScopedStore};

/// An in-process-memory, per-field-projected cache of gateway entities.
pub struct InMemoryCache {
    pub(crate) config: CacheConfig,
    pub(crate) channels: FlatStore,
    pub(crate) guilds: FlatStore,
    pub(crate) roles: FlatStore,
    pub(crate) users: FlatStore,
    pub(crate) members: GuildScopedStore,
    pub(crate) presences: GuildScopedStore,
    pub(crate) voice_states: GuildScopedStore,
}

impl InMemoryCache {
    /// An unconfigured cache: every kind disabled.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// A cache configured with the given per-kind projections.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            channels: FlatStore::new(),
            guilds: FlatStore::new(),
            roles: FlatStore::new(),
            users: FlatStore::new(),
            members: GuildScopedStore::new(),
            presences: GuildScopedStore::new(),
            voice_states: GuildScopedStore::new(),
        }
    }

    /// Start building a configured cache.
    pub fn builder() -> InMemoryCacheBuilder {
        InMemoryCacheBuilder::new()
    }

    /// The cache's active configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// A cached channel by id.
    pub fn channel(&self, id: u64) -> Option<Entity> {
        self.channels.get(id)
    }

    /// A cached guild by id.
    pub fn guild(&self, id: u64) -> Option<Entity> {
        self.guilds.get(id)
    }

    /// A cached role by id.
    pub fn role(&self, id: u64) -> Option<Entity> {
        self.roles.get(id)
    }

    /// A cached user by id.
    pub fn user(&self, id: u64) -> Option<Entity> {
        self.users.get(id)
    }

    /// A cached guild member.
    pub fn member(&self, guild_id: u64, user_id: u64) -> Option<Entity> {
        self.members.get(guild_id, user_id)
    }

    /// A cached presence.
    pub fn presence(&self, guild_id: u64, user_id: u64) -> Option<Entity> {
        self.presences.get(guild_id, user_id)
    }

    /// A cached voice state.
    pub fn voice_state(&self, guild_id: u64, user_id: u64) -> Option<Entity> {
        self.voice_states.get(guild_id, user_id)
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchSink for InMemoryCache {
    fn handle_dispatch(&self, kind: &str, data: &Value) {
        event::handle(self, kind, data);
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryCache;

    #[test]
    fn default_cache_has_no_guilds() {
        let cache = InMemoryCache::new();
        assert!(cache.guild(1).is_none());
    }
}
