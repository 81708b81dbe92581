use crate::Client;
use relay_cache_inmemory::{CacheConfigBuilder, InMemoryCache};
use relay_gateway::{
    config::ShardConfigBuilder,
    manager::{ManagerEvents, ShardManager, ShardManagerConfigBuilder},
    ShardConfig,
};
use relay_model::intents::Intents;
use serde_json::Value;
use std::{sync::Arc, time::Duration};

/// Builds a [`Client`] from one configuration root, covering the shard,
/// manager, and cache option groups.
///
/// The underlying builders can't be composed directly:
/// [`ShardManagerConfigBuilder`] is seeded from a finished [`ShardConfig`],
/// so shard-level options are held here and only handed down at [`build`](Self::build).
pub struct ClientBuilder {
    shard: ShardConfigBuilder,
    total_bot_shards: Option<u64>,
    shards_to_spawn: Option<u64>,
    offset: Option<u64>,
    disable_bucket_ratelimits: bool,
    custom_gateway_socket_url: Option<String>,
    cache: Option<CacheConfigBuilder>,
}

impl ClientBuilder {
    /// Start building a client from a bot token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            shard: ShardConfig::builder(token),
            total_bot_shards: None,
            shards_to_spawn: None,
            offset: None,
            disable_bucket_ratelimits: false,
            custom_gateway_socket_url: None,
            cache: None,
        }
    }

    pub fn intents(mut self, intents: Intents) -> Self {
        self.shard = self.shard.intents(intents);
        self
    }

    pub fn large_threshold(mut self, value: u64) -> Self {
        self.shard = self.shard.large_threshold(value);
        self
    }

    pub fn presence(mut self, presence: Value) -> Self {
        self.shard = self.shard.presence(presence);
        self
    }

    pub fn spawn_attempt_delay(mut self, value: Duration) -> Self {
        self.shard = self.shard.spawn_attempt_delay(value);
        self
    }

    pub fn spawn_max_attempts(mut self, value: u8) -> Self {
        self.shard = self.shard.spawn_max_attempts(value);
        self
    }

    pub fn spawn_timeout(mut self, value: Duration) -> Self {
        self.shard = self.shard.spawn_timeout(value);
        self
    }

    pub fn total_bot_shards(mut self, value: u64) -> Self {
        self.total_bot_shards = Some(value);
        self
    }

    pub fn shards_to_spawn(mut self, value: u64) -> Self {
        self.shards_to_spawn = Some(value);
        self
    }

    pub fn offset(mut self, value: u64) -> Self {
        self.offset = Some(value);
        self
    }

    pub fn disable_bucket_ratelimits(mut self, value: bool) -> Self {
        self.disable_bucket_ratelimits = value;
        self
    }

    pub fn custom_gateway_socket_url(mut self, url: impl Into<String>) -> Self {
        self.custom_gateway_socket_url = Some(url.into());
        self
    }

    /// Configure the cache's per-kind projections. Omitting this call leaves
    /// every kind unprojected (disabled), the default.
    pub fn cache(mut self, configure: impl FnOnce(CacheConfigBuilder) -> CacheConfigBuilder) -> Self {
        self.cache = Some(configure(CacheConfigBuilder::new()));
        self
    }

    /// Finish building: returns the client plus its wildcard dispatch
    /// stream, matching `ShardManager::new`'s return shape.
    pub fn build(self) -> (Client, ManagerEvents) {
        let shard_config = self.shard.build();
        let mut manager = ShardManagerConfigBuilder::new(shard_config);

        if let Some(value) = self.total_bot_shards {
            manager = manager.total_bot_shards(value);
        }
        if let Some(value) = self.shards_to_spawn {
            manager = manager.shards_to_spawn(value);
        }
        if let Some(value) = self.offset {
            manager = manager.offset(value);
        }
        manager = manager.disable_bucket_ratelimits(self.disable_bucket_ratelimits);
        if let Some(url) = self.custom_gateway_socket_url {
            manager = manager.custom_gateway_socket_url(url);
        }

        let cache = self.cache.map(|builder| Arc::new(InMemoryCache::with_config(builder.build())));
        let sink = cache.clone().map(|cache| cache as Arc<dyn relay_gateway::manager::event::DispatchSink>);

        let (shard_manager, events) = ShardManager::new(manager.build(), sink);

        (Client { manager: shard_manager, cache }, events)
    }
}

#[cfg(test)]
mod tests {
    use super::ClientBuilder;
    use relay_model::intents::Intents;

    #[test]
    fn build_wires_shard_and_manager_config() {
        let (client, _events) = ClientBuilder::new("token").intents(Intents::GUILDS).total_bot_shards(2).build();
        assert!(client.cache().is_none());
    }

    #[test]
    fn cache_option_enables_the_sink() {
        let (client, _events) = ClientBuilder::new("token").cache(|cache| cache.guilds(["name"])).build();
        assert!(client.cache().is_some());
    }
}
