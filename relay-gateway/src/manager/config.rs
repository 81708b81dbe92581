//! [`ShardManager`](super::ShardManager) configuration.

use crate::{config::ShardConfig, manager::topology::ShardingRequest};
use std::time::Duration;

/// Configuration for a [`ShardManager`](super::ShardManager).
#[derive(Clone, Debug)]
pub struct ShardManagerConfig {
    pub(crate) shard_config: ShardConfig,
    pub(crate) sharding: ShardingRequest,
    pub(crate) disable_bucket_ratelimits: bool,
    pub(crate) bucket_cooldown: Duration,
    pub(crate) custom_gateway_socket_url: Option<String>,
}

impl ShardManagerConfig {
    /// Start building a configuration from the shared per-shard config.
    pub fn builder(shard_config: ShardConfig) -> ShardManagerConfigBuilder {
        ShardManagerConfigBuilder::new(shard_config)
    }
}

/// Builder for [`ShardManagerConfig`].
#[derive(Clone, Debug)]
pub struct ShardManagerConfigBuilder(ShardManagerConfig);

impl ShardManagerConfigBuilder {
    pub fn new(shard_config: ShardConfig) -> Self {
        Self(ShardManagerConfig {
            shard_config,
            sharding: ShardingRequest::default(),
            disable_bucket_ratelimits: false,
            bucket_cooldown: Duration::from_millis(5000),
            custom_gateway_socket_url: None,
        })
    }

    pub fn total_bot_shards(mut self, value: u64) -> Self {
        self.0.sharding.total_bot_shards = Some(value);
        self
    }

    pub fn shards_to_spawn(mut self, value: u64) -> Self {
        self.0.sharding.shards_to_spawn = Some(value);
        self
    }

    pub fn offset(mut self, value: u64) -> Self {
        self.0.sharding.offset = value;
        self
    }

    pub fn disable_bucket_ratelimits(mut self, value: bool) -> Self {
        self.0.disable_bucket_ratelimits = value;
        self
    }

    pub fn custom_gateway_socket_url(mut self, url: impl Into<String>) -> Self {
        self.0.custom_gateway_socket_url = Some(url.into());
        self
    }

    pub fn build(self) -> ShardManagerConfig {
        self.0
    }
}
