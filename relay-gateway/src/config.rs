//! Per-shard configuration.

use relay_model::intents::Intents;
use serde_json::Value;
use std::{sync::Arc, time::Duration};

/// Configuration shared by every shard a [`ShardManager`] spawns, plus the
/// parameters specific to one shard's identity.
///
/// [`ShardManager`]: crate::manager::ShardManager
#[derive(Clone, Debug)]
pub struct ShardConfig {
    pub(crate) token: Arc<str>,
    pub(crate) intents: Intents,
    pub(crate) large_threshold: u64,
    pub(crate) presence: Option<Value>,
    pub(crate) spawn_attempt_delay: Duration,
    pub(crate) spawn_max_attempts: u8,
    pub(crate) spawn_timeout: Duration,
    pub(crate) version: u8,
    pub(crate) gateway_url: Arc<str>,
}

impl ShardConfig {
    /// Start building a configuration from a bot token.
    pub fn builder(token: impl Into<String>) -> ShardConfigBuilder {
        ShardConfigBuilder::new(token)
    }

    pub fn intents(&self) -> Intents {
        self.intents
    }

    pub fn large_threshold(&self) -> u64 {
        self.large_threshold
    }

    pub fn spawn_attempt_delay(&self) -> Duration {
        self.spawn_attempt_delay
    }

    pub fn spawn_max_attempts(&self) -> u8 {
        self.spawn_max_attempts
    }

    pub fn spawn_timeout(&self) -> Duration {
        self.spawn_timeout
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// Override the gateway socket URL used for fresh connects. Used by the
    /// manager to apply `custom_gateway_socket_url`, or resume-url overrides.
    pub(crate) fn with_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = Arc::from(url.into());
        self
    }
}

/// Builder for [`ShardConfig`].
///
/// Defaults: `large_threshold = 50`, `spawn_attempt_delay = 2500ms`,
/// `spawn_max_attempts = 10`, `spawn_timeout = 30000ms`, `version = 10`,
/// `intents = NON_PRIVILEGED`.
#[derive(Clone, Debug)]
pub struct ShardConfigBuilder(ShardConfig);

impl ShardConfigBuilder {
    pub fn new(token: impl Into<String>) -> Self {
        Self(ShardConfig {
            token: Arc::from(token.into()),
            intents: Intents::default(),
            large_threshold: 50,
            presence: None,
            spawn_attempt_delay: Duration::from_millis(2500),
            spawn_max_attempts: 10,
            spawn_timeout: Duration::from_millis(30_000),
            version: 10,
            gateway_url: Arc::from("wss://gateway.discord.gg"),
        })
    }

    pub fn intents(mut self, intents: Intents) -> Self {
        self.0.intents = intents;
        self
    }

    pub fn large_threshold(mut self, value: u64) -> Self {
        self.0.large_threshold = value;
        self
    }

    pub fn presence(mut self, presence: Value) -> Self {
        self.0.presence = Some(presence);
        self
    }

    pub fn spawn_attempt_delay(mut self, value: Duration) -> Self {
        self.0.spawn_attempt_delay = value;
        self
    }

    pub fn spawn_max_attempts(mut self, value: u8) -> Self {
        self.0.spawn_max_attempts = value;
        self
    }

    pub fn spawn_timeout(mut self, value: Duration) -> Self {
        self.0.spawn_timeout = value;
        self
    }

    pub fn version(mut self, value: u8) -> Self {
        self.0.version = value;
        self
    }

    pub fn gateway_url(mut self, url: impl Into<String>) -> Self {
        self.0.gateway_url = Arc::from(url.into());
        self
    }

    pub fn build(self) -> ShardConfig {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::ShardConfig;

    #[test]
    fn defaults_match_contract() {
        let config = ShardConfig::builder("token").build();
        assert_eq!(50, config.large_threshold());
        assert_eq!(10, config.spawn_max_attempts());
        assert_eq!(std::time::Duration::from_millis(2500), config.spawn_attempt_delay());
        assert_eq!(std::time::Duration::from_millis(30_000), config.spawn_timeout());
        assert_eq!(10, config.version());
    }
}
