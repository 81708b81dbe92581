use crate::{
    config::{CacheConfig, CacheConfigBuilder},
    InMemoryCache,
};

/// Builder to configure and construct an [`InMemoryCache`].
#[derive(Clone, Debug, Default)]
pub struct InMemoryCacheBuilder(CacheConfigBuilder);

impl InMemoryCacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project `Channels`, retaining the given field names.
    pub fn channels(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.0 = self.0.channels(fields);
        self
    }

    /// Project `Guilds`, retaining the given field names.
    pub fn guilds(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.0 = self.0.guilds(fields);
        self
    }

    /// Project `Members`, retaining the given field names.
    pub fn members(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.0 = self.0.members(fields);
        self
    }

    /// Project `Presences`, retaining the given field names.
    pub fn presences(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.0 = self.0.presences(fields);
        self
    }

    /// Project `Roles`, retaining the given field names.
    pub fn roles(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.0 = self.0.roles(fields);
        self
    }

    /// Project `Users`, retaining the given field names.
    pub fn users(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.0 = self.0.users(fields);
        self
    }

    /// Project `VoiceStates`, retaining the given field names.
    pub fn voice_states(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.0 = self.0.voice_states(fields);
        self
    }

    /// Consume the builder, returning a configured cache.
    pub fn build(self) -> InMemoryCache {
        InMemoryCache::with_config(self.config())
    }

    fn config(self) -> CacheConfig {
        self.0.build()
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryCacheBuilder;

    #[test]
    fn builder_projects_requested_kinds() {
        let cache = InMemoryCacheBuilder::new().guilds(["name"]).build();
        assert!(cache.config().wants(crate::config::Kind::Guilds));
        assert!(!cache.config().wants(crate::config::Kind::Users));
    }
}
