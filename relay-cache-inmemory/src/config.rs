//! Projection configuration: which entity kinds the cache materializes, and
//! which fields of each it retains.

use std::collections::HashSet;

/// An entity kind the cache can project.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Kind {
    Channels,
    Guilds,
    Members,
    Presences,
    Roles,
    Users,
    VoiceStates,
}

impl Kind {
    pub(crate) const ALL: [Kind; 7] = [
        Kind::Channels,
        Kind::Guilds,
        Kind::Members,
        Kind::Presences,
        Kind::Roles,
        Kind::Users,
        Kind::VoiceStates,
    ];
}

/// A configured field-name projection for one [`Kind`].
///
/// `None` means the kind is unprojected: no map exists for it and dispatches
/// touching it are ignored entirely. `Some(fields)` means the kind is
/// cached, retaining each entity's identifying keys plus whatever field
/// names `fields` names (an empty set still caches identifying keys alone).
pub type Projection = Option<HashSet<String>>;

/// Per-kind projection configuration for an [`InMemoryCache`](crate::InMemoryCache).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CacheConfig {
    pub(crate) channels: Projection,
    pub(crate) guilds: Projection,
    pub(crate) members: Projection,
    pub(crate) presences: Projection,
    pub(crate) roles: Projection,
    pub(crate) users: Projection,
    pub(crate) voice_states: Projection,
}

impl CacheConfig {
    /// The configured field set for a kind, or `None` if it isn't projected.
    pub fn projection(&self, kind: Kind) -> Option<&HashSet<String>> {
        match kind {
            Kind::Channels => self.channels.as_ref(),
            Kind::Guilds => self.guilds.as_ref(),
            Kind::Members => self.members.as_ref(),
            Kind::Presences => self.presences.as_ref(),
            Kind::Roles => self.roles.as_ref(),
            Kind::Users => self.users.as_ref(),
            Kind::VoiceStates => self.voice_states.as_ref(),
        }
    }

    /// Whether any field set at all is configured for `kind`.
    pub fn wants(&self, kind: Kind) -> bool {
        self.projection(kind).is_some()
    }
}

/// Builder for [`CacheConfig`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CacheConfigBuilder(CacheConfig);

impl CacheConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project `Channels`, retaining the given field names.
    pub fn channels(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.0.channels = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Project `Guilds`, retaining the given field names.
    pub fn guilds(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.0.guilds = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Project `Members`, retaining the given field names.
    pub fn members(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.0.members = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Project `Presences`, retaining the given field names.
    pub fn presences(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.0.presences = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Project `Roles`, retaining the given field names.
    pub fn roles(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.0.roles = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Project `Users`, retaining the given field names.
    pub fn users(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.0.users = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Project `VoiceStates`, retaining the given field names.
    pub fn voice_states(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.0.voice_states = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> CacheConfig {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{CacheConfig, Kind};

    #[test]
    fn unprojected_kind_has_no_field_set() {
        let config = CacheConfig::default();
        assert!(!config.wants(Kind::Guilds));
        assert!(config.projection(Kind::Guilds).is_none());
    }

    #[test]
    fn projected_kind_exposes_its_fields() {
        let config = super::CacheConfigBuilder::new().users(["username", "discriminator"]).build();
        assert!(config.wants(Kind::Users));
        let fields = config.projection(Kind::Users).unwrap();
        assert!(fields.contains("username"));
        assert!(!fields.contains("bot"));
    }
}
