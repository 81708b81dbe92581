//! Gateway intents.
//!
//! Intents are a bitfield sent in the Identify payload that tells the
//! gateway which categories of events this connection wants to receive.
//! A handful are "privileged": they require the bot to be approved for
//! them (or under 100 guilds) before Discord will honor the Identify.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Gateway intents control which events Discord dispatches to a shard.
    pub struct Intents: u64 {
        const GUILDS = 1 << 0;
        /// Privileged: member add/remove/update events.
        const GUILD_MEMBERS = 1 << 1;
        const GUILD_MODERATION = 1 << 2;
        const GUILD_EMOJIS_AND_STICKERS = 1 << 3;
        const GUILD_INTEGRATIONS = 1 << 4;
        const GUILD_WEBHOOKS = 1 << 5;
        const GUILD_INVITES = 1 << 6;
        const GUILD_VOICE_STATES = 1 << 7;
        /// Privileged: presence update events.
        const GUILD_PRESENCES = 1 << 8;
        const GUILD_MESSAGES = 1 << 9;
        const GUILD_MESSAGE_REACTIONS = 1 << 10;
        const GUILD_MESSAGE_TYPING = 1 << 11;
        const DIRECT_MESSAGES = 1 << 12;
        const DIRECT_MESSAGE_REACTIONS = 1 << 13;
        const DIRECT_MESSAGE_TYPING = 1 << 14;
        /// Privileged: message body content on MessageCreate/Update.
        const MESSAGE_CONTENT = 1 << 15;
        const GUILD_SCHEDULED_EVENTS = 1 << 16;
        const AUTO_MODERATION_CONFIGURATION = 1 << 20;
        const AUTO_MODERATION_EXECUTION = 1 << 21;

        /// Union of every intent that doesn't require privileged approval.
        const NON_PRIVILEGED = Self::GUILDS.bits()
            | Self::GUILD_MODERATION.bits()
            | Self::GUILD_EMOJIS_AND_STICKERS.bits()
            | Self::GUILD_INTEGRATIONS.bits()
            | Self::GUILD_WEBHOOKS.bits()
            | Self::GUILD_INVITES.bits()
            | Self::GUILD_VOICE_STATES.bits()
            | Self::GUILD_MESSAGES.bits()
            | Self::GUILD_MESSAGE_REACTIONS.bits()
            | Self::GUILD_MESSAGE_TYPING.bits()
            | Self::DIRECT_MESSAGES.bits()
            | Self::DIRECT_MESSAGE_REACTIONS.bits()
            | Self::DIRECT_MESSAGE_TYPING.bits()
            | Self::GUILD_SCHEDULED_EVENTS.bits()
            | Self::AUTO_MODERATION_CONFIGURATION.bits()
            | Self::AUTO_MODERATION_EXECUTION.bits();

        /// Union of the intents that require privileged approval.
        const PRIVILEGED = Self::GUILD_MEMBERS.bits()
            | Self::GUILD_PRESENCES.bits()
            | Self::MESSAGE_CONTENT.bits();

        const ALL = Self::NON_PRIVILEGED.bits() | Self::PRIVILEGED.bits();
    }
}

impl Default for Intents {
    fn default() -> Self {
        Self::NON_PRIVILEGED
    }
}

impl Intents {
    /// Whether this set contains any intent that requires privileged approval.
    pub const fn has_privileged(self) -> bool {
        self.intersects(Self::PRIVILEGED)
    }
}

impl Serialize for Intents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.bits())
    }
}

impl<'de> Deserialize<'de> for Intents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u64::deserialize(deserializer)?;
        Ok(Intents::from_bits_truncate(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::Intents;

    #[test]
    fn non_privileged_excludes_privileged() {
        assert!(!Intents::NON_PRIVILEGED.contains(Intents::GUILD_MEMBERS));
        assert!(!Intents::NON_PRIVILEGED.contains(Intents::GUILD_PRESENCES));
        assert!(!Intents::NON_PRIVILEGED.contains(Intents::MESSAGE_CONTENT));
        assert!(!Intents::NON_PRIVILEGED.has_privileged());
    }

    #[test]
    fn all_is_union_of_both() {
        assert_eq!(Intents::ALL, Intents::NON_PRIVILEGED | Intents::PRIVILEGED);
        assert!(Intents::ALL.has_privileged());
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!("1", serde_json::to_string(&Intents::GUILDS).unwrap());
    }
}
