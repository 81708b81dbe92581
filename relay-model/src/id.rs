//! Snowflake identifiers.
//!
//! Discord snowflakes are 64-bit unsigned integers but are transmitted as
//! JSON strings to avoid precision loss in clients with 53-bit safe integers.
//! [`Id`] is generic over a zero-sized marker type so that, say, a
//! [`GuildMarker`] id can't be handed to a function expecting a
//! [`ChannelMarker`] id.

use serde::{
    de::{Deserialize, Deserializer, Error as DeError, Visitor},
    ser::{Serialize, Serializer},
};
use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::{Hash, Hasher},
    marker::PhantomData,
    num::NonZeroU64,
    str::FromStr,
};

/// Marker for [`Id`]s belonging to guilds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GuildMarker;

/// Marker for [`Id`]s belonging to channels (and threads).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChannelMarker;

/// Marker for [`Id`]s belonging to users.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UserMarker;

/// Marker for [`Id`]s belonging to roles.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoleMarker;

/// Marker for [`Id`]s belonging to messages.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MessageMarker;

/// Marker for [`Id`]s belonging to stage instances.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StageMarker;

/// Marker for [`Id`]s belonging to guild scheduled events.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScheduledEventMarker;

/// Marker for [`Id`]s belonging to applications.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ApplicationMarker;

/// A Discord snowflake, typed by what kind of resource it identifies.
#[derive(Clone, Copy)]
pub struct Id<T> {
    value: NonZeroU64,
    phantom: PhantomData<T>,
}

impl<T> Id<T> {
    /// Create an ID from a raw, non-zero value.
    pub const fn new(value: NonZeroU64) -> Self {
        Self {
            value,
            phantom: PhantomData,
        }
    }

    /// Create an ID from a raw `u64`, checking that it's non-zero.
    ///
    /// # Panics
    ///
    /// Panics if `value` is zero. Snowflakes are never zero in practice;
    /// this only exists for call sites that already hold a validated value.
    pub const fn new_checked(value: u64) -> Self {
        match NonZeroU64::new(value) {
            Some(value) => Self::new(value),
            None => panic!("id value must be non-zero"),
        }
    }

    /// Return the underlying integer value.
    pub const fn get(self) -> u64 {
        self.value.get()
    }
}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Id").field("value", &self.value).finish()
    }
}

impl<T> Display for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.value, f)
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> FromStr for Id<T> {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<NonZeroU64>().map(Self::new)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.value)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor<T>(PhantomData<T>);

        impl<'de, T> Visitor<'de> for IdVisitor<T> {
            type Value = Id<T>;

            fn expecting(&self, f: &mut Formatter<'_>) -> FmtResult {
                f.write_str("a snowflake, as a string or integer")
            }

            fn visit_str<E: DeError>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map(Id::new).map_err(DeError::custom)
            }

            fn visit_u64<E: DeError>(self, v: u64) -> Result<Self::Value, E> {
                NonZeroU64::new(v)
                    .map(Id::new)
                    .ok_or_else(|| DeError::custom("snowflake must be non-zero"))
            }
        }

        deserializer.deserialize_any(IdVisitor(PhantomData))
    }
}

/// The shard that is responsible for a guild's traffic.
///
/// `shard_id = (guild_id >> 22) mod total_shards`, per Discord's sharding
/// formula.
pub fn guild_shard_id(guild_id: Id<GuildMarker>, total_shards: u64) -> u64 {
    (guild_id.get() >> 22) % total_shards
}

#[cfg(test)]
mod tests {
    use super::{guild_shard_id, GuildMarker, Id};

    #[test]
    fn roundtrip_json_string() {
        let id: Id<GuildMarker> = serde_json::from_str("\"123456789\"").unwrap();
        assert_eq!(123_456_789, id.get());
        assert_eq!("\"123456789\"", serde_json::to_string(&id).unwrap());
    }

    #[test]
    fn single_shard_always_zero() {
        let id = Id::<GuildMarker>::new_checked(1 << 40);
        assert_eq!(0, guild_shard_id(id, 1));
    }

    #[test]
    fn routes_by_high_bits() {
        // guild id encodes shard 3 of 4 in bits 22+
        let id = Id::<GuildMarker>::new_checked(3 << 22);
        assert_eq!(3, guild_shard_id(id, 4));
    }
}
