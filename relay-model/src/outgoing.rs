//! Payloads a shard sends to the gateway.

use crate::id::{ChannelMarker, GuildMarker, Id};
use crate::intents::Intents;
use crate::opcode::OpCode;
use serde::{Deserialize, Serialize};

/// Envelope wrapping an outgoing payload with its opcode, as sent on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingFrame<T> {
    pub op: OpCode,
    pub d: T,
}

impl<T: Serialize> OutgoingFrame<T> {
    pub fn new(op: OpCode, d: T) -> Self {
        Self { op, d }
    }
}

/// `Properties` sub-object of an [`Identify`] payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

impl IdentifyProperties {
    pub fn new(library_name: impl Into<String>) -> Self {
        let library_name = library_name.into();

        Self {
            os: std::env::consts::OS.to_owned(),
            browser: library_name.clone(),
            device: library_name,
        }
    }
}

/// Initial payload sent on a fresh (non-resumed) session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identify {
    pub token: String,
    pub intents: Intents,
    pub large_threshold: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<serde_json::Value>,
    pub properties: IdentifyProperties,
    pub shard: [u64; 2],
    pub compress: bool,
}

/// Sent to replay missed events onto an existing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    pub token: String,
    pub session_id: String,
    pub seq: u64,
}

/// Sent on each heartbeat tick; `d` carries the last observed sequence, or
/// null if none has been observed yet this session.
pub type Heartbeat = Option<u64>;

/// Requests one or more `GuildMembersChunk` dispatches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestGuildMembers {
    pub guild_id: Id<GuildMarker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presences: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<Id<crate::id::UserMarker>>>,
    pub nonce: String,
}

/// Updates this shard's presence for every guild it's a member of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePresence {
    pub since: Option<u64>,
    pub activities: Vec<serde_json::Value>,
    pub status: String,
    pub afk: bool,
}

/// Joins, moves, or leaves a voice channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateVoiceState {
    pub guild_id: Id<GuildMarker>,
    pub channel_id: Option<Id<ChannelMarker>>,
    pub self_mute: bool,
    pub self_deaf: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identify_round_trips() {
        let original = Identify {
            token: "t".into(),
            intents: Intents::NON_PRIVILEGED,
            large_threshold: 50,
            presence: None,
            properties: IdentifyProperties::new("relay"),
            shard: [0, 1],
            compress: false,
        };

        let json = serde_json::to_string(&original).unwrap();
        let parsed: Identify = serde_json::from_str(&json).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn resume_round_trips() {
        let original = Resume {
            token: "t".into(),
            session_id: "abc".into(),
            seq: 42,
        };

        let json = serde_json::to_string(&original).unwrap();
        let parsed: Resume = serde_json::from_str(&json).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn request_guild_members_round_trips() {
        let original = RequestGuildMembers {
            guild_id: Id::new_checked(1),
            query: Some(String::new()),
            limit: Some(0),
            presences: None,
            user_ids: None,
            nonce: "n1".into(),
        };

        let json = serde_json::to_string(&original).unwrap();
        let parsed: RequestGuildMembers = serde_json::from_str(&json).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn heartbeat_envelope_round_trips() {
        let original = OutgoingFrame::new(OpCode::Heartbeat, Some(42u64));

        let json = serde_json::to_string(&original).unwrap();
        let parsed: OutgoingFrame<Heartbeat> = serde_json::from_str(&json).unwrap();
        assert_eq!(original.op, parsed.op);
        assert_eq!(original.d, parsed.d);

        let json = serde_json::to_string(&OutgoingFrame::new(OpCode::Heartbeat, None::<u64>)).unwrap();
        let parsed: OutgoingFrame<Heartbeat> = serde_json::from_str(&json).unwrap();
        assert_eq!(None, parsed.d);
    }

    #[test]
    fn presence_update_round_trips() {
        let original = UpdatePresence {
            since: None,
            activities: vec![],
            status: "online".into(),
            afk: false,
        };

        let json = serde_json::to_string(&original).unwrap();
        let parsed: UpdatePresence = serde_json::from_str(&json).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn voice_state_round_trips() {
        let original = UpdateVoiceState {
            guild_id: Id::new_checked(1),
            channel_id: Some(Id::new_checked(2)),
            self_mute: false,
            self_deaf: true,
        };

        let json = serde_json::to_string(&original).unwrap();
        let parsed: UpdateVoiceState = serde_json::from_str(&json).unwrap();
        assert_eq!(original, parsed);
    }
}
