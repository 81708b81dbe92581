//! Gateway opcodes.
//!
//! See <https://discord.com/developers/docs/topics/opcodes-and-status-codes#gateway-opcodes>.

use serde_repr::{Deserialize_repr, Serialize_repr};

/// Operation code of a gateway frame's `op` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum OpCode {
    /// An event was dispatched. Receive only.
    Dispatch = 0,
    /// Keep the connection alive. Bidirectional.
    Heartbeat = 1,
    /// Start a new session. Send only.
    Identify = 2,
    /// Update the client's presence. Send only.
    PresenceUpdate = 3,
    /// Join, leave, or move between voice channels. Send only.
    VoiceStateUpdate = 4,
    /// Resume a previous session. Send only.
    Resume = 6,
    /// The server requests a reconnect. Receive only.
    Reconnect = 7,
    /// Request a chunk of a guild's members. Send only.
    RequestGuildMembers = 8,
    /// The session has been invalidated. Receive only.
    InvalidSession = 9,
    /// Sent immediately after connecting. Receive only.
    Hello = 10,
    /// Acknowledges a received heartbeat. Receive only.
    HeartbeatAck = 11,
}

#[cfg(test)]
mod tests {
    use super::OpCode;

    #[test]
    fn round_trips_through_json() {
        let json = serde_json::to_string(&OpCode::Hello).unwrap();
        assert_eq!("10", json);
        assert_eq!(OpCode::Hello, serde_json::from_str(&json).unwrap());
    }
}
