//! Payloads received from the gateway.

use crate::id::{GuildMarker, Id, UserMarker};
use crate::opcode::OpCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw, minimally-parsed gateway frame: `{op, d, s?, t?}`.
///
/// `d` is left as a [`Value`] because its shape depends on `op` (and, for
/// `Dispatch`, on `t`); callers re-deserialize it into the concrete payload
/// type once they know which one applies.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingFrame {
    pub op: OpCode,
    #[serde(default)]
    pub d: Value,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

/// `Hello` payload, the first frame sent on every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    pub heartbeat_interval: u64,
}

/// `Ready` dispatch payload (trimmed to the fields the shard and cache need).
#[derive(Debug, Clone, Deserialize)]
pub struct Ready {
    pub session_id: String,
    #[serde(default)]
    pub resume_gateway_url: Option<String>,
    pub user: ReadyUser,
    #[serde(default)]
    pub guilds: Vec<Value>,
}

/// The self-user snapshot carried in `Ready`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadyUser {
    pub id: Id<UserMarker>,
}

/// `InvalidSession` dispatch payload: whether the session may be resumed.
pub type InvalidSession = bool;

/// A single page of a scatter/gather member request.
#[derive(Debug, Clone, Deserialize)]
pub struct GuildMembersChunk {
    pub guild_id: Id<GuildMarker>,
    #[serde(default)]
    pub members: Vec<Value>,
    pub chunk_index: u32,
    pub chunk_count: u32,
    #[serde(default)]
    pub not_found: Vec<Value>,
    #[serde(default)]
    pub presences: Vec<Value>,
    pub nonce: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hello_frame() {
        let frame: IncomingFrame =
            serde_json::from_str(r#"{"op":10,"d":{"heartbeat_interval":41250}}"#).unwrap();
        assert_eq!(OpCode::Hello, frame.op);
        let hello: Hello = serde_json::from_value(frame.d).unwrap();
        assert_eq!(41250, hello.heartbeat_interval);
    }

    #[test]
    fn parses_dispatch_envelope() {
        let frame: IncomingFrame = serde_json::from_str(
            r#"{"op":0,"t":"READY","s":1,"d":{"session_id":"abc","user":{"id":"42"}}}"#,
        )
        .unwrap();
        assert_eq!(OpCode::Dispatch, frame.op);
        assert_eq!(Some(1), frame.s);
        assert_eq!(Some("READY".to_owned()), frame.t);

        let ready: Ready = serde_json::from_value(frame.d).unwrap();
        assert_eq!("abc", ready.session_id);
        assert_eq!(42, ready.user.id.get());
    }

    #[test]
    fn parses_guild_members_chunk() {
        let chunk: GuildMembersChunk = serde_json::from_value(serde_json::json!({
            "guild_id": "1",
            "members": [],
            "chunk_index": 0,
            "chunk_count": 3,
            "nonce": "n1",
        }))
        .unwrap();
        assert_eq!(0, chunk.chunk_index);
        assert_eq!(3, chunk.chunk_count);
        assert_eq!(Some("n1".to_owned()), chunk.nonce);
    }
}
