//! Gateway close codes and the reconnect policy they imply.
//!
//! See <https://discord.com/developers/docs/topics/opcodes-and-status-codes#gateway-close-event-codes>.

/// A close code received on the gateway socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseCode(pub u16);

impl CloseCode {
    pub const UNKNOWN_ERROR: Self = Self(4000);
    pub const UNKNOWN_OPCODE: Self = Self(4001);
    pub const DECODE_ERROR: Self = Self(4002);
    pub const NOT_AUTHENTICATED: Self = Self(4003);
    pub const AUTHENTICATION_FAILED: Self = Self(4004);
    pub const ALREADY_AUTHENTICATED: Self = Self(4005);
    pub const INVALID_SEQ: Self = Self(4007);
    pub const RATE_LIMITED: Self = Self(4008);
    pub const SESSION_TIMED_OUT: Self = Self(4009);
    pub const INVALID_SHARD: Self = Self(4010);
    pub const SHARDING_REQUIRED: Self = Self(4011);
    pub const INVALID_API_VERSION: Self = Self(4012);
    pub const INVALID_INTENTS: Self = Self(4013);
    pub const DISALLOWED_INTENTS: Self = Self(4014);

    /// Codes Discord will never let a shard recover a session over by
    /// reconnecting. A fatal error must be surfaced to the caller instead.
    const NON_RECONNECTABLE: [Self; 6] = [
        Self::AUTHENTICATION_FAILED,
        Self::INVALID_SHARD,
        Self::SHARDING_REQUIRED,
        Self::INVALID_API_VERSION,
        Self::INVALID_INTENTS,
        Self::DISALLOWED_INTENTS,
    ];

    /// Whether a shard may attempt to reconnect after receiving this code.
    ///
    /// Any code not in the fixed non-reconnectable set is assumed
    /// reconnectable, including codes outside the 4000-4014 range (ordinary
    /// TCP/TLS closes, proxy resets, and the like).
    pub const fn is_reconnectable(self) -> bool {
        let mut i = 0;

        while i < Self::NON_RECONNECTABLE.len() {
            if self.0 == Self::NON_RECONNECTABLE[i].0 {
                return false;
            }

            i += 1;
        }

        true
    }
}

impl From<u16> for CloseCode {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::CloseCode;

    #[test]
    fn authentication_failed_is_fatal() {
        assert!(!CloseCode::AUTHENTICATION_FAILED.is_reconnectable());
        assert!(!CloseCode::INVALID_SHARD.is_reconnectable());
        assert!(!CloseCode::SHARDING_REQUIRED.is_reconnectable());
        assert!(!CloseCode::INVALID_API_VERSION.is_reconnectable());
        assert!(!CloseCode::INVALID_INTENTS.is_reconnectable());
        assert!(!CloseCode::DISALLOWED_INTENTS.is_reconnectable());
    }

    #[test]
    fn session_timeout_is_reconnectable() {
        assert!(CloseCode::SESSION_TIMED_OUT.is_reconnectable());
        assert!(CloseCode::from(1000).is_reconnectable());
        assert!(CloseCode::from(1006).is_reconnectable());
    }

    #[test]
    fn decode_error_and_already_authenticated_are_reconnectable() {
        assert!(CloseCode::DECODE_ERROR.is_reconnectable());
        assert!(CloseCode::ALREADY_AUTHENTICATED.is_reconnectable());
    }
}
