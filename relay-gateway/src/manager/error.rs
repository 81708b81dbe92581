//! Errors surfaced by the [`ShardManager`](super::ShardManager).

use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// A result with a [`ManagerError`] error type.
pub type Result<T, E = ManagerError> = std::result::Result<T, E>;

/// Errors that can occur while operating a [`ShardManager`](super::ShardManager).
#[derive(Debug)]
pub struct ManagerError {
    pub(crate) kind: ManagerErrorType,
    pub(crate) source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ManagerError {
    /// The type of error that occurred.
    pub const fn kind(&self) -> &ManagerErrorType {
        &self.kind
    }

    /// Consume the error, returning its type and underlying source error.
    pub fn into_parts(self) -> (ManagerErrorType, Option<Box<dyn StdError + Send + Sync>>) {
        (self.kind, self.source)
    }

    pub(crate) fn new(kind: ManagerErrorType) -> Self {
        Self { kind, source: None }
    }

    pub(crate) fn with_source(
        kind: ManagerErrorType,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }
}

impl Display for ManagerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ManagerErrorType::GatewayAlreadyConnected => {
                f.write_str("connect() was called while shards are already running")
            }
            ManagerErrorType::InvalidShardConfig { reason } => {
                write!(f, "invalid shard topology: {reason}")
            }
            ManagerErrorType::InvalidRestResponse => {
                f.write_str("the gateway bot endpoint returned a response that couldn't be parsed")
            }
            ManagerErrorType::SessionStartLimitReached { remaining, needed } => write!(
                f,
                "{needed} shard(s) requested, but only {remaining} session start(s) remain"
            ),
            ManagerErrorType::NoShard { guild_id } => {
                write!(f, "guild {guild_id} is not owned by any shard managed here")
            }
            ManagerErrorType::MemberNonceTooBig { len } => write!(
                f,
                "request nonce is {len} bytes, exceeding the wire protocol's 32-byte limit"
            ),
            ManagerErrorType::MemberRequestConflict => {
                f.write_str("a member request may specify `query` or `user_ids`, not both")
            }
        }
    }
}

impl StdError for ManagerError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|source| &**source as &_)
    }
}

/// The specific reason a [`ManagerError`] occurred.
#[derive(Debug)]
#[non_exhaustive]
pub enum ManagerErrorType {
    /// `connect()` was called while shards are already `Running`.
    GatewayAlreadyConnected,
    /// The resolved shard topology fails one of its validity checks.
    InvalidShardConfig {
        /// Human-readable explanation of which check failed.
        reason: &'static str,
    },
    /// The gateway bot discovery response could not be parsed.
    InvalidRestResponse,
    /// Spawning would exceed the remaining session start limit.
    SessionStartLimitReached {
        /// Sessions remaining in the current window.
        remaining: u64,
        /// Sessions this topology would need to start.
        needed: u64,
    },
    /// A guild-routed command targets a guild whose shard isn't managed here.
    NoShard {
        /// The guild id that couldn't be routed.
        guild_id: u64,
    },
    /// A caller-supplied scatter/gather nonce exceeds the 32-byte wire limit.
    MemberNonceTooBig {
        /// The oversized nonce's byte length.
        len: usize,
    },
    /// A member request specified both `query` and `user_ids`.
    MemberRequestConflict,
}
