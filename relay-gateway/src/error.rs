//! Error types that cross the shard and manager boundary.

use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// A result with a [`ShardError`] error type.
pub type Result<T, E = ShardError> = std::result::Result<T, E>;

/// Errors that can occur while operating a single [`Shard`].
///
/// [`Shard`]: crate::shard::Shard
#[derive(Debug)]
pub struct ShardError {
    pub(crate) kind: ShardErrorType,
    pub(crate) source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ShardError {
    /// The type of error that occurred.
    pub const fn kind(&self) -> &ShardErrorType {
        &self.kind
    }

    /// Consume the error, returning its type and underlying source error.
    pub fn into_parts(self) -> (ShardErrorType, Option<Box<dyn StdError + Send + Sync>>) {
        (self.kind, self.source)
    }

    pub(crate) fn new(kind: ShardErrorType) -> Self {
        Self { kind, source: None }
    }

    pub(crate) fn with_source(
        kind: ShardErrorType,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }
}

impl Display for ShardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ShardErrorType::AlreadyConnecting => {
                f.write_str("spawn() was called while a connection attempt is already in flight")
            }
            ShardErrorType::InterruptFromKill => {
                f.write_str("the shard was killed while connecting")
            }
            ShardErrorType::MaxSpawnAttemptsReached { attempts } => write!(
                f,
                "failed to connect after {attempts} attempt(s), giving up"
            ),
            ShardErrorType::SendQueueForceFlushed => {
                f.write_str("the send queue was force-flushed by kill()")
            }
            ShardErrorType::SendWithoutOpenSocket => {
                f.write_str("a payload bypassing the queue was sent with no open socket")
            }
            ShardErrorType::Fatal { close_code } => write!(
                f,
                "the gateway closed the connection with non-reconnectable code {close_code}"
            ),
        }
    }
}

impl StdError for ShardError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|source| &**source as &_)
    }
}

/// The specific reason a [`ShardError`] occurred.
#[derive(Debug)]
#[non_exhaustive]
pub enum ShardErrorType {
    /// `spawn()` was called while a prior spawn attempt is still running.
    AlreadyConnecting,
    /// `kill()` interrupted an in-flight spawn or restart attempt.
    InterruptFromKill,
    /// `spawn_max_attempts` connection attempts all failed.
    MaxSpawnAttemptsReached {
        /// Number of attempts made.
        attempts: u8,
    },
    /// `kill()` discarded queued sends that had not yet been flushed.
    SendQueueForceFlushed,
    /// A protocol-internal send (Heartbeat, Identify, Resume, ...) was
    /// attempted with no socket open to write to.
    SendWithoutOpenSocket,
    /// The gateway closed the connection with a code that forbids
    /// reconnecting; the shard is now permanently Idle.
    Fatal {
        /// The close code the gateway sent.
        close_code: u16,
    },
}
