//! Wire types shared by the relay gateway client: snowflake IDs, intents,
//! opcodes, close codes, and the payload shapes exchanged over the gateway
//! socket.
//!
//! This crate carries no transport or runtime dependency; it is pure data
//! and (de)serialization.

#![deny(unused)]

pub mod close_code;
pub mod id;
pub mod incoming;
pub mod intents;
pub mod opcode;
pub mod outgoing;

pub use close_code::CloseCode;
pub use id::Id;
pub use intents::Intents;
pub use opcode::OpCode;
