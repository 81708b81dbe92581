//! Scatter/gather request-guild-members bookkeeping.
//!
//! A single logical request is answered by a *sequence* of
//! `GuildMembersChunk` dispatches, correlated by a nonce the manager
//! allocates. This registry tracks in-flight requests and resolves each
//! one's future once every chunk has arrived.

use dashmap::DashMap;
use relay_model::{
    id::{GuildMarker, Id},
    incoming::GuildMembersChunk,
};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::oneshot;

/// The accumulated result of a scatter/gather member request.
#[derive(Clone, Debug, Default)]
pub struct MemberChunkResult {
    pub members: Vec<Value>,
    pub presences: Vec<Value>,
    pub not_found: Vec<Value>,
}

struct PendingRequest {
    guild_id: Id<GuildMarker>,
    chunk_count: Option<u32>,
    /// Keyed by `chunk_index`; a duplicate index overwrites idempotently,
    /// taking the later chunk's contents.
    chunks: BTreeMap<u32, ChunkPage>,
    resolve: Option<oneshot::Sender<MemberChunkResult>>,
}

struct ChunkPage {
    members: Vec<Value>,
    presences: Vec<Value>,
    not_found: Vec<Value>,
}

/// Tracks every in-flight `request_guild_members` call.
#[derive(Default)]
pub(crate) struct MemberRequestRegistry {
    pending: DashMap<String, PendingRequest>,
}

impl MemberRequestRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a new request, returning the receiver its caller awaits.
    pub(crate) fn register(
        &self,
        nonce: String,
        guild_id: Id<GuildMarker>,
    ) -> oneshot::Receiver<MemberChunkResult> {
        let (resolve, receiver) = oneshot::channel();

        self.pending.insert(
            nonce,
            PendingRequest {
                guild_id,
                chunk_count: None,
                chunks: BTreeMap::new(),
                resolve: Some(resolve),
            },
        );

        receiver
    }

    /// Feed a received `GuildMembersChunk` dispatch into the matching
    /// request, if any. Chunks with no matching nonce, or whose `guild_id`
    /// doesn't match the registered request, are ignored.
    pub(crate) fn handle_chunk(&self, chunk: GuildMembersChunk) {
        let Some(nonce) = chunk.nonce.clone() else {
            return;
        };

        let Some(mut entry) = self.pending.get_mut(&nonce) else {
            return;
        };

        if entry.guild_id != chunk.guild_id {
            return;
        }

        entry.chunk_count = Some(chunk.chunk_count);
        entry.chunks.insert(
            chunk.chunk_index,
            ChunkPage {
                members: chunk.members,
                presences: chunk.presences,
                not_found: chunk.not_found,
            },
        );

        let complete = entry
            .chunk_count
            .is_some_and(|count| entry.chunks.len() as u32 == count);

        if !complete {
            return;
        }

        drop(entry);

        if let Some((_, mut request)) = self.pending.remove(&nonce) {
            let mut result = MemberChunkResult::default();

            for (_, page) in std::mem::take(&mut request.chunks) {
                result.members.extend(page.members);
                result.presences.extend(page.presences);
                result.not_found.extend(page.not_found);
            }

            if let Some(resolve) = request.resolve.take() {
                let _ = resolve.send(result);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MemberRequestRegistry;
    use relay_model::{id::Id, incoming::GuildMembersChunk};
    use serde_json::json;

    fn chunk(index: u32, count: u32, nonce: &str) -> GuildMembersChunk {
        GuildMembersChunk {
            guild_id: Id::new_checked(1),
            members: vec![json!({"user": {"id": index.to_string()}})],
            chunk_index: index,
            chunk_count: count,
            not_found: Vec::new(),
            presences: Vec::new(),
            nonce: Some(nonce.to_owned()),
        }
    }

    #[tokio::test]
    async fn resolves_after_final_chunk() {
        let registry = MemberRequestRegistry::new();
        let receiver = registry.register("n1".into(), Id::new_checked(1));

        registry.handle_chunk(chunk(0, 3, "n1"));
        registry.handle_chunk(chunk(1, 3, "n1"));
        assert!(!registry.pending.is_empty());

        registry.handle_chunk(chunk(2, 3, "n1"));

        let result = receiver.await.unwrap();
        assert_eq!(3, result.members.len());
        assert!(registry.pending.is_empty());
    }

    #[tokio::test]
    async fn duplicate_chunk_overwrites_idempotently() {
        let registry = MemberRequestRegistry::new();
        let receiver = registry.register("n1".into(), Id::new_checked(1));

        registry.handle_chunk(chunk(0, 1, "n1"));
        registry.handle_chunk(chunk(0, 1, "n1"));

        let result = receiver.await.unwrap();
        assert_eq!(1, result.members.len());
    }

    #[tokio::test]
    async fn mismatched_guild_is_ignored() {
        let registry = MemberRequestRegistry::new();
        let _receiver = registry.register("n1".into(), Id::new_checked(2));

        let mut wrong_guild = chunk(0, 1, "n1");
        wrong_guild.guild_id = Id::new_checked(1);
        registry.handle_chunk(wrong_guild);

        assert!(!registry.pending.is_empty());
    }
}
