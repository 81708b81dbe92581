//! Shard topology resolution and the concurrency-bucketed spawn wave layout.

use crate::manager::error::{ManagerError, ManagerErrorType};

/// A caller's request for how many shards to run, and which ones.
///
/// `total_bot_shards` is `None` for "auto" (take whatever the gateway bot
/// endpoint reports).
#[derive(Clone, Copy, Debug, Default)]
pub struct ShardingRequest {
    pub total_bot_shards: Option<u64>,
    pub shards_to_spawn: Option<u64>,
    pub offset: u64,
}

/// The resolved, validated shard topology for a connect.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Topology {
    pub total_bot_shards: u64,
    pub shards_to_spawn: u64,
    pub offset: u64,
    pub max_concurrency: u64,
}

impl Topology {
    /// Resolve and validate a topology against the gateway's reported shard
    /// count and session start limit.
    pub fn resolve(
        request: ShardingRequest,
        suggested_shards: u64,
        max_concurrency: u64,
        session_start_remaining: u64,
    ) -> Result<Self, ManagerError> {
        let total_bot_shards = request.total_bot_shards.unwrap_or(suggested_shards);
        let shards_to_spawn = request.shards_to_spawn.unwrap_or(total_bot_shards);
        let offset = request.offset;

        if total_bot_shards < shards_to_spawn {
            return Err(ManagerError::new(ManagerErrorType::InvalidShardConfig {
                reason: "total_bot_shards is smaller than shards_to_spawn",
            }));
        }

        if total_bot_shards <= offset {
            return Err(ManagerError::new(ManagerErrorType::InvalidShardConfig {
                reason: "offset is not smaller than total_bot_shards",
            }));
        }

        if total_bot_shards < shards_to_spawn + offset {
            return Err(ManagerError::new(ManagerErrorType::InvalidShardConfig {
                reason: "shards_to_spawn + offset exceeds total_bot_shards",
            }));
        }

        if shards_to_spawn > session_start_remaining {
            return Err(ManagerError::new(
                ManagerErrorType::SessionStartLimitReached {
                    remaining: session_start_remaining,
                    needed: shards_to_spawn,
                },
            ));
        }

        Ok(Self {
            total_bot_shards,
            shards_to_spawn,
            offset,
            max_concurrency: max_concurrency.max(1),
        })
    }

    /// The ids this topology actually spawns, in ascending order.
    pub fn shard_ids(&self) -> impl Iterator<Item = u64> {
        self.offset..(self.offset + self.shards_to_spawn)
    }

    /// The rate-limit bucket a shard id falls into.
    pub fn bucket_id(&self, shard_id: u64) -> u64 {
        shard_id % self.max_concurrency
    }

    /// The wave a shard id spawns in, counted against the full
    /// `0..total_bot_shards` range rather than this topology's spawn subset.
    ///
    /// Shards below `offset` are never spawned here but still occupy their
    /// wave slot, so a non-zero offset shifts later waves back rather than
    /// collapsing them into wave zero.
    pub fn wave_index(&self, shard_id: u64) -> u64 {
        shard_id / self.max_concurrency
    }

    /// Partition spawnable shard ids into waves: `waves[w]` holds every
    /// shard whose [`wave_index`](Self::wave_index) is `w`. All entries
    /// within one wave may spawn in parallel; a cooldown separates waves.
    ///
    /// Waves below the first one containing a spawnable shard are omitted,
    /// so `waves()[0]` is always non-empty.
    pub fn waves(&self) -> Vec<Vec<u64>> {
        let wave_count =
            (self.total_bot_shards + self.max_concurrency - 1) / self.max_concurrency;
        let first_wave = self.wave_index(self.offset);
        let mut waves = vec![Vec::new(); (wave_count - first_wave) as usize];

        for id in self.shard_ids() {
            waves[(self.wave_index(id) - first_wave) as usize].push(id);
        }

        waves
    }
}

#[cfg(test)]
mod tests {
    use super::{ShardingRequest, Topology};

    fn resolve(total: u64, spawn: u64, offset: u64, concurrency: u64) -> Topology {
        Topology::resolve(
            ShardingRequest {
                total_bot_shards: Some(total),
                shards_to_spawn: Some(spawn),
                offset,
            },
            total,
            concurrency,
            spawn,
        )
        .unwrap()
    }

    #[test]
    fn rejects_spawn_exceeding_total() {
        let err = Topology::resolve(
            ShardingRequest {
                total_bot_shards: Some(2),
                shards_to_spawn: Some(4),
                offset: 0,
            },
            2,
            1,
            4,
        )
        .unwrap_err();
        assert!(matches!(
            err.kind(),
            super::ManagerErrorType::InvalidShardConfig { .. }
        ));
    }

    #[test]
    fn rejects_insufficient_session_starts() {
        let err = Topology::resolve(
            ShardingRequest {
                total_bot_shards: Some(4),
                shards_to_spawn: Some(4),
                offset: 0,
            },
            4,
            1,
            2,
        )
        .unwrap_err();
        assert!(matches!(
            err.kind(),
            super::ManagerErrorType::SessionStartLimitReached { .. }
        ));
    }

    #[test]
    fn buckets_match_contract_example() {
        // total:4, shards:4, offset:0, max_concurrency:2 -> buckets {0:[0,2], 1:[1,3]}
        let topology = resolve(4, 4, 0, 2);
        let waves = topology.waves();
        assert_eq!(vec![vec![0, 1], vec![2, 3]], waves);
    }

    #[test]
    fn offset_skips_leading_ids() {
        let topology = resolve(4, 2, 2, 2);
        let ids: Vec<_> = topology.shard_ids().collect();
        assert_eq!(vec![2, 3], ids);
    }

    #[test]
    fn offset_preserves_global_wave_alignment() {
        // total:4, shards_to_spawn:2, offset:2, max_concurrency:2 -> shards
        // 0 and 1 occupy global wave 0 as unspawned placeholders, so 2 and 3
        // land in global wave 1, not wave 0.
        let topology = resolve(4, 2, 2, 2);
        assert_eq!(1, topology.wave_index(2));
        assert_eq!(1, topology.wave_index(3));
        assert_eq!(vec![vec![2, 3]], topology.waves());
    }

    #[test]
    fn max_concurrency_one_serializes_all_waves() {
        let topology = resolve(3, 3, 0, 1);
        let waves = topology.waves();
        assert_eq!(3, waves.len());
        for wave in waves {
            assert_eq!(1, wave.len());
        }
    }
}
