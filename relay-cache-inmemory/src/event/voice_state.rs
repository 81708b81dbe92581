use crate::{config::Kind, entity::parse_id, InMemoryCache};
use serde_json::{Map, Value};
use std::collections::HashSet;

const IDENTIFYING: &[&str] = &["user_id", "guild_id"];

/// Upsert or delete a voice state, reused by `GuildCreate`'s snapshot and by
/// `VoiceStateUpdate`. A `null`/absent `channel_id` means the user left
/// voice entirely, so the entry is dropped rather than merged.
pub(crate) fn upsert(cache: &InMemoryCache, fields: &HashSet<String>, guild_id: u64, object: &Map<String, Value>) {
    let Some(user_id) = parse_id(object.get("user_id")) else {
        return;
    };

    if matches!(object.get("channel_id"), None | Some(Value::Null)) {
        cache.voice_states.remove(guild_id, user_id);
        return;
    }

    let mut normalized = object.clone();
    normalized.insert("guild_id".to_owned(), Value::String(guild_id.to_string()));

    cache.voice_states.merge_or_insert(guild_id, user_id, &normalized, fields, IDENTIFYING);
}

pub(crate) fn handle_update(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(fields) = cache.config.projection(Kind::VoiceStates) else {
        return;
    };
    let Some(guild_id) = parse_id(object.get("guild_id")) else {
        return;
    };

    upsert(cache, fields, guild_id, object);
}

#[cfg(test)]
mod tests {
    use crate::{CacheConfigBuilder, InMemoryCache};
    use serde_json::json;

    fn cache() -> InMemoryCache {
        InMemoryCache::with_config(CacheConfigBuilder::new().voice_states(["mute"]).build())
    }

    #[test]
    fn update_with_channel_caches_the_voice_state() {
        let cache = cache();
        super::handle_update(
            &cache,
            json!({"guild_id": "9", "user_id": "1", "channel_id": "5", "mute": false}).as_object().unwrap(),
        );

        assert!(cache.voice_state(9, 1).is_some());
    }

    #[test]
    fn update_with_null_channel_removes_the_voice_state() {
        let cache = cache();
        super::handle_update(
            &cache,
            json!({"guild_id": "9", "user_id": "1", "channel_id": "5"}).as_object().unwrap(),
        );
        super::handle_update(
            &cache,
            json!({"guild_id": "9", "user_id": "1", "channel_id": null}).as_object().unwrap(),
        );

        assert!(cache.voice_state(9, 1).is_none());
    }
}
