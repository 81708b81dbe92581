use crate::{config::Kind, entity::parse_id, InMemoryCache};
use serde_json::{Map, Value};
use std::collections::HashSet;

const IDENTIFYING: &[&str] = &["user_id", "guild_id"];

/// Upsert a presence, reused by `GuildCreate`'s snapshot and by
/// `PresenceUpdate`.
pub(crate) fn upsert(cache: &InMemoryCache, fields: &HashSet<String>, guild_id: u64, object: &Map<String, Value>) {
    let Some(user_id) = parse_id(object.get("user").and_then(|user| user.get("id"))) else {
        return;
    };

    let mut normalized = object.clone();
    normalized.insert("user_id".to_owned(), Value::String(user_id.to_string()));
    normalized.insert("guild_id".to_owned(), Value::String(guild_id.to_string()));

    cache.presences.merge_or_insert(guild_id, user_id, &normalized, fields, IDENTIFYING);
}

pub(crate) fn handle_update(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(fields) = cache.config.projection(Kind::Presences) else {
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

    #[test]
    fn update_upserts_by_guild_and_user() {
        let cache = InMemoryCache::with_config(CacheConfigBuilder::new().presences(["status"]).build());

        super::handle_update(
            &cache,
            json!({"guild_id": "9", "status": "online", "user": {"id": "1"}}).as_object().unwrap(),
        );

        let presence = cache.presence(9, 1).unwrap();
        assert_eq!(Some(&json!("online")), presence.get("status"));
    }
}
