use crate::{config::Kind, entity::parse_id, event::user, InMemoryCache};
use serde_json::{Map, Value};
use std::collections::HashSet;

const IDENTIFYING: &[&str] = &["user_id", "guild_id"];

fn synthesize_ids(object: &Map<String, Value>, guild_id: u64) -> Option<(u64, Map<String, Value>)> {
    let user_id = parse_id(object.get("user").and_then(|user| user.get("id")))?;

    let mut normalized = object.clone();
    normalized.insert("user_id".to_owned(), Value::String(user_id.to_string()));
    normalized.insert("guild_id".to_owned(), Value::String(guild_id.to_string()));

    Some((user_id, normalized))
}

/// Upsert a guild member, reused by `GuildCreate`'s snapshot and by the
/// incremental member events.
pub(crate) fn upsert(cache: &InMemoryCache, fields: &HashSet<String>, guild_id: u64, object: &Map<String, Value>) {
    let Some((user_id, normalized)) = synthesize_ids(object, guild_id) else {
        return;
    };

    cache.members.merge_or_insert(guild_id, user_id, &normalized, fields, IDENTIFYING);
}

pub(crate) fn handle_add(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(guild_id) = parse_id(object.get("guild_id")) else {
        return;
    };

    if let Some(fields) = cache.config.projection(Kind::Members) {
        upsert(cache, fields, guild_id, object);
    }
    if let Some(fields) = cache.config.projection(Kind::Users) {
        if let Some(user_object) = object.get("user").and_then(Value::as_object) {
            user::upsert(cache, fields, user_object);
        }
    }
}

/// `GuildMemberUpdate` merges the same way `GuildMemberAdd` upserts: both
/// are a projected, identifying-key-preserving write into the same slot.
pub(crate) fn handle_update(cache: &InMemoryCache, object: &Map<String, Value>) {
    handle_add(cache, object);
}

pub(crate) fn handle_remove(cache: &InMemoryCache, object: &Map<String, Value>) {
    if !cache.config.wants(Kind::Members) {
        return;
    }
    let Some(guild_id) = parse_id(object.get("guild_id")) else {
        return;
    };
    let Some(user_id) = parse_id(object.get("user").and_then(|user| user.get("id"))) else {
        return;
    };

    cache.members.remove(guild_id, user_id);
}

pub(crate) fn handle_chunk(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(guild_id) = parse_id(object.get("guild_id")) else {
        return;
    };

    let member_fields = cache.config.projection(Kind::Members);
    let user_fields = cache.config.projection(Kind::Users);

    if member_fields.is_none() && user_fields.is_none() {
        return;
    }

    for raw_member in object.get("members").and_then(Value::as_array).into_iter().flatten() {
        let Some(member_object) = raw_member.as_object() else {
            continue;
        };

        if let Some(fields) = member_fields {
            upsert(cache, fields, guild_id, member_object);
        }
        if let Some(fields) = user_fields {
            if let Some(user_object) = member_object.get("user").and_then(Value::as_object) {
                user::upsert(cache, fields, user_object);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{CacheConfigBuilder, InMemoryCache};
    use serde_json::json;

    fn cache() -> InMemoryCache {
        InMemoryCache::with_config(CacheConfigBuilder::new().members(["nick"]).users(["username"]).build())
    }

    #[test]
    fn add_caches_member_and_embedded_user() {
        let cache = cache();
        super::handle_add(
            &cache,
            json!({"guild_id": "9", "nick": "bob", "user": {"id": "1", "username": "b"}}).as_object().unwrap(),
        );

        let member = cache.member(9, 1).unwrap();
        assert_eq!(Some(&json!("bob")), member.get("nick"));
        assert_eq!(Some(&json!("9")), member.get("guild_id"));
        assert!(cache.user(1).is_some());
    }

    #[test]
    fn remove_drops_the_member() {
        let cache = cache();
        super::handle_add(&cache, json!({"guild_id": "9", "user": {"id": "1"}}).as_object().unwrap());
        super::handle_remove(&cache, json!({"guild_id": "9", "user": {"id": "1"}}).as_object().unwrap());

        assert!(cache.member(9, 1).is_none());
    }

    #[test]
    fn chunk_caches_every_member() {
        let cache = cache();
        super::handle_chunk(
            &cache,
            json!({
                "guild_id": "9",
                "members": [
                    {"nick": "a", "user": {"id": "1", "username": "a"}},
                    {"nick": "b", "user": {"id": "2", "username": "b"}},
                ],
            })
            .as_object()
            .unwrap(),
        );

        assert!(cache.member(9, 1).is_some());
        assert!(cache.member(9, 2).is_some());
        assert!(cache.user(2).is_some());
    }
}
