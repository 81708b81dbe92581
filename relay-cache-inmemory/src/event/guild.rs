use crate::{
    config::Kind,
    entity::{insert_projected, parse_id},
    event::{member, presence, voice_state},
    InMemoryCache,
};
use serde_json::{Map, Value};

const GUILD_IDENTIFYING: &[&str] = &["id"];
const CHANNEL_IDENTIFYING: &[&str] = &["id", "guild_id"];
const ROLE_IDENTIFYING: &[&str] = &["id", "guild_id"];

fn ids_of(array: Option<&Value>) -> Vec<Value> {
    array
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("id"))
        .cloned()
        .collect()
}

fn ids_of_members(array: Option<&Value>) -> Vec<Value> {
    array
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("user")?.get("id"))
        .cloned()
        .collect()
}

/// Reduce `channels`/`threads`/`members`/`roles` list fields (when present)
/// to id arrays, and drop `presences`/`voice_states` entirely: those live in
/// their own guild-scoped maps, never on the guild entity.
fn normalize_guild_lists(object: &Map<String, Value>) -> Map<String, Value> {
    let mut normalized = object.clone();

    if object.contains_key("channels") || object.contains_key("threads") {
        let mut channel_ids = ids_of(object.get("channels"));
        channel_ids.extend(ids_of(object.get("threads")));
        normalized.insert("channels".to_owned(), Value::Array(channel_ids));
    }
    normalized.remove("threads");

    if object.contains_key("members") {
        normalized.insert("members".to_owned(), Value::Array(ids_of_members(object.get("members"))));
    }

    if object.contains_key("roles") {
        normalized.insert("roles".to_owned(), Value::Array(ids_of(object.get("roles"))));
    }

    normalized.remove("presences");
    normalized.remove("voice_states");

    normalized
}

fn with_guild_id(object: &Value, guild_id: u64) -> Option<Map<String, Value>> {
    let mut map = object.as_object()?.clone();
    map.insert("guild_id".to_owned(), Value::String(guild_id.to_string()));
    Some(map)
}

fn cache_channel(cache: &InMemoryCache, fields: &std::collections::HashSet<String>, guild_id: u64, channel: &Value) {
    let Some(object) = with_guild_id(channel, guild_id) else {
        return;
    };
    let Some(id) = parse_id(object.get("id")) else {
        return;
    };

    cache.channels.upsert(id, insert_projected(&object, fields, CHANNEL_IDENTIFYING));
}

fn cache_role(cache: &InMemoryCache, fields: &std::collections::HashSet<String>, guild_id: u64, role: &Value) {
    let Some(object) = with_guild_id(role, guild_id) else {
        return;
    };
    let Some(id) = parse_id(object.get("id")) else {
        return;
    };

    cache.roles.upsert(id, insert_projected(&object, fields, ROLE_IDENTIFYING));
}

pub(crate) fn handle_create(cache: &InMemoryCache, object: &Map<String, Value>) {
    if !cache.config.wants(Kind::Guilds) {
        return;
    }
    let Some(guild_id) = parse_id(object.get("id")) else {
        return;
    };

    if let Some(fields) = cache.config.projection(Kind::Channels) {
        for channel in object.get("channels").and_then(Value::as_array).into_iter().flatten() {
            cache_channel(cache, fields, guild_id, channel);
        }
        for channel in object.get("threads").and_then(Value::as_array).into_iter().flatten() {
            cache_channel(cache, fields, guild_id, channel);
        }
    }

    if let Some(fields) = cache.config.projection(Kind::Roles) {
        for role in object.get("roles").and_then(Value::as_array).into_iter().flatten() {
            cache_role(cache, fields, guild_id, role);
        }
    }

    let member_fields = cache.config.projection(Kind::Members);
    let user_fields = cache.config.projection(Kind::Users);

    for raw_member in object.get("members").and_then(Value::as_array).into_iter().flatten() {
        let Some(member_object) = raw_member.as_object() else {
            continue;
        };

        if let Some(fields) = member_fields {
            member::upsert(cache, fields, guild_id, member_object);
        }
        if let Some(fields) = user_fields {
            if let Some(user_object) = member_object.get("user").and_then(Value::as_object) {
                crate::event::user::upsert(cache, fields, user_object);
            }
        }
    }

    if let Some(fields) = cache.config.projection(Kind::Presences) {
        for raw_presence in object.get("presences").and_then(Value::as_array).into_iter().flatten() {
            if let Some(presence_object) = raw_presence.as_object() {
                presence::upsert(cache, fields, guild_id, presence_object);
            }
        }
    }

    if let Some(fields) = cache.config.projection(Kind::VoiceStates) {
        for raw_voice_state in object.get("voice_states").and_then(Value::as_array).into_iter().flatten() {
            if let Some(voice_state_object) = raw_voice_state.as_object() {
                voice_state::upsert(cache, fields, guild_id, voice_state_object);
            }
        }
    }

    let fields = cache.config.projection(Kind::Guilds).unwrap();
    let normalized = normalize_guild_lists(object);
    cache.guilds.upsert(guild_id, insert_projected(&normalized, fields, GUILD_IDENTIFYING));
}

pub(crate) fn handle_update(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(fields) = cache.config.projection(Kind::Guilds) else {
        return;
    };
    let Some(guild_id) = parse_id(object.get("id")) else {
        return;
    };

    let normalized = normalize_guild_lists(object);
    cache.guilds.merge_or_insert(guild_id, &normalized, fields, GUILD_IDENTIFYING);
}

pub(crate) fn handle_delete(cache: &InMemoryCache, object: &Map<String, Value>) {
    if !cache.config.wants(Kind::Guilds) {
        return;
    }
    let Some(guild_id) = parse_id(object.get("id")) else {
        return;
    };

    let unavailable = object.get("unavailable").and_then(Value::as_bool).unwrap_or(false);

    if unavailable {
        let fields = cache.config.projection(Kind::Guilds).unwrap();
        cache.guilds.merge_or_insert(guild_id, object, fields, GUILD_IDENTIFYING);
        return;
    }

    cache.guilds.remove(guild_id);

    if cache.config.wants(Kind::Channels) {
        cache.channels.remove_where_field_eq("guild_id", &guild_id.to_string());
    }
    if cache.config.wants(Kind::Roles) {
        cache.roles.remove_where_field_eq("guild_id", &guild_id.to_string());
    }
    if cache.config.wants(Kind::Members) {
        cache.members.remove_guild(guild_id);
    }
    if cache.config.wants(Kind::Presences) {
        cache.presences.remove_guild(guild_id);
    }
    if cache.config.wants(Kind::VoiceStates) {
        cache.voice_states.remove_guild(guild_id);
    }
}

/// `GuildEmojisUpdate` / `GuildStickersUpdate`: wholesale-replace a list
/// field on the guild entity, if it's projected.
pub(crate) fn handle_list_patch(cache: &InMemoryCache, object: &Map<String, Value>, field: &str) {
    let Some(fields) = cache.config.projection(Kind::Guilds) else {
        return;
    };
    if !fields.contains(field) {
        return;
    }
    let Some(guild_id) = parse_id(object.get("guild_id")) else {
        return;
    };
    let Some(list) = object.get(field).cloned() else {
        return;
    };

    cache.guilds.mutate(guild_id, |guild| {
        guild.insert(field.to_owned(), list);
    });
}

pub(crate) fn handle_scheduled_event_upsert(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(fields) = cache.config.projection(Kind::Guilds) else {
        return;
    };
    if !fields.contains("guild_scheduled_events") {
        return;
    }
    let Some(guild_id) = parse_id(object.get("guild_id")) else {
        return;
    };
    let Some(event_id) = object.get("id").cloned() else {
        return;
    };

    cache.guilds.mutate(guild_id, |guild| {
        let array = guild.entry("guild_scheduled_events".to_owned()).or_insert_with(|| Value::Array(Vec::new()));

        if let Value::Array(items) = array {
            match items.iter_mut().find(|item| item.get("id") == Some(&event_id)) {
                Some(existing) => *existing = Value::Object(object.clone()),
                None => items.push(Value::Object(object.clone())),
            }
        }
    });
}

pub(crate) fn handle_scheduled_event_delete(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(fields) = cache.config.projection(Kind::Guilds) else {
        return;
    };
    if !fields.contains("guild_scheduled_events") {
        return;
    }
    let Some(guild_id) = parse_id(object.get("guild_id")) else {
        return;
    };
    let Some(event_id) = object.get("id").cloned() else {
        return;
    };

    cache.guilds.mutate(guild_id, |guild| {
        if let Some(Value::Array(items)) = guild.get_mut("guild_scheduled_events") {
            items.retain(|item| item.get("id") != Some(&event_id));
        }
    });
}

#[cfg(test)]
mod tests {
    use crate::{CacheConfigBuilder, InMemoryCache};
    use serde_json::json;

    fn cache() -> InMemoryCache {
        InMemoryCache::with_config(
            CacheConfigBuilder::new()
                .guilds(["name", "channels", "members", "roles"])
                .channels(["name"])
                .members(["nick"])
                .roles(["name"])
                .users(["username"])
                .build(),
        )
    }

    fn sample_guild() -> serde_json::Value {
        json!({
            "id": "1",
            "name": "g",
            "channels": [{"id": "10", "name": "general"}],
            "roles": [{"id": "20", "name": "everyone"}],
            "members": [{"nick": "bob", "user": {"id": "30", "username": "bob"}}],
        })
    }

    #[test]
    fn create_reduces_lists_and_populates_sub_stores() {
        let cache = cache();
        super::handle_create(&cache, sample_guild().as_object().unwrap());

        let guild = cache.guild(1).unwrap();
        assert_eq!(&json!(["10"]), &guild["channels"]);
        assert_eq!(&json!(["20"]), &guild["roles"]);
        assert_eq!(&json!(["30"]), &guild["members"]);
        assert!(cache.channel(10).is_some());
        assert!(cache.role(20).is_some());
        assert!(cache.member(1, 30).is_some());
        assert!(cache.user(30).is_some());
    }

    #[test]
    fn non_unavailable_delete_evicts_every_dependent_entity() {
        let cache = cache();
        super::handle_create(&cache, sample_guild().as_object().unwrap());

        super::handle_delete(&cache, json!({"id": "1", "unavailable": false}).as_object().unwrap());

        assert!(cache.guild(1).is_none());
        assert!(cache.channel(10).is_none());
        assert!(cache.role(20).is_none());
        assert!(cache.member(1, 30).is_none());
    }

    #[test]
    fn unavailable_delete_keeps_the_stub() {
        let cache = cache();
        super::handle_create(&cache, sample_guild().as_object().unwrap());

        super::handle_delete(&cache, json!({"id": "1", "unavailable": true}).as_object().unwrap());

        assert!(cache.guild(1).is_some());
        assert!(cache.channel(10).is_some());
    }
}
