use crate::{
    config::Kind,
    entity::{list_prepend_unique, list_remove, parse_id},
    InMemoryCache,
};
use serde_json::{Map, Value};

const IDENTIFYING: &[&str] = &["id", "guild_id"];

pub(crate) fn handle_create(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(fields) = cache.config.projection(Kind::Channels) else {
        return;
    };
    let Some(id) = parse_id(object.get("id")) else {
        return;
    };

    cache.channels.upsert(id, crate::entity::insert_projected(object, fields, IDENTIFYING));

    let guild_id = parse_id(object.get("guild_id"));
    if let (Some(guild_id), true) = (guild_id, cache.config.wants(Kind::Guilds)) {
        cache.guilds.mutate(guild_id, |guild| {
            list_prepend_unique(guild, "channels", &id.to_string());
        });
    }
}

pub(crate) fn handle_update(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(fields) = cache.config.projection(Kind::Channels) else {
        return;
    };
    let Some(id) = parse_id(object.get("id")) else {
        return;
    };

    cache.channels.merge_or_insert(id, object, fields, IDENTIFYING);
}

pub(crate) fn handle_delete(cache: &InMemoryCache, object: &Map<String, Value>) {
    if !cache.config.wants(Kind::Channels) {
        return;
    }
    let Some(id) = parse_id(object.get("id")) else {
        return;
    };

    cache.channels.remove(id);

    let guild_id = parse_id(object.get("guild_id"));
    if let (Some(guild_id), true) = (guild_id, cache.config.wants(Kind::Guilds)) {
        cache.guilds.mutate(guild_id, |guild| {
            list_remove(guild, "channels", &id.to_string());
        });
    }
}

pub(crate) fn handle_pins_update(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(fields) = cache.config.projection(Kind::Channels) else {
        return;
    };
    let Some(id) = parse_id(object.get("channel_id")) else {
        return;
    };

    cache.channels.merge_or_insert(id, object, fields, IDENTIFYING);
}

#[cfg(test)]
mod tests {
    use crate::{CacheConfigBuilder, InMemoryCache};
    use serde_json::json;

    #[test]
    fn create_prepends_channel_to_guild_list() {
        let cache = InMemoryCache::with_config(CacheConfigBuilder::new().channels(["name"]).guilds(["name"]).build());

        cache.guilds.upsert(9, json!({"id": "9", "name": "g"}).as_object().unwrap().clone());

        super::handle_create(&cache, json!({"id": "1", "guild_id": "9", "name": "general"}).as_object().unwrap());

        let guild = cache.guild(9).unwrap();
        assert_eq!(&json!(["1"]), &guild["channels"]);
        assert!(cache.channel(1).is_some());
    }

    #[test]
    fn delete_removes_channel_from_guild_list() {
        let cache = InMemoryCache::with_config(CacheConfigBuilder::new().channels(["name"]).guilds(["name"]).build());
        cache.guilds.upsert(9, json!({"id": "9", "channels": ["1"]}).as_object().unwrap().clone());
        cache.channels.upsert(1, json!({"id": "1", "guild_id": "9"}).as_object().unwrap().clone());

        super::handle_delete(&cache, json!({"id": "1", "guild_id": "9"}).as_object().unwrap());

        assert!(cache.channel(1).is_none());
        let guild = cache.guild(9).unwrap();
        assert_eq!(&json!([]), &guild["channels"]);
    }
}
