use crate::{
    config::Kind,
    entity::{insert_projected, list_prepend_unique, list_remove, parse_id},
    InMemoryCache,
};
use serde_json::{Map, Value};

const IDENTIFYING: &[&str] = &["id", "guild_id"];

pub(crate) fn handle_create(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(fields) = cache.config.projection(Kind::Roles) else {
        return;
    };
    let Some(guild_id) = parse_id(object.get("guild_id")) else {
        return;
    };
    let Some(role) = object.get("role").and_then(Value::as_object) else {
        return;
    };
    let Some(role_id) = parse_id(role.get("id")) else {
        return;
    };

    let mut normalized = role.clone();
    normalized.insert("guild_id".to_owned(), Value::String(guild_id.to_string()));
    cache.roles.upsert(role_id, insert_projected(&normalized, fields, IDENTIFYING));

    if cache.config.wants(Kind::Guilds) {
        cache.guilds.mutate(guild_id, |guild| {
            list_prepend_unique(guild, "roles", &role_id.to_string());
        });
    }
}

pub(crate) fn handle_update(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(fields) = cache.config.projection(Kind::Roles) else {
        return;
    };
    let Some(guild_id) = parse_id(object.get("guild_id")) else {
        return;
    };
    let Some(role) = object.get("role").and_then(Value::as_object) else {
        return;
    };
    let Some(role_id) = parse_id(role.get("id")) else {
        return;
    };

    let mut normalized = role.clone();
    normalized.insert("guild_id".to_owned(), Value::String(guild_id.to_string()));
    cache.roles.merge_or_insert(role_id, &normalized, fields, IDENTIFYING);
}

pub(crate) fn handle_delete(cache: &InMemoryCache, object: &Map<String, Value>) {
    if !cache.config.wants(Kind::Roles) {
        return;
    }
    let Some(guild_id) = parse_id(object.get("guild_id")) else {
        return;
    };
    let Some(role_id) = parse_id(object.get("role_id")) else {
        return;
    };

    cache.roles.remove(role_id);

    if cache.config.wants(Kind::Guilds) {
        cache.guilds.mutate(guild_id, |guild| {
            list_remove(guild, "roles", &role_id.to_string());
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::{CacheConfigBuilder, InMemoryCache};
    use serde_json::json;

    fn cache() -> InMemoryCache {
        InMemoryCache::with_config(CacheConfigBuilder::new().roles(["name"]).guilds(["name"]).build())
    }

    #[test]
    fn create_prepends_role_to_guild_list() {
        let cache = cache();
        cache.guilds.upsert(9, json!({"id": "9"}).as_object().unwrap().clone());

        super::handle_create(&cache, json!({"guild_id": "9", "role": {"id": "1", "name": "mod"}}).as_object().unwrap());

        assert_eq!(Some(&json!("mod")), cache.role(1).unwrap().get("name"));
        assert_eq!(&json!(["1"]), &cache.guild(9).unwrap()["roles"]);
    }

    #[test]
    fn delete_removes_role_from_guild_list() {
        let cache = cache();
        cache.guilds.upsert(9, json!({"id": "9", "roles": ["1"]}).as_object().unwrap().clone());
        cache.roles.upsert(1, json!({"id": "1", "guild_id": "9"}).as_object().unwrap().clone());

        super::handle_delete(&cache, json!({"guild_id": "9", "role_id": "1"}).as_object().unwrap());

        assert!(cache.role(1).is_none());
        assert_eq!(&json!([]), &cache.guild(9).unwrap()["roles"]);
    }
}
