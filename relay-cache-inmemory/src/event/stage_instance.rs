use crate::{config::Kind, entity::parse_id, InMemoryCache};
use serde_json::{Map, Value};

fn find_mut<'a>(items: &'a mut Vec<Value>, id: &Value) -> Option<&'a mut Value> {
    items.iter_mut().find(|item| item.get("id") == Some(id))
}

pub(crate) fn handle_upsert(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(fields) = cache.config.projection(Kind::Guilds) else {
        return;
    };
    if !fields.contains("stage_instances") {
        return;
    }
    let Some(guild_id) = parse_id(object.get("guild_id")) else {
        return;
    };
    let Some(id) = object.get("id").cloned() else {
        return;
    };

    cache.guilds.mutate(guild_id, |guild| {
        let array = guild.entry("stage_instances".to_owned()).or_insert_with(|| Value::Array(Vec::new()));

        if let Value::Array(items) = array {
            match find_mut(items, &id) {
                Some(existing) => *existing = Value::Object(object.clone()),
                None => items.push(Value::Object(object.clone())),
            }
        }
    });
}

pub(crate) fn handle_delete(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(fields) = cache.config.projection(Kind::Guilds) else {
        return;
    };
    if !fields.contains("stage_instances") {
        return;
    }
    let Some(guild_id) = parse_id(object.get("guild_id")) else {
        return;
    };
    let Some(id) = object.get("id").cloned() else {
        return;
    };

    cache.guilds.mutate(guild_id, |guild| {
        if let Some(Value::Array(items)) = guild.get_mut("stage_instances") {
            items.retain(|item| item.get("id") != Some(&id));
        }
    });
}

#[cfg(test)]
mod tests {
    use crate::{CacheConfigBuilder, InMemoryCache};
    use serde_json::json;

    fn cache() -> InMemoryCache {
        let cache = InMemoryCache::with_config(CacheConfigBuilder::new().guilds(["stage_instances"]).build());
        cache.guilds.upsert(9, json!({"id": "9"}).as_object().unwrap().clone());
        cache
    }

    #[test]
    fn upsert_then_upsert_replaces_by_id() {
        let cache = cache();
        super::handle_upsert(&cache, json!({"id": "1", "guild_id": "9", "topic": "a"}).as_object().unwrap());
        super::handle_upsert(&cache, json!({"id": "1", "guild_id": "9", "topic": "b"}).as_object().unwrap());

        let guild = cache.guild(9).unwrap();
        let list = guild["stage_instances"].as_array().unwrap();
        assert_eq!(1, list.len());
        assert_eq!(Some(&json!("b")), list[0].get("topic"));
    }

    #[test]
    fn delete_removes_by_id() {
        let cache = cache();
        super::handle_upsert(&cache, json!({"id": "1", "guild_id": "9"}).as_object().unwrap());
        super::handle_delete(&cache, json!({"id": "1", "guild_id": "9"}).as_object().unwrap());

        let guild = cache.guild(9).unwrap();
        assert!(guild["stage_instances"].as_array().unwrap().is_empty());
    }
}
