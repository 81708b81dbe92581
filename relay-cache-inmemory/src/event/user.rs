use crate::{config::Kind, entity::parse_id, InMemoryCache};
use serde_json::{Map, Value};
use std::collections::HashSet;

const IDENTIFYING: &[&str] = &["id"];

/// Upsert a user object, reused by `UserUpdate` and by every event that
/// embeds a `user` object (members, presences, `Ready`).
pub(crate) fn upsert(cache: &InMemoryCache, fields: &HashSet<String>, object: &Map<String, Value>) {
    let Some(id) = parse_id(object.get("id")) else {
        return;
    };

    cache.users.merge_or_insert(id, object, fields, IDENTIFYING);
}

pub(crate) fn handle_update(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(fields) = cache.config.projection(Kind::Users) else {
        return;
    };

    upsert(cache, fields, object);
}

#[cfg(test)]
mod tests {
    use crate::{CacheConfigBuilder, InMemoryCache};
    use serde_json::json;

    #[test]
    fn update_upserts_the_user() {
        let cache = InMemoryCache::with_config(CacheConfigBuilder::new().users(["username"]).build());

        super::handle_update(&cache, json!({"id": "1", "username": "bob"}).as_object().unwrap());

        assert_eq!(Some(&json!("bob")), cache.user(1).unwrap().get("username"));
    }

    #[test]
    fn unprojected_kind_is_ignored() {
        let cache = InMemoryCache::new();
        super::handle_update(&cache, json!({"id": "1", "username": "bob"}).as_object().unwrap());
        assert!(cache.user(1).is_none());
    }
}
