use crate::{
    config::Kind,
    entity::{insert_projected, parse_id},
    event::user,
    InMemoryCache,
};
use serde_json::{Map, Value};

const GUILD_IDENTIFYING: &[&str] = &["id"];

/// `Ready` carries only unavailable-guild stubs (`{id, unavailable: true}`)
/// and the gateway's own user; full guild data arrives later via
/// `GuildCreate`.
pub(crate) fn handle(cache: &InMemoryCache, object: &Map<String, Value>) {
    if let Some(fields) = cache.config.projection(Kind::Guilds) {
        for guild in object.get("guilds").and_then(Value::as_array).into_iter().flatten() {
            let Some(id) = parse_id(guild.get("id")) else {
                continue;
            };

            let mut stub = Map::new();
            stub.insert("id".to_owned(), Value::String(id.to_string()));
            stub.insert("unavailable".to_owned(), Value::Bool(true));
            cache.guilds.upsert(id, insert_projected(&stub, fields, GUILD_IDENTIFYING));
        }
    }

    if let Some(fields) = cache.config.projection(Kind::Users) {
        if let Some(user_object) = object.get("user").and_then(Value::as_object) {
            user::upsert(cache, fields, user_object);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{CacheConfigBuilder, InMemoryCache};
    use serde_json::json;

    #[test]
    fn caches_unavailable_guild_stubs_and_self_user() {
        let cache = InMemoryCache::with_config(CacheConfigBuilder::new().guilds(["name"]).users(["username"]).build());

        super::handle(
            &cache,
            json!({
                "guilds": [{"id": "1", "unavailable": true}],
                "user": {"id": "2", "username": "relay-bot"},
            })
            .as_object()
            .unwrap(),
        );

        let guild = cache.guild(1).unwrap();
        assert_eq!(Some(&json!(true)), guild.get("unavailable"));
        assert_eq!(Some(&json!("relay-bot")), cache.user(2).unwrap().get("username"));
    }
}
