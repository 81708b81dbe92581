use crate::{config::Kind, entity::parse_id, InMemoryCache};
use serde_json::{Map, Value};

/// Messages themselves aren't cached; the only trace a `MessageCreate`
/// leaves is its originating channel's `last_message_id`.
pub(crate) fn handle_create(cache: &InMemoryCache, object: &Map<String, Value>) {
    let Some(fields) = cache.config.projection(Kind::Channels) else {
        return;
    };
    if !fields.contains("last_message_id") {
        return;
    }
    let Some(channel_id) = parse_id(object.get("channel_id")) else {
        return;
    };
    let Some(message_id) = object.get("id").cloned() else {
        return;
    };

    cache.channels.mutate(channel_id, |channel| {
        channel.insert("last_message_id".to_owned(), message_id);
    });
}

#[cfg(test)]
mod tests {
    use crate::{CacheConfigBuilder, InMemoryCache};
    use serde_json::json;

    #[test]
    fn create_sets_last_message_id_on_existing_channel() {
        let cache = InMemoryCache::with_config(CacheConfigBuilder::new().channels(["last_message_id"]).build());
        cache.channels.upsert(1, json!({"id": "1"}).as_object().unwrap().clone());

        super::handle_create(&cache, json!({"id": "100", "channel_id": "1"}).as_object().unwrap());

        assert_eq!(Some(&json!("100")), cache.channel(1).unwrap().get("last_message_id"));
    }

    #[test]
    fn create_is_a_no_op_for_an_uncached_channel() {
        let cache = InMemoryCache::with_config(CacheConfigBuilder::new().channels(["last_message_id"]).build());

        super::handle_create(&cache, json!({"id": "100", "channel_id": "1"}).as_object().unwrap());

        assert!(cache.channel(1).is_none());
    }
}
