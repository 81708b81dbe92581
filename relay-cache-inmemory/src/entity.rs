//! Field-projected entity storage.
//!
//! Entities are stored as plain JSON objects rather than generated per-kind
//! structs: the projection set is a field-name set configured at run time,
//! so a fixed struct per kind can't express it without either over- or
//! under-retaining fields.

use serde_json::{Map, Value};
use std::collections::HashSet;

/// A cached entity: its identifying keys plus whatever fields its kind's
/// projection retains.
pub type Entity = Map<String, Value>;

fn is_retained(key: &str, fields: &HashSet<String>, identifying: &[&str]) -> bool {
    identifying.contains(&key) || fields.contains(key)
}

/// Build a fresh entity from a dispatch payload, keeping only identifying
/// keys and projected fields.
pub(crate) fn insert_projected(object: &Map<String, Value>, fields: &HashSet<String>, identifying: &[&str]) -> Entity {
    let mut entity = Entity::new();

    for (key, value) in object {
        if is_retained(key, fields, identifying) {
            entity.insert(key.clone(), value.clone());
        }
    }

    entity
}

/// Shallow field-wise merge: present, non-null values in `object` override
/// the corresponding field on `existing`; fields `object` doesn't carry are
/// left untouched.
pub(crate) fn merge_projected(existing: &mut Entity, object: &Map<String, Value>, fields: &HashSet<String>, identifying: &[&str]) {
    for (key, value) in object {
        if value.is_null() {
            continue;
        }

        if is_retained(key, fields, identifying) {
            existing.insert(key.clone(), value.clone());
        }
    }
}

/// Prepend an id to a list field, skipping it if already present.
pub(crate) fn list_prepend_unique(entity: &mut Entity, field: &str, id: &str) {
    let array = entity.entry(field).or_insert_with(|| Value::Array(Vec::new()));

    if let Value::Array(items) = array {
        if !items.iter().any(|item| item.as_str() == Some(id)) {
            items.insert(0, Value::String(id.to_owned()));
        }
    }
}

/// Remove an id from a list field, if present.
pub(crate) fn list_remove(entity: &mut Entity, field: &str, id: &str) {
    if let Some(Value::Array(items)) = entity.get_mut(field) {
        items.retain(|item| item.as_str() != Some(id));
    }
}

/// Parse a snowflake id out of a `Value`, which the wire always carries as
/// a JSON string.
pub(crate) fn parse_id(value: Option<&Value>) -> Option<u64> {
    value?.as_str()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::{insert_projected, list_prepend_unique, list_remove, merge_projected};
    use serde_json::json;
    use std::collections::HashSet;

    fn fields(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn projection_keeps_identifying_and_listed_fields_only() {
        let object = json!({"id": "1", "name": "general", "nsfw": true}).as_object().unwrap().clone();
        let entity = insert_projected(&object, &fields(&["name"]), &["id"]);

        assert_eq!(Some(&json!("1")), entity.get("id"));
        assert_eq!(Some(&json!("general")), entity.get("name"));
        assert!(!entity.contains_key("nsfw"));
    }

    #[test]
    fn merge_leaves_absent_fields_untouched_and_skips_null() {
        let mut existing = insert_projected(
            &json!({"id": "1", "name": "general", "topic": "old"}).as_object().unwrap().clone(),
            &fields(&["name", "topic"]),
            &["id"],
        );

        let patch = json!({"id": "1", "topic": null}).as_object().unwrap().clone();
        merge_projected(&mut existing, &patch, &fields(&["name", "topic"]), &["id"]);

        assert_eq!(Some(&json!("general")), existing.get("name"));
        assert_eq!(Some(&json!("old")), existing.get("topic"));
    }

    #[test]
    fn list_helpers_dedupe_and_remove() {
        let mut entity = super::Entity::new();
        list_prepend_unique(&mut entity, "channels", "1");
        list_prepend_unique(&mut entity, "channels", "2");
        list_prepend_unique(&mut entity, "channels", "1");

        assert_eq!(&json!(["2", "1"]), &entity["channels"]);

        list_remove(&mut entity, "channels", "2");
        assert_eq!(&json!(["1"]), &entity["channels"]);
    }
}
