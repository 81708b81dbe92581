//! DashMap-backed storage for flat and guild-scoped entity kinds.

use crate::entity::{insert_projected, merge_projected, Entity};
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A kind keyed directly by entity id: Channels, Guilds, Roles, Users.
#[derive(Debug, Default)]
pub struct FlatStore(DashMap<u64, Entity>);

impl FlatStore {
    pub(crate) fn new() -> Self {
        Self(DashMap::new())
    }

    pub(crate) fn upsert(&self, id: u64, entity: Entity) {
        self.0.insert(id, entity);
    }

    pub(crate) fn merge_or_insert(&self, id: u64, object: &Map<String, Value>, fields: &HashSet<String>, identifying: &[&str]) {
        if let Some(mut existing) = self.0.get_mut(&id) {
            merge_projected(&mut existing, object, fields, identifying);
            return;
        }

        self.0.insert(id, insert_projected(object, fields, identifying));
    }

    pub(crate) fn mutate(&self, id: u64, f: impl FnOnce(&mut Entity)) {
        if let Some(mut entity) = self.0.get_mut(&id) {
            f(&mut entity);
        }
    }

    pub(crate) fn remove(&self, id: u64) -> Option<Entity> {
        self.0.remove(&id).map(|(_, entity)| entity)
    }

    /// Remove every entity whose `field` equals `value` (used to sweep
    /// channels/roles by `guild_id` on guild eviction).
    pub(crate) fn remove_where_field_eq(&self, field: &str, value: &str) {
        let matches: Vec<u64> = self
            .0
            .iter()
            .filter(|entry| entry.value().get(field).and_then(Value::as_str) == Some(value))
            .map(|entry| *entry.key())
            .collect();

        for id in matches {
            self.0.remove(&id);
        }
    }

    /// Look up a cached entity by id.
    pub fn get(&self, id: u64) -> Option<Entity> {
        self.0.get(&id).map(|entity| entity.clone())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A kind keyed by `(guild_id, user_id)`: Members, Presences, VoiceStates.
#[derive(Debug, Default)]
pub struct GuildScopedStore(DashMap<u64, DashMap<u64, Entity>>);

impl GuildScopedStore {
    pub(crate) fn new() -> Self {
        Self(DashMap::new())
    }

    pub(crate) fn upsert(&self, guild_id: u64, user_id: u64, entity: Entity) {
        self.0.entry(guild_id).or_insert_with(DashMap::new).insert(user_id, entity);
    }

    pub(crate) fn merge_or_insert(
        &self,
        guild_id: u64,
        user_id: u64,
        object: &Map<String, Value>,
        fields: &HashSet<String>,
        identifying: &[&str],
    ) {
        let sub = self.0.entry(guild_id).or_insert_with(DashMap::new);

        if let Some(mut existing) = sub.get_mut(&user_id) {
            merge_projected(&mut existing, object, fields, identifying);
            return;
        }

        sub.insert(user_id, insert_projected(object, fields, identifying));
    }

    pub(crate) fn mutate(&self, guild_id: u64, user_id: u64, f: impl FnOnce(&mut Entity)) {
        if let Some(sub) = self.0.get(&guild_id) {
            if let Some(mut entity) = sub.get_mut(&user_id) {
                f(&mut entity);
            }
        }
    }

    /// Remove one `(guild_id, user_id)` entry, dropping the guild's
    /// sub-map entirely if it becomes empty.
    pub(crate) fn remove(&self, guild_id: u64, user_id: u64) {
        let became_empty = match self.0.get(&guild_id) {
            Some(sub) => {
                sub.remove(&user_id);
                sub.is_empty()
            }
            None => return,
        };

        if became_empty {
            self.0.remove(&guild_id);
        }
    }

    /// Drop an entire guild's sub-map, e.g. on non-unavailable `GuildDelete`.
    pub(crate) fn remove_guild(&self, guild_id: u64) {
        self.0.remove(&guild_id);
    }

    /// Look up a cached entity by its guild and user id.
    pub fn get(&self, guild_id: u64, user_id: u64) -> Option<Entity> {
        self.0.get(&guild_id)?.get(&user_id).map(|entity| entity.clone())
    }

    pub fn guild_len(&self, guild_id: u64) -> usize {
        self.0.get(&guild_id).map(|sub| sub.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::{FlatStore, GuildScopedStore};
    use serde_json::json;
    use std::collections::HashSet;

    fn fields(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flat_store_merges_in_place() {
        let store = FlatStore::new();
        let object = json!({"id": "1", "name": "general"}).as_object().unwrap().clone();
        store.merge_or_insert(1, &object, &fields(&["name"]), &["id"]);

        let patch = json!({"id": "1", "topic": "hi"}).as_object().unwrap().clone();
        store.merge_or_insert(1, &patch, &fields(&["name", "topic"]), &["id"]);

        let entity = store.get(1).unwrap();
        assert_eq!(Some(&json!("general")), entity.get("name"));
        assert_eq!(Some(&json!("hi")), entity.get("topic"));
    }

    #[test]
    fn flat_store_sweeps_by_field() {
        let store = FlatStore::new();
        store.upsert(1, json!({"id": "1", "guild_id": "9"}).as_object().unwrap().clone());
        store.upsert(2, json!({"id": "2", "guild_id": "9"}).as_object().unwrap().clone());
        store.upsert(3, json!({"id": "3", "guild_id": "10"}).as_object().unwrap().clone());

        store.remove_where_field_eq("guild_id", "9");

        assert!(store.get(1).is_none());
        assert!(store.get(2).is_none());
        assert!(store.get(3).is_some());
    }

    #[test]
    fn guild_scoped_store_drops_empty_submap() {
        let store = GuildScopedStore::new();
        store.upsert(9, 100, json!({"user_id": "100", "guild_id": "9"}).as_object().unwrap().clone());
        assert_eq!(1, store.guild_len(9));

        store.remove(9, 100);
        assert_eq!(0, store.guild_len(9));
        assert!(store.get(9, 100).is_none());
    }
}
