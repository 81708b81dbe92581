//! Dispatch-kind handlers, one module per event group.

mod channel;
mod guild;
mod member;
mod message;
mod presence;
mod ready;
mod role;
mod stage_instance;
mod user;
mod voice_state;

use crate::InMemoryCache;
use serde_json::Value;

/// Route one dispatch to its handler by `t` discriminant.
///
/// Kinds not listed here (bans, integrations, interactions, invites,
/// messages other than create, typing, reactions, webhooks) don't touch the
/// cache.
pub(crate) fn handle(cache: &InMemoryCache, kind: &str, data: &Value) {
    let Some(object) = data.as_object() else {
        return;
    };

    match kind {
        "READY" => ready::handle(cache, object),
        "CHANNEL_CREATE" | "THREAD_CREATE" => channel::handle_create(cache, object),
        "CHANNEL_UPDATE" | "THREAD_UPDATE" => channel::handle_update(cache, object),
        "CHANNEL_DELETE" | "THREAD_DELETE" => channel::handle_delete(cache, object),
        "CHANNEL_PINS_UPDATE" => channel::handle_pins_update(cache, object),
        "GUILD_CREATE" => guild::handle_create(cache, object),
        "GUILD_UPDATE" => guild::handle_update(cache, object),
        "GUILD_DELETE" => guild::handle_delete(cache, object),
        "GUILD_EMOJIS_UPDATE" => guild::handle_list_patch(cache, object, "emojis"),
        "GUILD_STICKERS_UPDATE" => guild::handle_list_patch(cache, object, "stickers"),
        "GUILD_SCHEDULED_EVENT_CREATE" | "GUILD_SCHEDULED_EVENT_UPDATE" => guild::handle_scheduled_event_upsert(cache, object),
        "GUILD_SCHEDULED_EVENT_DELETE" => guild::handle_scheduled_event_delete(cache, object),
        "GUILD_MEMBER_ADD" => member::handle_add(cache, object),
        "GUILD_MEMBER_REMOVE" => member::handle_remove(cache, object),
        "GUILD_MEMBER_UPDATE" => member::handle_update(cache, object),
        "GUILD_MEMBERS_CHUNK" => member::handle_chunk(cache, object),
        "GUILD_ROLE_CREATE" => role::handle_create(cache, object),
        "GUILD_ROLE_UPDATE" => role::handle_update(cache, object),
        "GUILD_ROLE_DELETE" => role::handle_delete(cache, object),
        "MESSAGE_CREATE" => message::handle_create(cache, object),
        "PRESENCE_UPDATE" => presence::handle_update(cache, object),
        "STAGE_INSTANCE_CREATE" | "STAGE_INSTANCE_UPDATE" => stage_instance::handle_upsert(cache, object),
        "STAGE_INSTANCE_DELETE" => stage_instance::handle_delete(cache, object),
        "USER_UPDATE" => user::handle_update(cache, object),
        "VOICE_STATE_UPDATE" => voice_state::handle_update(cache, object),
        _ => {}
    }
}
