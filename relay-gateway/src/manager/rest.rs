//! The "get gateway bot" REST collaborator interface.
//!
//! The manager consumes exactly one REST response shape. It has no HTTP
//! client of its own; callers fetch `GET /gateway/bot` with their own REST
//! client and hand the manager the parsed [`GatewayBotInfo`].

use serde::Deserialize;

/// Response shape of Discord's `GET /gateway/bot`.
#[derive(Clone, Debug, Deserialize)]
pub struct GatewayBotInfo {
    pub url: String,
    pub shards: u64,
    pub session_start_limit: SessionStartLimit,
}

/// The `session_start_limit` sub-object of [`GatewayBotInfo`].
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SessionStartLimit {
    pub remaining: u64,
    pub reset_after: u64,
    pub max_concurrency: u64,
}

#[cfg(test)]
mod tests {
    use super::GatewayBotInfo;

    #[test]
    fn parses_documented_shape() {
        let info: GatewayBotInfo = serde_json::from_str(
            r#"{"url":"wss://gateway.discord.gg","shards":4,"session_start_limit":{"remaining":998,"reset_after":3000000,"max_concurrency":2}}"#,
        )
        .unwrap();

        assert_eq!(4, info.shards);
        assert_eq!(2, info.session_start_limit.max_concurrency);
    }
}
