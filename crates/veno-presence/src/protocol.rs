//! Wire types for the realtime service (Phoenix Channels v1 JSON framing).
//!
//! The transport envelope and the presence payloads that ride inside it.
//! Connection management lives in `realtime.rs`; presence bookkeeping in
//! `presence_map.rs`.

use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Phoenix protocol event names.
pub mod events {
    pub const JOIN: &str = "phx_join";
    pub const LEAVE: &str = "phx_leave";
    pub const REPLY: &str = "phx_reply";
    pub const ERROR: &str = "phx_error";
    pub const CLOSE: &str = "phx_close";
    pub const HEARTBEAT: &str = "heartbeat";
    pub const PRESENCE: &str = "presence";
    pub const PRESENCE_STATE: &str = "presence_state";
    pub const PRESENCE_DIFF: &str = "presence_diff";
}

/// Topic reserved for connection-level heartbeats.
pub const HEARTBEAT_TOPIC: &str = "phoenix";

/// A Phoenix protocol message envelope (v1 JSON format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    pub payload: serde_json::Value,
    #[serde(rename = "ref")]
    pub msg_ref: Option<String>,
}

impl PhoenixMessage {
    pub fn new(
        topic: impl Into<String>,
        event: impl Into<String>,
        payload: serde_json::Value,
        msg_ref: Option<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            event: event.into(),
            payload,
            msg_ref,
        }
    }
}

/// Prefix the realtime service expects on channel topics.
pub fn channel_topic(topic: &str) -> String {
    format!("realtime:{topic}")
}

/// Strip the realtime prefix from an incoming topic.
pub fn strip_topic_prefix(topic: &str) -> &str {
    topic.strip_prefix("realtime:").unwrap_or(topic)
}

/// Build the `phx_join` payload for a presence-enabled channel keyed by
/// `presence_key`. At most one presence slot exists per key per connection.
pub fn join_payload(presence_key: &str, access_token: Option<&str>) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "config": {
            "broadcast": { "self": false, "ack": false },
            "presence": { "key": presence_key }
        }
    });
    if let Some(token) = access_token {
        payload["access_token"] = serde_json::json!(token);
    }
    payload
}

/// Build the presence `track` payload envelope.
pub fn track_payload(record: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "type": "presence",
        "event": "track",
        "payload": record
    })
}

/// One user's presence entry, as tracked on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub user_id: String,
    pub username: String,
    /// ISO-8601 timestamp of when this session came online.
    #[serde(default)]
    pub online_at: String,
}

impl PresenceRecord {
    /// Parse a record from a raw presence meta entry. Entries missing a
    /// `user_id` or `username` are skipped by callers; extra provider
    /// fields (`phx_ref` and friends) are ignored.
    pub fn from_meta(meta: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(meta.clone()).ok()
    }
}

/// Parse a Phoenix presence map into `key -> metas`.
///
/// The service sends presence as `{ "key": { "metas": [{ ... }] } }`.
pub fn parse_presence_map(
    value: &serde_json::Value,
) -> HashMap<String, Vec<serde_json::Value>> {
    let mut result = HashMap::new();
    if let Some(obj) = value.as_object() {
        for (key, val) in obj {
            if let Some(metas) = val.get("metas").and_then(|m| m.as_array()) {
                result.insert(key.clone(), metas.clone());
            }
        }
    }
    result
}

/// Current time as an ISO-8601 string, millisecond precision.
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_ref_field() {
        let msg = PhoenixMessage::new(
            "realtime:online-users",
            events::JOIN,
            serde_json::json!({}),
            Some("1".into()),
        );
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"ref\":\"1\""));
        assert!(!json.contains("msg_ref"));

        let parsed: PhoenixMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.msg_ref.as_deref(), Some("1"));
    }

    #[test]
    fn topic_prefix_round_trip() {
        let full = channel_topic("online-users");
        assert_eq!(full, "realtime:online-users");
        assert_eq!(strip_topic_prefix(&full), "online-users");
        assert_eq!(strip_topic_prefix("bare"), "bare");
    }

    #[test]
    fn join_payload_carries_presence_key() {
        let payload = join_payload("u1", None);
        assert_eq!(payload["config"]["presence"]["key"], "u1");
        assert_eq!(payload["config"]["broadcast"]["self"], false);
        assert!(payload.get("access_token").is_none());
    }

    #[test]
    fn join_payload_carries_access_token_when_present() {
        let payload = join_payload("u1", Some("jwt"));
        assert_eq!(payload["access_token"], "jwt");
    }

    #[test]
    fn track_payload_wraps_record() {
        let payload = track_payload(serde_json::json!({"user_id": "u1"}));
        assert_eq!(payload["type"], "presence");
        assert_eq!(payload["event"], "track");
        assert_eq!(payload["payload"]["user_id"], "u1");
    }

    #[test]
    fn record_from_meta_ignores_provider_fields() {
        let meta = serde_json::json!({
            "phx_ref": "abc123",
            "user_id": "u1",
            "username": "jane",
            "online_at": "2026-08-07T10:00:00.000Z"
        });
        let record = PresenceRecord::from_meta(&meta).unwrap();
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.username, "jane");
    }

    #[test]
    fn record_from_meta_rejects_missing_user_id() {
        let meta = serde_json::json!({ "username": "jane" });
        assert!(PresenceRecord::from_meta(&meta).is_none());
    }

    #[test]
    fn record_from_meta_defaults_online_at() {
        let meta = serde_json::json!({ "user_id": "u1", "username": "jane" });
        let record = PresenceRecord::from_meta(&meta).unwrap();
        assert_eq!(record.online_at, "");
    }

    #[test]
    fn parse_presence_map_extracts_metas() {
        let value = serde_json::json!({
            "u1": { "metas": [{ "user_id": "u1", "username": "a" }] },
            "u2": { "metas": [{ "user_id": "u2", "username": "b" }, { "user_id": "u2", "username": "b" }] },
            "broken": { "nope": true }
        });
        let map = parse_presence_map(&value);
        assert_eq!(map.len(), 2);
        assert_eq!(map["u1"].len(), 1);
        assert_eq!(map["u2"].len(), 2);
    }

    #[test]
    fn iso_now_looks_like_iso8601() {
        let now = iso_now();
        assert!(now.contains('T'));
        assert!(now.ends_with('Z'));
    }
}
