//! Ticker feed protocol types.
//!
//! Defines the JSON frames received from the energy backend over WebSocket
//! and the boundary decoding that turns them into `SnapshotUpdate`s. A
//! malformed field is dropped on its own; the rest of the frame still
//! applies.
//!
//! Also defines the outbound boost request sent back to the backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Frame types that carry a ticker snapshot in `data`.
pub const SNAPSHOT_FRAME_TYPES: [&str; 3] = ["ticker-update", "snapshot", "update"];

/// Top-level message frame from the backend.
#[derive(Debug, Deserialize, Clone)]
pub struct Frame {
    #[serde(default)]
    pub version: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub timestamp: String,
    pub data: Option<Value>,
}

/// One complete push delivery: current energy and the full news list.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub energy: f64,
    pub news: Vec<String>,
}

impl Snapshot {
    pub fn new(energy: f64, news: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            energy,
            news: news.into_iter().map(Into::into).collect(),
        }
    }
}

/// A snapshot after boundary validation. `None` marks a field that was
/// missing or malformed and must leave the prior state untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotUpdate {
    pub energy: Option<f64>,
    pub news: Option<Vec<String>>,
}

impl SnapshotUpdate {
    pub fn is_empty(&self) -> bool {
        self.energy.is_none() && self.news.is_none()
    }
}

impl From<Snapshot> for SnapshotUpdate {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            energy: Some(snapshot.energy),
            news: Some(snapshot.news),
        }
    }
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Snapshot(SnapshotUpdate),
    Hello { protocol_version: Option<String> },
    Ignored,
}

/// Decode one text message from the feed.
///
/// Accepts an enveloped `Frame` whose type is one of
/// [`SNAPSHOT_FRAME_TYPES`], or a bare `{energy, news}` object. Returns
/// `None` for text that is not JSON at all.
pub fn decode_message(text: &str) -> Option<Inbound> {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            debug!(target: "protocol", "Dropping non-JSON message: {}", e);
            return None;
        }
    };

    if value.get("type").is_none() {
        return Some(payload_to_inbound(&value));
    }

    let frame: Frame = match serde_json::from_value(value) {
        Ok(f) => f,
        Err(e) => {
            debug!(target: "protocol", "Dropping malformed frame: {}", e);
            return None;
        }
    };

    let inbound = match frame.msg_type.as_str() {
        "hello" => Inbound::Hello {
            protocol_version: frame
                .data
                .as_ref()
                .and_then(|d| d.get("protocol_version"))
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        t if SNAPSHOT_FRAME_TYPES.contains(&t) => match &frame.data {
            Some(data) => payload_to_inbound(data),
            None => Inbound::Ignored,
        },
        _ => Inbound::Ignored,
    };
    Some(inbound)
}

fn payload_to_inbound(payload: &Value) -> Inbound {
    if payload.is_object() {
        Inbound::Snapshot(decode_snapshot(payload))
    } else {
        Inbound::Ignored
    }
}

/// Validate a snapshot payload field by field.
///
/// `soul` is accepted as a legacy alias of `energy`. Energy must be a finite
/// number; news must be an array made only of strings.
pub fn decode_snapshot(payload: &Value) -> SnapshotUpdate {
    let raw_energy = payload.get("energy").or_else(|| payload.get("soul"));
    let energy = raw_energy.and_then(Value::as_f64).filter(|e| e.is_finite());
    if let (Some(raw), None) = (raw_energy, energy) {
        let raw = raw.to_string();
        debug!(target: "protocol", energy = %raw, "Discarding malformed energy");
    }

    let raw_news = payload.get("news");
    let news = raw_news.and_then(Value::as_array).and_then(|items| {
        items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<String>>>()
    });
    if raw_news.is_some() && news.is_none() {
        debug!(target: "protocol", "Discarding malformed news list");
    }

    SnapshotUpdate { energy, news }
}

/// Connection status of the feed transport.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
    Error(String),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

// ---------------------------------------------------------------------------
// Outbound message types (energy-ticker → backend)
// ---------------------------------------------------------------------------

/// Asks the backend to raise the energy level. The result arrives later as
/// an ordinary snapshot, never as a reply to this message.
#[derive(Debug, Clone, Serialize)]
pub struct BoostRequest {
    pub version: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    pub timestamp: String,
    pub source: String,
}

impl BoostRequest {
    pub fn new() -> Self {
        Self {
            version: "1.0".to_string(),
            msg_type: "boost_energy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            source: "energy-ticker".to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Default for BoostRequest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_of(text: &str) -> SnapshotUpdate {
        match decode_message(text) {
            Some(Inbound::Snapshot(update)) => update,
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn decodes_enveloped_ticker_update() {
        let update = snapshot_of(
            r#"{"version":"1.0","type":"ticker-update","timestamp":"t","data":{"energy":83.5,"news":["A","B"]}}"#,
        );
        assert_eq!(update.energy, Some(83.5));
        assert_eq!(update.news, Some(vec!["A".to_string(), "B".to_string()]));
    }

    #[test]
    fn decodes_bare_payload_with_soul_alias() {
        let update = snapshot_of(r#"{"soul":42,"news":[]}"#);
        assert_eq!(update.energy, Some(42.0));
        assert_eq!(update.news, Some(vec![]));
    }

    #[test]
    fn keeps_out_of_range_energy() {
        assert_eq!(snapshot_of(r#"{"energy":-5,"news":[]}"#).energy, Some(-5.0));
        assert_eq!(snapshot_of(r#"{"energy":250,"news":[]}"#).energy, Some(250.0));
    }

    #[test]
    fn drops_malformed_energy_but_keeps_news() {
        let update = snapshot_of(r#"{"energy":"NaN","news":["x"]}"#);
        assert_eq!(update.energy, None);
        assert_eq!(update.news, Some(vec!["x".to_string()]));
    }

    #[test]
    fn drops_malformed_news_but_keeps_energy() {
        let update = snapshot_of(r#"{"energy":10,"news":"not a list"}"#);
        assert_eq!(update.energy, Some(10.0));
        assert_eq!(update.news, None);

        let mixed = snapshot_of(r#"{"energy":10,"news":["ok", 3]}"#);
        assert_eq!(mixed.news, None);
    }

    #[test]
    fn missing_fields_are_none() {
        let update = snapshot_of(r#"{"type":"snapshot","data":{}}"#);
        assert!(update.is_empty());
    }

    #[test]
    fn hello_frame_reports_protocol_version() {
        let inbound = decode_message(r#"{"type":"hello","data":{"protocol_version":"1.2"}}"#);
        assert_eq!(
            inbound,
            Some(Inbound::Hello {
                protocol_version: Some("1.2".to_string())
            })
        );
    }

    #[test]
    fn unknown_frames_are_ignored() {
        assert_eq!(decode_message(r#"{"type":"pong"}"#), Some(Inbound::Ignored));
        assert_eq!(decode_message(r#"[1,2,3]"#), Some(Inbound::Ignored));
        assert_eq!(decode_message("not json"), None);
    }

    #[test]
    fn boost_request_serializes_type_field() {
        let json = BoostRequest::new().to_json();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "boost_energy");
        assert_eq!(value["source"], "energy-ticker");
        assert_eq!(value["version"], "1.0");
    }

    #[test]
    fn full_snapshot_converts_to_update() {
        let update: SnapshotUpdate = Snapshot::new(83.0, ["A"]).into();
        assert_eq!(update.energy, Some(83.0));
        assert_eq!(update.news, Some(vec!["A".to_string()]));
    }
}
