//! Parsing of the Realtime Database streaming protocol.
//!
//! A `GET` with `Accept: text/event-stream` answers with server-sent events:
//!
//! ```text
//! event: put
//! data: {"path": "/", "data": {"-Na": {"name": "Ring"}}}
//!
//! event: patch
//! data: {"path": "/-Na", "data": {"quantity": 2}}
//!
//! event: keep-alive
//! data: null
//! ```
//!
//! `cancel` and `auth_revoked` end the stream.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::DatabaseError;
use super::tree;

/// One decoded stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Replace the value at `path` (relative to the subscription).
    Put { path: Vec<String>, data: Value },
    /// Merge children into the value at `path`.
    Patch {
        path: Vec<String>,
        data: Map<String, Value>,
    },
    KeepAlive,
    /// Security rules no longer allow the read.
    Cancel,
    /// The credential used for the stream expired.
    AuthRevoked,
}

#[derive(Deserialize)]
struct Payload {
    path: String,
    #[serde(default)]
    data: Value,
}

impl StreamEvent {
    /// Apply a `put` or `patch` to the local mirror. Returns `false` for
    /// events that do not change data.
    pub fn apply(self, mirror: &mut Value) -> bool {
        match self {
            Self::Put { path, data } => {
                tree::set_at(mirror, &path, data);
                true
            }
            Self::Patch { path, data } => {
                tree::merge_at(mirror, &path, data);
                true
            }
            Self::KeepAlive | Self::Cancel | Self::AuthRevoked => false,
        }
    }
}

/// Remove one complete event (terminated by a blank line) from the front of
/// `buffer`. Carriage returns must already be stripped.
pub fn extract_sse_event(buffer: &mut Vec<u8>) -> Option<String> {
    let idx = buffer.windows(2).position(|w| w == b"\n\n")?;
    let event: Vec<u8> = buffer.drain(..idx + 2).take(idx).collect();
    Some(String::from_utf8_lossy(&event).into_owned())
}

/// Decode an event block. Unknown event types are skipped.
pub fn parse_sse_event(event: &str) -> Option<Result<StreamEvent, DatabaseError>> {
    if event.trim().is_empty() {
        return None;
    }

    let mut name = None;
    let mut data = String::new();
    for line in event.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            name = Some(value.trim());
        } else if let Some(value) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(value.trim_start());
        }
    }

    match name? {
        "put" => Some(parse_payload(&data).map(|(path, data)| StreamEvent::Put { path, data })),
        "patch" => Some(parse_payload(&data).map(|(path, data)| {
            let data = match data {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            StreamEvent::Patch { path, data }
        })),
        "keep-alive" => Some(Ok(StreamEvent::KeepAlive)),
        "cancel" => Some(Ok(StreamEvent::Cancel)),
        "auth_revoked" => Some(Ok(StreamEvent::AuthRevoked)),
        other => {
            tracing::debug!(event = %other, "Ignoring unknown stream event");
            None
        }
    }
}

fn parse_payload(data: &str) -> Result<(Vec<String>, Value), DatabaseError> {
    let payload: Payload = serde_json::from_str(data)?;
    let path = payload
        .path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Ok((path, payload.data))
}
