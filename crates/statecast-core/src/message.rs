//! Wire messages exchanged between replicas.
//!
//! Two shapes exist: a request for current state, and a timestamped state
//! update. Inbound values are untrusted: anything that claims to be an update
//! must carry a non-negative numeric `time` and a non-null object `state`, or
//! it is rejected.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, Result};
use crate::snapshot::Snapshot;

/// Discriminator carried in the `type` field of every wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Ask connected peers for their current state.
    Request,
    /// Carry a state update to connected peers.
    Update,
}

impl MessageType {
    /// The wire tag for this message type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MessageType::Request => "REQUEST_STATE",
            MessageType::Update => "UPDATE_STATE",
        }
    }

    /// Recognize a wire tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "REQUEST_STATE" => Some(MessageType::Request),
            "UPDATE_STATE" => Some(MessageType::Update),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state update: the sender's projected state at `time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateMessage {
    /// Milliseconds since the Unix epoch on the sender's clock.
    pub time: u64,
    /// The (possibly intercepted) snapshot being shared.
    pub state: Snapshot,
}

/// A validated wire message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "REQUEST_STATE")]
    Request,
    #[serde(rename = "UPDATE_STATE")]
    Update(UpdateMessage),
}

impl Message {
    /// Build an update message.
    pub fn update(time: u64, state: Snapshot) -> Self {
        Message::Update(UpdateMessage { time, state })
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Request => MessageType::Request,
            Message::Update(_) => MessageType::Update,
        }
    }

    /// Render the wire representation.
    pub fn to_value(&self) -> Value {
        let tag = self.message_type().as_str();
        match self {
            Message::Request => serde_json::json!({ "type": tag }),
            Message::Update(update) => serde_json::json!({
                "type": tag,
                "time": update.time,
                "state": update.state,
            }),
        }
    }
}

/// Interpret an untrusted wire value.
///
/// Requests need nothing beyond a recognized tag. Updates must carry a
/// non-negative numeric `time` (fractional values truncate toward zero) and a
/// `state` that is a JSON object.
pub fn decode(value: &Value) -> Result<Message> {
    let object = value.as_object().ok_or(ProtocolError::NotAnObject)?;
    let tag = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?;

    match MessageType::from_tag(tag) {
        Some(MessageType::Request) => Ok(Message::Request),
        Some(MessageType::Update) => {
            let time = object.get("time").and_then(parse_time).ok_or(ProtocolError::InvalidTime)?;
            let state = object
                .get("state")
                .cloned()
                .and_then(Snapshot::from_value)
                .ok_or(ProtocolError::InvalidState)?;
            Ok(Message::Update(UpdateMessage { time, state }))
        }
        None => Err(ProtocolError::UnknownType(tag.to_string())),
    }
}

fn parse_time(value: &Value) -> Option<u64> {
    let number = match value {
        Value::Number(number) => number,
        _ => return None,
    };
    if let Some(time) = number.as_u64() {
        return Some(time);
    }
    match number.as_f64() {
        Some(time) if time.is_finite() && time >= 0.0 => Some(time as u64),
        _ => None,
    }
}

/// True iff `value` is a well-formed update message.
pub fn is_valid_update(value: &Value) -> bool {
    matches!(decode(value), Ok(Message::Update(_)))
}

/// Whether an update stamped `time` is older than the `watermark`.
///
/// Always false when `skip_older` is disabled. Equal timestamps are not stale.
pub fn is_stale(time: u64, watermark: u64, skip_older: bool) -> bool {
    skip_older && time < watermark
}

/// Encode a message as a JSON frame.
pub fn encode_frame(message: &Message) -> Result<Bytes> {
    serde_json::to_vec(message)
        .map(Bytes::from)
        .map_err(|e| ProtocolError::Encoding(e.to_string()))
}

/// Decode a frame into an untrusted JSON value.
pub fn decode_frame(frame: &[u8]) -> Result<Value> {
    serde_json::from_slice(frame).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_request() {
        let msg = decode(&json!({ "type": "REQUEST_STATE" })).unwrap();
        assert_eq!(msg, Message::Request);
    }

    #[test]
    fn test_decode_valid_update() {
        let msg = decode(&json!({ "type": "UPDATE_STATE", "time": 0, "state": {} })).unwrap();
        assert_eq!(msg, Message::update(0, Snapshot::new()));
    }

    #[test]
    fn test_update_with_string_time_is_invalid() {
        let value = json!({ "type": "UPDATE_STATE", "time": "0", "state": {} });
        assert_eq!(decode(&value), Err(ProtocolError::InvalidTime));
        assert!(!is_valid_update(&value));
    }

    #[test]
    fn test_update_with_negative_time_is_invalid() {
        let value = json!({ "type": "UPDATE_STATE", "time": -1, "state": {} });
        assert_eq!(decode(&value), Err(ProtocolError::InvalidTime));

        let value = json!({ "type": "UPDATE_STATE", "time": -0.5, "state": {} });
        assert_eq!(decode(&value), Err(ProtocolError::InvalidTime));
    }

    #[test]
    fn test_update_with_fractional_time_truncates() {
        let value = json!({ "type": "UPDATE_STATE", "time": 12.9, "state": { "a": 1 } });
        match decode(&value).unwrap() {
            Message::Update(update) => assert_eq!(update.time, 12),
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_update_with_null_or_missing_state_is_invalid() {
        let value = json!({ "type": "UPDATE_STATE", "time": 1, "state": null });
        assert_eq!(decode(&value), Err(ProtocolError::InvalidState));

        let value = json!({ "type": "UPDATE_STATE", "time": 1 });
        assert_eq!(decode(&value), Err(ProtocolError::InvalidState));
    }

    #[test]
    fn test_update_with_scalar_state_is_invalid() {
        let value = json!({ "type": "UPDATE_STATE", "time": 1, "state": 42 });
        assert_eq!(decode(&value), Err(ProtocolError::InvalidState));
    }

    #[test]
    fn test_request_is_not_a_valid_update() {
        let value = json!({ "type": "REQUEST_STATE", "time": 0, "state": {} });
        assert!(decode(&value).is_ok());
        assert!(!is_valid_update(&value));
    }

    #[test]
    fn test_unknown_and_missing_tags() {
        assert_eq!(
            decode(&json!({ "type": "PING" })),
            Err(ProtocolError::UnknownType("PING".into()))
        );
        assert_eq!(decode(&json!({ "time": 1 })), Err(ProtocolError::MissingType));
        assert_eq!(decode(&json!({ "type": 7 })), Err(ProtocolError::MissingType));
        assert_eq!(decode(&json!("UPDATE_STATE")), Err(ProtocolError::NotAnObject));
    }

    #[test]
    fn test_is_stale() {
        assert!(is_stale(0, 1, true));
        assert!(!is_stale(2, 2, true));
        assert!(!is_stale(3, 2, true));
        assert!(!is_stale(1, 2, false));
        assert!(!is_stale(2, 2, false));
        assert!(!is_stale(3, 2, false));
    }

    #[test]
    fn test_message_type_matches_tag() {
        let update = Message::update(1, Snapshot::new());
        assert_eq!(update.message_type(), MessageType::Update);
        assert_eq!(Message::Request.message_type(), MessageType::Request);
        assert_eq!(
            MessageType::from_tag(update.message_type().as_str()),
            Some(MessageType::Update)
        );
    }

    #[test]
    fn test_wire_shapes() {
        let state = Snapshot::new().with("x", 1);
        let update = Message::update(7, state);

        assert_eq!(
            update.to_value(),
            json!({ "type": "UPDATE_STATE", "time": 7, "state": { "x": 1 } })
        );
        assert_eq!(Message::Request.to_value(), json!({ "type": "REQUEST_STATE" }));
    }

    #[test]
    fn test_frame_encoding_matches_wire_shape() {
        let msg = Message::update(99, Snapshot::new().with("a", "x"));
        let frame = encode_frame(&msg).unwrap();
        let value = decode_frame(&frame).unwrap();

        assert_eq!(value, msg.to_value());
        assert_eq!(decode(&value).unwrap(), msg);
    }

    #[test]
    fn test_malformed_frame() {
        assert!(matches!(
            decode_frame(b"{not json"),
            Err(ProtocolError::MalformedFrame(_))
        ));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn fractional_time_truncates(whole in 0u64..1_000_000_000, frac in 0.0f64..1.0) {
                let time = whole as f64 + frac;
                let value = json!({ "type": "UPDATE_STATE", "time": time, "state": {} });
                let expected = time as u64;
                prop_assert_eq!(decode(&value), Ok(Message::update(expected, Snapshot::new())));
            }

            #[test]
            fn negative_time_is_invalid(time in i64::MIN..0) {
                let value = json!({ "type": "UPDATE_STATE", "time": time, "state": {} });
                prop_assert_eq!(decode(&value), Err(ProtocolError::InvalidTime));
            }

            #[test]
            fn unknown_tags_are_rejected(tag in "[A-Z_]{1,16}") {
                prop_assume!(MessageType::from_tag(&tag).is_none());
                let value = json!({ "type": tag.clone() });
                prop_assert_eq!(decode(&value), Err(ProtocolError::UnknownType(tag)));
            }
        }
    }
}
