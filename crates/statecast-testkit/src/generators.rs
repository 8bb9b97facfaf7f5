//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use statecast_core::Snapshot;

/// Generate a top-level field name.
pub fn field_key() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

/// Generate a scalar JSON value.
pub fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z0-9 ]{0,8}".prop_map(Value::String),
    ]
}

/// Generate a JSON value of bounded depth.
pub fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(field_key(), inner, 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Generate a snapshot with up to `max_fields` top-level fields.
pub fn snapshot(max_fields: usize) -> impl Strategy<Value = Snapshot> {
    prop::collection::btree_map(field_key(), json_value(), 0..=max_fields)
        .prop_map(|fields| Snapshot::from_map(fields.into_iter().collect()))
}

/// Generate an update timestamp.
pub fn timestamp() -> impl Strategy<Value = u64> {
    0u64..=u64::MAX / 2
}

/// Generate a well-formed update message as it would appear on the wire.
pub fn valid_update() -> impl Strategy<Value = Value> {
    (timestamp(), snapshot(6)).prop_map(|(time, state)| {
        json!({ "type": "UPDATE_STATE", "time": time, "state": state.into_value() })
    })
}

/// Generate an update-tagged value whose `time` or `state` may be anything.
pub fn loose_update() -> impl Strategy<Value = Value> {
    (json_value(), json_value()).prop_map(|(time, state)| {
        json!({ "type": "UPDATE_STATE", "time": time, "state": state })
    })
}

/// Generate an arbitrary inbound value: well-formed, malformed, or unrelated.
pub fn wire_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        valid_update(),
        Just(json!({ "type": "REQUEST_STATE" })),
        loose_update(),
        json_value(),
        ("[A-Z_]{0,12}", json_value())
            .prop_map(|(tag, payload)| json!({ "type": tag, "payload": payload })),
    ]
}
