//! JSON form of configuration trees, used for state files and CLI documents.
//!
//! Absent attributes are omitted, `Null` is JSON `null`, and `Unknown` is the
//! marker object `{"$unknown": true}`. Reading a document back needs the
//! schema (an object and a map look the same in JSON), see
//! [`decode_config`](crate::engine::decode_config).

use serde_json::{Map, Value};

use super::config::{ConfigNode, ConfigValue};
use super::tri_state::TriState;

/// Member name of the unknown marker object.
pub const UNKNOWN_MARKER: &str = "$unknown";

/// Encodes a configuration node. Returns `None` for `Absent`.
#[must_use]
pub fn encode_config(node: &ConfigNode) -> Option<Value> {
    match node {
        TriState::Absent => None,
        TriState::Null => Some(Value::Null),
        TriState::Unknown => Some(unknown_marker()),
        TriState::Present(ConfigValue::Scalar(value)) => Some(value.to_json()),
        TriState::Present(ConfigValue::List(items)) => Some(Value::Array(
            items
                .iter()
                .map(|item| encode_config(item).unwrap_or(Value::Null))
                .collect(),
        )),
        TriState::Present(ConfigValue::Object(fields)) => Some(encode_members(fields.iter())),
        TriState::Present(ConfigValue::Map(entries)) => Some(encode_members(entries.iter())),
    }
}

fn encode_members<'a>(members: impl Iterator<Item = (&'a String, &'a ConfigNode)>) -> Value {
    let mut object = Map::new();
    for (name, node) in members {
        if let Some(value) = encode_config(node) {
            object.insert(name.clone(), value);
        }
    }
    Value::Object(object)
}

/// The JSON stand-in for a value known only after apply.
#[must_use]
pub fn unknown_marker() -> Value {
    let mut object = Map::new();
    object.insert(UNKNOWN_MARKER.to_string(), Value::Bool(true));
    Value::Object(object)
}

/// Returns true when `value` is the unknown marker.
#[must_use]
pub fn is_unknown_marker(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.len() == 1 && object.get(UNKNOWN_MARKER) == Some(&Value::Bool(true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_distinguishes_absent_null_and_empty() {
        let node = ConfigNode::object([
            ("description", ConfigNode::Absent),
            ("project", ConfigNode::Null),
            ("labels", ConfigNode::keyed::<String>([])),
            ("name", ConfigNode::scalar("")),
            ("version", ConfigNode::Unknown),
        ]);

        assert_eq!(
            encode_config(&node),
            Some(json!({
                "project": null,
                "labels": {},
                "name": "",
                "version": {"$unknown": true}
            }))
        );
    }

    #[test]
    fn test_marker_detection() {
        assert!(is_unknown_marker(&unknown_marker()));
        assert!(!is_unknown_marker(&json!({"$unknown": true, "other": 1})));
        assert!(!is_unknown_marker(&json!("$unknown")));
    }
}
