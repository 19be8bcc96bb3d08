use serde_json::{Map, Number, Value};

use super::{FormatError, FormatParser, FormatSerializer};
use crate::udm::{Node, ObjectNode};

/// JSON adapter over serde_json, insertion-ordered maps.
pub struct JsonAdapter {
    pretty: bool,
}

impl JsonAdapter {
    pub fn new(pretty: bool) -> Self {
        JsonAdapter { pretty }
    }
}

impl FormatParser for JsonAdapter {
    fn parse(&self, text: &str) -> Result<Node, FormatError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| FormatError::Syntax(e.to_string()))?;
        Ok(node_from_value(value))
    }
}

impl FormatSerializer for JsonAdapter {
    fn serialize(&self, node: &Node) -> Result<String, FormatError> {
        let value = value_from_node(node)?;
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        rendered.map_err(|e| FormatError::Shape(e.to_string()))
    }
}

fn node_from_value(value: Value) -> Node {
    match value {
        Value::Null => Node::Null,
        Value::Bool(b) => Node::Boolean(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Node::Integer(i)
            } else {
                Node::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Node::String(s),
        Value::Array(elements) => {
            Node::Array(elements.into_iter().map(node_from_value).collect())
        }
        Value::Object(map) => {
            let mut object = ObjectNode::default();
            for (key, value) in map {
                // `@`-prefixed keys with scalar values are attributes in
                // disguise; anything else stays an ordinary entry.
                if let Some(name) = key.strip_prefix('@') {
                    let node = node_from_value(value);
                    if let Some(text) = node.coerce_string() {
                        object.metadata.attributes.push((name.to_string(), text));
                        continue;
                    }
                    object.entries.push((key, node));
                } else {
                    object.entries.push((key, node_from_value(value)));
                }
            }
            Node::Object(object)
        }
    }
}

fn value_from_node(node: &Node) -> Result<Value, FormatError> {
    match node {
        Node::Null => Ok(Value::Null),
        Node::Boolean(b) => Ok(Value::Bool(*b)),
        Node::Integer(n) => Ok(Value::Number(Number::from(*n))),
        Node::Float(n) => Number::from_f64(*n)
            .map(Value::Number)
            .ok_or_else(|| FormatError::Shape(format!("non-finite number {} in output", n))),
        Node::String(s) => Ok(Value::String(s.clone())),
        Node::Array(elements) => {
            let mut out = Vec::with_capacity(elements.len());
            for element in elements {
                out.push(value_from_node(element)?);
            }
            Ok(Value::Array(out))
        }
        Node::Object(object) => {
            let mut map = Map::new();
            for (name, text) in &object.metadata.attributes {
                map.insert(format!("@{}", name), Value::String(text.clone()));
            }
            for (key, value) in &object.entries {
                map.insert(key.clone(), value_from_node(value)?);
            }
            Ok(Value::Object(map))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::udm::Metadata;

    #[test]
    fn attributes_round_trip_as_at_keys() {
        let adapter = JsonAdapter::new(false);
        let parsed = adapter.parse(r#"{"@id": "5", "val": 1}"#).unwrap();
        let expected = Node::Object(ObjectNode {
            entries: vec![("val".to_string(), Node::Integer(1))],
            metadata: Metadata {
                attributes: vec![("id".to_string(), "5".to_string())],
                namespace: None,
            },
        });
        assert_eq!(parsed, expected);
        assert_eq!(
            adapter.serialize(&parsed).unwrap(),
            r#"{"@id":"5","val":1}"#
        );
    }

    #[test]
    fn integers_and_floats_stay_distinct() {
        let adapter = JsonAdapter::new(false);
        let parsed = adapter.parse(r#"[1, 1.5]"#).unwrap();
        assert_eq!(
            parsed,
            Node::Array(vec![Node::Integer(1), Node::Float(1.5)])
        );
    }

    #[test]
    fn key_order_is_preserved() {
        let adapter = JsonAdapter::new(false);
        let parsed = adapter.parse(r#"{"z": 1, "a": 2}"#).unwrap();
        assert_eq!(adapter.serialize(&parsed).unwrap(), r#"{"z":1,"a":2}"#);
    }

    #[test]
    fn non_scalar_at_key_stays_an_entry() {
        let adapter = JsonAdapter::new(false);
        let parsed = adapter.parse(r#"{"@meta": {"a": 1}}"#).unwrap();
        match parsed {
            Node::Object(object) => {
                assert!(object.metadata.attributes.is_empty());
                assert_eq!(object.entries[0].0, "@meta");
            }
            other => panic!("expected an object, got {:?}", other),
        }
    }
}
