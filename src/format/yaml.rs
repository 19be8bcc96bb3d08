use serde_yaml::{Mapping, Value};

use super::{FormatError, FormatParser, FormatSerializer};
use crate::udm::{Node, ObjectNode};

/// YAML adapter over serde_yaml. Attribute handling mirrors the JSON
/// adapter: `@`-prefixed scalar keys round-trip as metadata attributes.
pub struct YamlAdapter;

impl FormatParser for YamlAdapter {
    fn parse(&self, text: &str) -> Result<Node, FormatError> {
        let value: Value =
            serde_yaml::from_str(text).map_err(|e| FormatError::Syntax(e.to_string()))?;
        node_from_value(value)
    }
}

impl FormatSerializer for YamlAdapter {
    fn serialize(&self, node: &Node) -> Result<String, FormatError> {
        let value = value_from_node(node)?;
        serde_yaml::to_string(&value).map_err(|e| FormatError::Shape(e.to_string()))
    }
}

fn node_from_value(value: Value) -> Result<Node, FormatError> {
    match value {
        Value::Null => Ok(Node::Null),
        Value::Bool(b) => Ok(Node::Boolean(b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Node::Integer(i))
            } else {
                Ok(Node::Float(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        Value::String(s) => Ok(Node::String(s)),
        Value::Sequence(elements) => {
            let mut out = Vec::with_capacity(elements.len());
            for element in elements {
                out.push(node_from_value(element)?);
            }
            Ok(Node::Array(out))
        }
        Value::Mapping(mapping) => {
            let mut object = ObjectNode::default();
            for (key, value) in mapping {
                let Value::String(key) = key else {
                    return Err(FormatError::Shape(
                        "mapping keys must be strings".to_string(),
                    ));
                };
                if let Some(name) = key.strip_prefix('@') {
                    let node = node_from_value(value)?;
                    if let Some(text) = node.coerce_string() {
                        object.metadata.attributes.push((name.to_string(), text));
                        continue;
                    }
                    object.entries.push((key, node));
                } else {
                    object.entries.push((key.clone(), node_from_value(value)?));
                }
            }
            Ok(Node::Object(object))
        }
        Value::Tagged(tagged) => node_from_value(tagged.value),
    }
}

fn value_from_node(node: &Node) -> Result<Value, FormatError> {
    match node {
        Node::Null => Ok(Value::Null),
        Node::Boolean(b) => Ok(Value::Bool(*b)),
        Node::Integer(n) => Ok(Value::Number((*n).into())),
        Node::Float(n) => {
            if n.is_finite() {
                Ok(Value::Number((*n).into()))
            } else {
                Err(FormatError::Shape(format!(
                    "non-finite number {} in output",
                    n
                )))
            }
        }
        Node::String(s) => Ok(Value::String(s.clone())),
        Node::Array(elements) => {
            let mut out = Vec::with_capacity(elements.len());
            for element in elements {
                out.push(value_from_node(element)?);
            }
            Ok(Value::Sequence(out))
        }
        Node::Object(object) => {
            let mut mapping = Mapping::new();
            for (name, text) in &object.metadata.attributes {
                mapping.insert(
                    Value::String(format!("@{}", name)),
                    Value::String(text.clone()),
                );
            }
            for (key, value) in &object.entries {
                mapping.insert(Value::String(key.clone()), value_from_node(value)?);
            }
            Ok(Value::Mapping(mapping))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars_and_nesting() {
        let parsed = YamlAdapter.parse("a: 1\nb:\n  - x\n  - 2.5\n").unwrap();
        let expected = Node::object(vec![
            ("a".to_string(), Node::Integer(1)),
            (
                "b".to_string(),
                Node::Array(vec![Node::String("x".to_string()), Node::Float(2.5)]),
            ),
        ]);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn attributes_round_trip() {
        let parsed = YamlAdapter.parse("'@id': '5'\nval: 1\n").unwrap();
        let rendered = YamlAdapter.serialize(&parsed).unwrap();
        assert_eq!(YamlAdapter.parse(&rendered).unwrap(), parsed);
    }

    #[test]
    fn non_string_keys_are_a_shape_error() {
        let result = YamlAdapter.parse("1: a\n");
        assert!(matches!(result, Err(FormatError::Shape(_))));
    }
}
