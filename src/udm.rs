//! # Universal Data Model
//!
//! The format-agnostic tree every transformation runs against. Format
//! adapters fold concrete documents (JSON, YAML, CSV) into [`Node`] values;
//! the evaluator consumes and produces nothing else.
//!
//! A `Node` tree is acyclic and immutable once built: the evaluator never
//! edits a node in place, it builds replacements and shares untouched
//! subtrees by cloning. Object properties are an *ordered* map: source
//! order is preserved end to end, and structural equality of objects is
//! order-sensitive.
pub mod navigator;

pub use navigator::{navigate, PathSegment, PredicateHost};

/// Per-object metadata: attributes and an optional namespace.
///
/// Attributes carry the markup-level key/value pairs (an XML attribute, an
/// `@`-prefixed object key) that are data *about* an object rather than its
/// children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata {
    pub attributes: Vec<(String, String)>,
    pub namespace: Option<String>,
}

impl Metadata {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// An object node: ordered properties plus metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectNode {
    pub entries: Vec<(String, Node)>,
    pub metadata: Metadata,
}

impl ObjectNode {
    pub fn new(entries: Vec<(String, Node)>) -> Self {
        ObjectNode {
            entries,
            metadata: Metadata::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// A value in the Universal Data Model.
///
/// All scalar kinds are flattened into the enum (with integers kept apart
/// from floats, as the language preserves the distinction through
/// arithmetic).
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Absent or explicit null
    Null,

    /// Boolean scalar
    Boolean(bool),

    /// Integer scalar (preserved separately from floats)
    Integer(i64),

    /// Floating-point scalar
    Float(f64),

    /// UTF-8 string scalar
    String(String),

    /// Ordered sequence of nodes
    Array(Vec<Node>),

    /// Ordered properties plus metadata
    Object(ObjectNode),
}

impl Node {
    /// Build an object node from ordered `(key, value)` pairs.
    pub fn object(entries: Vec<(String, Node)>) -> Node {
        Node::Object(ObjectNode::new(entries))
    }

    /// Human-readable type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Boolean(_) => "boolean",
            Node::Integer(_) => "integer",
            Node::Float(_) => "float",
            Node::String(_) => "string",
            Node::Array(_) => "array",
            Node::Object(_) => "object",
        }
    }

    /// Get as float, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Node::Integer(n) => Some(*n as f64),
            Node::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    /// String coercion for scalars. Arrays and objects do not coerce; the
    /// caller decides whether that is an error.
    pub fn coerce_string(&self) -> Option<String> {
        match self {
            Node::String(s) => Some(s.clone()),
            Node::Integer(n) => Some(n.to_string()),
            Node::Float(n) => Some(n.to_string()),
            Node::Boolean(b) => Some(b.to_string()),
            Node::Null => Some("null".to_string()),
            Node::Array(_) | Node::Object(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_entries() {
        let obj = Node::object(vec![
            ("z".into(), Node::Integer(1)),
            ("a".into(), Node::Integer(2)),
        ]);
        match &obj {
            Node::Object(o) => {
                assert_eq!(o.entries[0].0, "z");
                assert_eq!(o.entries[1].0, "a");
            }
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_attribute_lookup() {
        let mut obj = ObjectNode::new(vec![]);
        obj.metadata.attributes.push(("id".into(), "5".into()));
        assert_eq!(obj.metadata.attribute("id"), Some("5"));
        assert_eq!(obj.metadata.attribute("missing"), None);
    }

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(Node::Integer(5).coerce_string().as_deref(), Some("5"));
        assert_eq!(Node::Boolean(true).coerce_string().as_deref(), Some("true"));
        assert_eq!(Node::Array(vec![]).coerce_string(), None);
    }
}
