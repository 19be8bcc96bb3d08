//! Path navigation over the Universal Data Model.
//!
//! A path is a list of segments applied left to right to a *working set* of
//! nodes, starting from `{root}`. Shape mismatches (a property on a
//! non-object, an index on a non-array) shrink the working set instead of
//! erroring: absent paths are routine in semi-structured data, and every
//! aggregate in the language relies on empty-set-not-error semantics.

use crate::ast::Expr;
use crate::evaluator::EvalError;
use crate::udm::Node;

/// One step of a navigation path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Object property by name; at most one node per input node
    Property(String),

    /// Array element by index; negative indices count from the end
    Index(i64),

    /// Every array element or object property value, order preserved
    Wildcard,

    /// Expand each working node to the pre-order sequence of itself and all
    /// nodes reachable through object-property or array-element edges. The
    /// *following* segment is then matched against every node in that
    /// expansion.
    RecursiveDescent,

    /// Attribute from object metadata, yielded as a string scalar
    Attribute(String),

    /// Filter an array's elements by a boolean sub-expression, evaluated
    /// per element through the [`PredicateHost`] callback
    Predicate(Expr),
}

/// Narrow callback through which the Navigator evaluates predicate
/// sub-expressions.
///
/// Predicate evaluation needs the interpreter (scope chain, operators,
/// function calls), and the interpreter needs the Navigator; this trait
/// breaks the cycle at its one genuine touch point.
pub trait PredicateHost {
    fn eval_predicate(&self, condition: &Expr, element: &Node) -> Result<bool, EvalError>;
}

/// Resolve `path` against `root`, returning every match in document order.
///
/// The result is multi-valued by design: wildcards and recursive descent
/// match zero, one, or many nodes. Callers decide how to collapse.
pub fn navigate(
    root: &Node,
    path: &[PathSegment],
    host: &dyn PredicateHost,
) -> Result<Vec<Node>, EvalError> {
    let mut working = vec![root.clone()];

    for segment in path {
        let mut next = Vec::new();

        match segment {
            PathSegment::Property(name) => {
                for node in &working {
                    if let Node::Object(obj) = node
                        && let Some(value) = obj.get(name)
                    {
                        next.push(value.clone());
                    }
                }
            }
            PathSegment::Index(index) => {
                for node in &working {
                    if let Node::Array(elements) = node
                        && let Some(value) = element_at(elements, *index)
                    {
                        next.push(value.clone());
                    }
                }
            }
            PathSegment::Wildcard => {
                for node in &working {
                    match node {
                        Node::Array(elements) => next.extend(elements.iter().cloned()),
                        Node::Object(obj) => {
                            next.extend(obj.entries.iter().map(|(_, v)| v.clone()));
                        }
                        _ => {}
                    }
                }
            }
            PathSegment::RecursiveDescent => {
                for node in &working {
                    collect_preorder(node, &mut next);
                }
            }
            PathSegment::Attribute(name) => {
                for node in &working {
                    if let Node::Object(obj) = node
                        && let Some(value) = obj.metadata.attribute(name)
                    {
                        next.push(Node::String(value.to_string()));
                    }
                }
            }
            PathSegment::Predicate(condition) => {
                for node in &working {
                    if let Node::Array(elements) = node {
                        for element in elements {
                            if host.eval_predicate(condition, element)? {
                                next.push(element.clone());
                            }
                        }
                    }
                }
            }
        }

        working = next;
    }

    Ok(working)
}

fn element_at(elements: &[Node], index: i64) -> Option<&Node> {
    if index >= 0 {
        elements.get(index as usize)
    } else {
        let back = index.unsigned_abs() as usize;
        if back > elements.len() {
            None
        } else {
            elements.get(elements.len() - back)
        }
    }
}

/// Pre-order walk: the node itself first, then its children left to right.
fn collect_preorder(node: &Node, out: &mut Vec<Node>) {
    out.push(node.clone());
    match node {
        Node::Object(obj) => {
            for (_, value) in &obj.entries {
                collect_preorder(value, out);
            }
        }
        Node::Array(elements) => {
            for element in elements {
                collect_preorder(element, out);
            }
        }
        _ => {}
    }
}
