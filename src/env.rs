//! Lexical environments as an arena of scope frames.
//!
//! Frames are referenced by [`ScopeId`] and carry a parent index, so a
//! closure capturing its defining scope stores one copyable id instead of an
//! owned chain. Frames are never popped mid-evaluation; the whole arena is
//! dropped when `execute` returns.

use crate::evaluator::RuntimeValue;

/// Index of a frame in the arena. Cheap to copy; closures store one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug)]
struct Frame {
    bindings: Vec<(String, RuntimeValue)>,
    parent: Option<ScopeId>,
}

/// The arena of scope frames for one evaluation.
#[derive(Debug, Default)]
pub struct Environment {
    frames: Vec<Frame>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    /// Create the root frame (no parent).
    pub fn root(&mut self, bindings: Vec<(String, RuntimeValue)>) -> ScopeId {
        self.push(bindings, None)
    }

    /// Create a child frame whose lookups fall through to `parent`.
    pub fn child(&mut self, parent: ScopeId, bindings: Vec<(String, RuntimeValue)>) -> ScopeId {
        self.push(bindings, Some(parent))
    }

    /// Add a binding to an existing frame.
    ///
    /// Used only while the root frame is being populated (input document,
    /// top-level function definitions); frames are not mutated once
    /// expression evaluation has started.
    pub fn bind(&mut self, scope: ScopeId, name: impl Into<String>, value: RuntimeValue) {
        self.frames[scope.0].bindings.push((name.into(), value));
    }

    /// Walk the chain from `scope` outward; within a frame, later bindings
    /// shadow earlier ones.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&RuntimeValue> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = &self.frames[id.0];
            if let Some((_, value)) = frame.bindings.iter().rev().find(|(n, _)| n == name) {
                return Some(value);
            }
            current = frame.parent;
        }
        None
    }

    fn push(&mut self, bindings: Vec<(String, RuntimeValue)>, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.frames.len());
        self.frames.push(Frame { bindings, parent });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::udm::Node;

    fn node(n: i64) -> RuntimeValue {
        RuntimeValue::Node(Node::Integer(n))
    }

    #[test]
    fn test_child_lookup_falls_through() {
        let mut env = Environment::new();
        let root = env.root(vec![("x".into(), node(1))]);
        let child = env.child(root, vec![("y".into(), node(2))]);

        assert_eq!(env.lookup(child, "x"), Some(&node(1)));
        assert_eq!(env.lookup(child, "y"), Some(&node(2)));
        assert_eq!(env.lookup(root, "y"), None);
    }

    #[test]
    fn test_shadowing() {
        let mut env = Environment::new();
        let root = env.root(vec![("x".into(), node(1))]);
        let child = env.child(root, vec![("x".into(), node(2))]);

        assert_eq!(env.lookup(child, "x"), Some(&node(2)));
        assert_eq!(env.lookup(root, "x"), Some(&node(1)));
    }

    #[test]
    fn test_sibling_scopes_isolated() {
        let mut env = Environment::new();
        let root = env.root(vec![]);
        let a = env.child(root, vec![("a".into(), node(1))]);
        let b = env.child(root, vec![("b".into(), node(2))]);

        assert_eq!(env.lookup(a, "b"), None);
        assert_eq!(env.lookup(b, "a"), None);
    }
}
