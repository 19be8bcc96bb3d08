use std::fmt;

use crate::evaluator::EvalError;
use crate::udm::Node;

/// Failure raised by a registry function.
///
/// Arity and type failures are described registry-side without source
/// positions; the evaluator attaches the call site when it surfaces them.
/// `Eval` carries an interpreter error out of a lambda argument unchanged.
#[derive(Debug)]
pub enum RegistryError {
    Arity { expected: usize, got: usize },
    Type(String),
    Eval(Box<EvalError>),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Arity { expected, got } => {
                write!(f, "expected {} argument(s), got {}", expected, got)
            }
            RegistryError::Type(message) => write!(f, "{}", message),
            RegistryError::Eval(inner) => write!(f, "{}", inner),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<EvalError> for RegistryError {
    fn from(error: EvalError) -> Self {
        RegistryError::Eval(Box::new(error))
    }
}

/// An argument as seen from inside a registry function: either a plain
/// data node, or a callable wrapper around a lambda that re-enters the
/// interpreter when invoked.
pub enum Argument<'a> {
    Value(Node),
    Function(Box<dyn Fn(&[Node]) -> Result<Node, RegistryError> + 'a>),
}

impl Argument<'_> {
    pub fn into_value(self, what: &str) -> Result<Node, RegistryError> {
        match self {
            Argument::Value(node) => Ok(node),
            Argument::Function(_) => Err(RegistryError::Type(format!(
                "{} must be a value, got a function",
                what
            ))),
        }
    }

    pub fn as_function(
        &self,
        what: &str,
    ) -> Result<&(dyn Fn(&[Node]) -> Result<Node, RegistryError> + '_), RegistryError> {
        match self {
            Argument::Function(f) => Ok(f.as_ref()),
            Argument::Value(node) => Err(RegistryError::Type(format!(
                "{} must be a function, got {}",
                what,
                node.type_name()
            ))),
        }
    }
}

/// A named function callable from a script.
pub trait Callable: Send + Sync {
    fn call(&self, args: Vec<Argument<'_>>) -> Result<Node, RegistryError>;
}

/// Name-to-function lookup consulted after scope resolution fails.
///
/// Implementations are shared across evaluations; `lookup` takes `&self`
/// and must be safe to call from multiple threads.
pub trait FunctionRegistry: Send + Sync {
    fn lookup(&self, name: &str) -> Option<&dyn Callable>;
}
