use std::cell::RefCell;
use std::fmt;

use rust_decimal::{prelude::FromPrimitive, prelude::ToPrimitive, Decimal};

use crate::ast::{BinOp, DescendKey, Expr, Position, Program, Statement, UnOp};
use crate::env::{Environment, ScopeId};
use crate::registry::{Argument, FunctionRegistry, RegistryError};
use crate::udm::{navigate, Node, ObjectNode, PathSegment, PredicateHost};

/// Errors that can occur during evaluation.
///
/// Every variant carries the source position of the offending node. All are
/// terminal for the current evaluation: nothing is retried or swallowed, and
/// no other error type crosses the evaluator's boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Name not found anywhere in the scope chain
    UndefinedVariable { name: String, pos: Position },

    /// Call target known to neither the environment nor the registry
    UndefinedFunction { name: String, pos: Position },

    /// Wrong operand or argument shape
    TypeError { message: String, pos: Position },

    /// Wrong argument count for a closure or registry function
    ArityError {
        expected: usize,
        got: usize,
        pos: Position,
    },

    /// Failure inside a `[...]` predicate. Plain absent-path navigation is
    /// lenient; predicate evaluation is not.
    NavigationError { message: String, pos: Position },
}

impl EvalError {
    pub fn position(&self) -> Position {
        match self {
            EvalError::UndefinedVariable { pos, .. }
            | EvalError::UndefinedFunction { pos, .. }
            | EvalError::TypeError { pos, .. }
            | EvalError::ArityError { pos, .. }
            | EvalError::NavigationError { pos, .. } => *pos,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UndefinedVariable { name, pos } => {
                write!(f, "Undefined variable at {}: '{}' is not in scope", pos, name)
            }
            EvalError::UndefinedFunction { name, pos } => {
                write!(f, "Undefined function at {}: '{}'", pos, name)
            }
            EvalError::TypeError { message, pos } => {
                write!(f, "Type error at {}: {}", pos, message)
            }
            EvalError::ArityError { expected, got, pos } => {
                write!(
                    f,
                    "Arity error at {}: expected {} argument(s), got {}",
                    pos, expected, got
                )
            }
            EvalError::NavigationError { message, pos } => {
                write!(f, "Navigation error at {}: {}", pos, message)
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// A lambda paired with the scope active at its definition site.
///
/// Free identifiers in the body resolve in the defining scope, not the
/// calling scope.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionValue {
    pub params: Vec<String>,
    pub body: Expr,
    pub scope: ScopeId,
}

/// A value flowing through evaluation: a UDM node, or a first-class
/// function (so lambdas can be passed to registry functions like `map`
/// without being applied).
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeValue {
    Node(Node),
    Function(FunctionValue),
}

/// The tree-walking interpreter.
///
/// One evaluator evaluates one program at a time; the compiled program and
/// the registry are shared read-only, the environment arena is owned here.
/// Run concurrent transformations on separate evaluators.
pub struct Evaluator<'r> {
    registry: &'r dyn FunctionRegistry,
    env: RefCell<Environment>,
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r dyn FunctionRegistry) -> Self {
        Evaluator {
            registry,
            env: RefCell::new(Environment::new()),
        }
    }

    /// Execute a compiled program against an input document.
    ///
    /// Binds the input as `input` in the root scope, binds top-level
    /// function definitions as closures, then evaluates the body.
    pub fn execute(&self, program: &Program, input: Node) -> Result<Node, EvalError> {
        let root = self.fresh_root(input);

        for statement in &program.statements {
            match statement {
                Statement::FunctionDef {
                    name, params, body, ..
                } => {
                    let function = FunctionValue {
                        params: params.clone(),
                        body: body.clone(),
                        scope: root,
                    };
                    self.env
                        .borrow_mut()
                        .bind(root, name.clone(), RuntimeValue::Function(function));
                }
                Statement::Match { pos, .. } | Statement::TryCatch { pos, .. } => {
                    return Err(EvalError::TypeError {
                        message: "statement form is not yet executable".to_string(),
                        pos: *pos,
                    });
                }
            }
        }

        let result = self.eval(&program.body, root)?;
        self.into_node(result, pos_of(&program.body))
    }

    /// Evaluate a standalone expression against an input document.
    ///
    /// Convenience for embedding and tests; the expression sees the same
    /// root scope `execute` would build, minus function definitions.
    pub fn eval_expression(&self, expr: &Expr, input: Node) -> Result<Node, EvalError> {
        let root = self.fresh_root(input);
        let result = self.eval(expr, root)?;
        self.into_node(result, pos_of(expr))
    }

    fn fresh_root(&self, input: Node) -> ScopeId {
        let mut env = self.env.borrow_mut();
        *env = Environment::new();
        env.root(vec![("input".to_string(), RuntimeValue::Node(input))])
    }

    pub fn eval(&self, expr: &Expr, scope: ScopeId) -> Result<RuntimeValue, EvalError> {
        match expr {
            Expr::Integer(n) => Ok(RuntimeValue::Node(Node::Integer(*n))),
            Expr::Float(n) => Ok(RuntimeValue::Node(Node::Float(*n))),
            Expr::String(s) => Ok(RuntimeValue::Node(Node::String(s.clone()))),
            Expr::Boolean(b) => Ok(RuntimeValue::Node(Node::Boolean(*b))),
            Expr::Null => Ok(RuntimeValue::Node(Node::Null)),

            Expr::Identifier { name, pos } => self
                .env
                .borrow()
                .lookup(scope, name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedVariable {
                    name: name.clone(),
                    pos: *pos,
                }),

            Expr::Object(properties) => {
                let mut object = ObjectNode::default();
                for property in properties {
                    let value = self.eval_node(&property.value, scope)?;
                    if property.is_attribute {
                        let coerced = value.coerce_string().ok_or_else(|| EvalError::TypeError {
                            message: format!(
                                "attribute '{}' must be a scalar, got {}",
                                property.key,
                                value.type_name()
                            ),
                            pos: pos_of(&property.value),
                        })?;
                        object.metadata.attributes.push((property.key.clone(), coerced));
                    } else {
                        object.entries.push((property.key.clone(), value));
                    }
                }
                Ok(RuntimeValue::Node(Node::Object(object)))
            }

            Expr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_node(element, scope)?);
                }
                Ok(RuntimeValue::Node(Node::Array(values)))
            }

            // Navigation folds the whole postfix chain into one path so a
            // multi-valued segment feeds every match to the segments after
            // it. `input.users.*.name` resolves each user's name, not a
            // property of the collected array.
            Expr::Member { .. }
            | Expr::Index { .. }
            | Expr::Attribute { .. }
            | Expr::Wildcard { .. }
            | Expr::Descend { .. }
            | Expr::Predicate { .. } => self.eval_navigation(expr, scope),

            Expr::Call { name, args, pos } => self.eval_call(name, args, None, *pos, scope),

            Expr::Lambda { params, body } => Ok(RuntimeValue::Function(FunctionValue {
                params: params.clone(),
                body: (**body).clone(),
                scope,
            })),

            Expr::Let {
                name, value, body, ..
            } => {
                let bound = self.eval(value, scope)?;
                let child = self
                    .env
                    .borrow_mut()
                    .child(scope, vec![(name.clone(), bound)]);
                self.eval(body, child)
            }

            Expr::If {
                condition,
                then_branch,
                else_ifs,
                else_branch,
                pos,
            } => {
                if self.eval_condition(condition, scope, *pos)? {
                    return self.eval(then_branch, scope);
                }
                for (cond, branch) in else_ifs {
                    if self.eval_condition(cond, scope, *pos)? {
                        return self.eval(branch, scope);
                    }
                }
                self.eval(else_branch, scope)
            }

            Expr::Binary {
                op, left, right, pos,
            } => match op {
                // && and || short-circuit; operands must be booleans.
                BinOp::And => {
                    if !self.eval_boolean_operand(left, scope, *pos, "&&")? {
                        return Ok(RuntimeValue::Node(Node::Boolean(false)));
                    }
                    let rhs = self.eval_boolean_operand(right, scope, *pos, "&&")?;
                    Ok(RuntimeValue::Node(Node::Boolean(rhs)))
                }
                BinOp::Or => {
                    if self.eval_boolean_operand(left, scope, *pos, "||")? {
                        return Ok(RuntimeValue::Node(Node::Boolean(true)));
                    }
                    let rhs = self.eval_boolean_operand(right, scope, *pos, "||")?;
                    Ok(RuntimeValue::Node(Node::Boolean(rhs)))
                }
                _ => {
                    let left = self.eval_node(left, scope)?;
                    let right = self.eval_node(right, scope)?;
                    self.apply_binop(*op, &left, &right, *pos)
                        .map(RuntimeValue::Node)
                }
            },

            Expr::Unary { op, operand, pos } => {
                let value = self.eval_node(operand, scope)?;
                self.apply_unop(*op, &value, *pos).map(RuntimeValue::Node)
            }

            Expr::Pipe { source, target } => {
                let value = self.eval_node(source, scope)?;
                self.apply_piped(value, target, scope)
                    .map(RuntimeValue::Node)
            }
        }
    }

    fn eval_node(&self, expr: &Expr, scope: ScopeId) -> Result<Node, EvalError> {
        let value = self.eval(expr, scope)?;
        self.into_node(value, pos_of(expr))
    }

    fn into_node(&self, value: RuntimeValue, pos: Position) -> Result<Node, EvalError> {
        match value {
            RuntimeValue::Node(node) => Ok(node),
            RuntimeValue::Function(_) => Err(EvalError::TypeError {
                message: "a function value cannot be used as data here".to_string(),
                pos,
            }),
        }
    }

    fn eval_condition(
        &self,
        condition: &Expr,
        scope: ScopeId,
        pos: Position,
    ) -> Result<bool, EvalError> {
        match self.eval_node(condition, scope)? {
            Node::Boolean(b) => Ok(b),
            other => Err(EvalError::TypeError {
                message: format!("if condition must be a boolean, got {}", other.type_name()),
                pos,
            }),
        }
    }

    fn eval_boolean_operand(
        &self,
        operand: &Expr,
        scope: ScopeId,
        pos: Position,
        op: &str,
    ) -> Result<bool, EvalError> {
        match self.eval_node(operand, scope)? {
            Node::Boolean(b) => Ok(b),
            other => Err(EvalError::TypeError {
                message: format!("'{}' requires boolean operands, got {}", op, other.type_name()),
                pos,
            }),
        }
    }

    /// Evaluate a postfix navigation chain as a single path.
    ///
    /// Walks down through consecutive navigation expressions to the base,
    /// evaluates the base once, then resolves all segments in one
    /// [`navigate`] call. The collapse policy applies to the chain as a
    /// whole: a chain containing any multi-valued segment (wildcard,
    /// recursive descent, predicate) yields an array of all matches, while
    /// an all-single chain yields the first match or `Null`.
    fn eval_navigation(&self, expr: &Expr, scope: ScopeId) -> Result<RuntimeValue, EvalError> {
        let mut segments = Vec::new();
        let mut multi = false;
        let mut current = expr;

        loop {
            match current {
                Expr::Member { target, name, .. } => {
                    segments.push(PathSegment::Property(name.clone()));
                    current = target;
                }
                Expr::Index { target, index, .. } => {
                    segments.push(PathSegment::Index(*index));
                    current = target;
                }
                Expr::Attribute { target, name, .. } => {
                    segments.push(PathSegment::Attribute(name.clone()));
                    current = target;
                }
                Expr::Wildcard { target, .. } => {
                    segments.push(PathSegment::Wildcard);
                    multi = true;
                    current = target;
                }
                Expr::Descend { target, key, .. } => {
                    // Two segments, pushed innermost-last so the reversal
                    // below restores descend-then-match order.
                    segments.push(match key {
                        DescendKey::Name(name) => PathSegment::Property(name.clone()),
                        DescendKey::Wildcard => PathSegment::Wildcard,
                    });
                    segments.push(PathSegment::RecursiveDescent);
                    multi = true;
                    current = target;
                }
                Expr::Predicate {
                    target, condition, ..
                } => {
                    segments.push(PathSegment::Predicate((**condition).clone()));
                    multi = true;
                    current = target;
                }
                _ => break,
            }
        }
        segments.reverse();

        let base = self.eval_node(current, scope)?;
        let matches = self.navigate_from(&base, &segments, scope, pos_of(expr))?;
        if multi {
            Ok(RuntimeValue::Node(Node::Array(matches)))
        } else {
            Ok(RuntimeValue::Node(first_or_null(matches)))
        }
    }

    fn navigate_from(
        &self,
        target: &Node,
        path: &[PathSegment],
        scope: ScopeId,
        pos: Position,
    ) -> Result<Vec<Node>, EvalError> {
        let host = NavHost {
            evaluator: self,
            scope,
            pos,
        };
        navigate(target, path, &host)
    }

    /// Dispatch a call: a closure bound in scope wins, otherwise the
    /// registry, otherwise `UndefinedFunction`. A piped value, when present,
    /// is prepended as argument 0.
    fn eval_call(
        &self,
        name: &str,
        args: &[Expr],
        piped: Option<Node>,
        pos: Position,
        scope: ScopeId,
    ) -> Result<RuntimeValue, EvalError> {
        let closure = {
            let env = self.env.borrow();
            match env.lookup(scope, name) {
                Some(RuntimeValue::Function(f)) => Some(f.clone()),
                _ => None,
            }
        };

        if let Some(function) = closure {
            let mut values = Vec::with_capacity(args.len() + 1);
            if let Some(value) = piped {
                values.push(RuntimeValue::Node(value));
            }
            for arg in args {
                values.push(self.eval(arg, scope)?);
            }
            return self.call_function(&function, values, pos);
        }

        let Some(callable) = self.registry.lookup(name) else {
            return Err(EvalError::UndefinedFunction {
                name: name.to_string(),
                pos,
            });
        };

        let mut registry_args: Vec<Argument<'_>> = Vec::with_capacity(args.len() + 1);
        if let Some(value) = piped {
            registry_args.push(Argument::Value(value));
        }
        for arg in args {
            match self.eval(arg, scope)? {
                RuntimeValue::Node(node) => registry_args.push(Argument::Value(node)),
                // Lambdas cross the registry boundary as wrappers that
                // re-enter the interpreter.
                RuntimeValue::Function(function) => {
                    registry_args.push(Argument::Function(Box::new(move |values: &[Node]| {
                        let values = values
                            .iter()
                            .cloned()
                            .map(RuntimeValue::Node)
                            .collect::<Vec<_>>();
                        self.call_function(&function, values, pos)
                            .and_then(|result| self.into_node(result, pos))
                            .map_err(|e| RegistryError::Eval(Box::new(e)))
                    })));
                }
            }
        }

        match callable.call(registry_args) {
            Ok(node) => Ok(RuntimeValue::Node(node)),
            Err(error) => Err(self.unwrap_registry_error(error, name, pos)),
        }
    }

    /// Invoke a closure: arity check, child frame over the defining scope,
    /// body evaluation.
    fn call_function(
        &self,
        function: &FunctionValue,
        args: Vec<RuntimeValue>,
        call_pos: Position,
    ) -> Result<RuntimeValue, EvalError> {
        if args.len() != function.params.len() {
            return Err(EvalError::ArityError {
                expected: function.params.len(),
                got: args.len(),
                pos: call_pos,
            });
        }
        let bindings = function.params.iter().cloned().zip(args).collect();
        let scope = self.env.borrow_mut().child(function.scope, bindings);
        self.eval(&function.body, scope)
    }

    /// Translate a registry failure into the evaluator's taxonomy at the
    /// call boundary; an error that originated here is re-raised as itself.
    fn unwrap_registry_error(&self, error: RegistryError, name: &str, pos: Position) -> EvalError {
        match error {
            RegistryError::Arity { expected, got } => EvalError::ArityError { expected, got, pos },
            RegistryError::Type(message) => EvalError::TypeError {
                message: format!("{}: {}", name, message),
                pos,
            },
            RegistryError::Eval(inner) => *inner,
        }
    }

    /// Thread a piped value into a target stage. Nested Pipe targets are
    /// re-threaded so data flows strictly left to right, whatever shape the
    /// grammar gave the tree.
    fn apply_piped(&self, value: Node, target: &Expr, scope: ScopeId) -> Result<Node, EvalError> {
        match target {
            Expr::Pipe {
                source,
                target: rest,
            } => {
                let mid = self.apply_piped(value, source, scope)?;
                self.apply_piped(mid, rest, scope)
            }
            Expr::Call { name, args, pos } => {
                let result = self.eval_call(name, args, Some(value), *pos, scope)?;
                self.into_node(result, *pos)
            }
            Expr::Identifier { name, pos } => {
                let result = self.eval_call(name, &[], Some(value), *pos, scope)?;
                self.into_node(result, *pos)
            }
            Expr::Lambda { .. } => {
                let pos = pos_of(target);
                let RuntimeValue::Function(function) = self.eval(target, scope)? else {
                    unreachable!("lambda literals evaluate to functions");
                };
                let result =
                    self.call_function(&function, vec![RuntimeValue::Node(value)], pos)?;
                self.into_node(result, pos)
            }
            other => Err(EvalError::TypeError {
                message: "pipe target must be a function call, function name, or lambda"
                    .to_string(),
                pos: pos_of(other),
            }),
        }
    }

    fn apply_binop(
        &self,
        op: BinOp,
        left: &Node,
        right: &Node,
        pos: Position,
    ) -> Result<Node, EvalError> {
        let type_error = |message: String| EvalError::TypeError { message, pos };

        match op {
            BinOp::Add => match (left, right) {
                (Node::Integer(a), Node::Integer(b)) => a
                    .checked_add(*b)
                    .map(Node::Integer)
                    .ok_or_else(|| type_error("integer overflow in '+'".to_string())),
                (Node::Float(a), Node::Float(b)) => Ok(Node::Float(a + b)),
                (Node::Integer(_), Node::Float(_)) | (Node::Float(_), Node::Integer(_)) => {
                    Ok(mixed_arith(op, left, right))
                }
                (Node::String(a), Node::String(b)) => Ok(Node::String(format!("{}{}", a, b))),
                (a, b) => Err(type_error(format!(
                    "Cannot add {} and {}",
                    a.type_name(),
                    b.type_name()
                ))),
            },
            BinOp::Subtract | BinOp::Multiply => match (left, right) {
                (Node::Integer(a), Node::Integer(b)) => {
                    let result = if op == BinOp::Subtract {
                        a.checked_sub(*b)
                    } else {
                        a.checked_mul(*b)
                    };
                    result
                        .map(Node::Integer)
                        .ok_or_else(|| type_error(format!("integer overflow in '{}'", op)))
                }
                (Node::Float(a), Node::Float(b)) => Ok(Node::Float(if op == BinOp::Subtract {
                    a - b
                } else {
                    a * b
                })),
                (Node::Integer(_), Node::Float(_)) | (Node::Float(_), Node::Integer(_)) => {
                    Ok(mixed_arith(op, left, right))
                }
                (a, b) => Err(type_error(format!(
                    "Cannot apply '{}' to {} and {}",
                    op,
                    a.type_name(),
                    b.type_name()
                ))),
            },
            BinOp::Divide => match (left, right) {
                (Node::Integer(_), Node::Integer(0)) => {
                    Err(type_error("division by zero".to_string()))
                }
                (Node::Integer(a), Node::Integer(b)) => {
                    // Exact division stays an integer. checked_rem is None
                    // only for i64::MIN / -1 here, the zero divisor having
                    // matched above.
                    match a.checked_rem(*b) {
                        Some(0) => a
                            .checked_div(*b)
                            .map(Node::Integer)
                            .ok_or_else(|| type_error("integer overflow in '/'".to_string())),
                        Some(_) => Ok(Node::Float(*a as f64 / *b as f64)),
                        None => Err(type_error("integer overflow in '/'".to_string())),
                    }
                }
                (Node::Float(a), Node::Float(b)) => Ok(Node::Float(a / b)),
                (Node::Integer(_), Node::Float(_)) | (Node::Float(_), Node::Integer(_)) => {
                    Ok(mixed_arith(op, left, right))
                }
                (a, b) => Err(type_error(format!(
                    "Cannot divide {} by {}",
                    a.type_name(),
                    b.type_name()
                ))),
            },
            BinOp::Modulo => match (left, right) {
                (Node::Integer(_), Node::Integer(0)) => {
                    Err(type_error("modulo by zero".to_string()))
                }
                (Node::Integer(a), Node::Integer(b)) => a
                    .checked_rem(*b)
                    .map(Node::Integer)
                    .ok_or_else(|| type_error("integer overflow in '%'".to_string())),
                (Node::Float(a), Node::Float(b)) => Ok(Node::Float(a % b)),
                (Node::Integer(_), Node::Float(_)) | (Node::Float(_), Node::Integer(_)) => {
                    Ok(mixed_arith(op, left, right))
                }
                (a, b) => Err(type_error(format!(
                    "Cannot compute modulo of {} by {}",
                    a.type_name(),
                    b.type_name()
                ))),
            },

            // Equality is structural deep comparison; objects compare their
            // ordered entries in order.
            BinOp::Equal => Ok(Node::Boolean(nodes_equal(left, right))),
            BinOp::NotEqual => Ok(Node::Boolean(!nodes_equal(left, right))),

            BinOp::LessThan | BinOp::GreaterThan | BinOp::LessEqual | BinOp::GreaterEqual => {
                let ordering = match (left, right) {
                    (Node::String(a), Node::String(b)) => a.cmp(b),
                    _ => match (left.as_float(), right.as_float()) {
                        (Some(a), Some(b)) => {
                            a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
                        }
                        _ => {
                            return Err(type_error(format!(
                                "Cannot compare {} {} {} (comparison requires numbers or strings)",
                                left.type_name(),
                                op,
                                right.type_name()
                            )))
                        }
                    },
                };
                let result = match op {
                    BinOp::LessThan => ordering.is_lt(),
                    BinOp::GreaterThan => ordering.is_gt(),
                    BinOp::LessEqual => ordering.is_le(),
                    BinOp::GreaterEqual => ordering.is_ge(),
                    _ => unreachable!(),
                };
                Ok(Node::Boolean(result))
            }

            BinOp::And | BinOp::Or => unreachable!("short-circuited in eval"),
        }
    }

    fn apply_unop(&self, op: UnOp, value: &Node, pos: Position) -> Result<Node, EvalError> {
        match (op, value) {
            (UnOp::Not, Node::Boolean(b)) => Ok(Node::Boolean(!b)),
            (UnOp::Negate, Node::Integer(n)) => {
                n.checked_neg()
                    .map(Node::Integer)
                    .ok_or_else(|| EvalError::TypeError {
                        message: "integer overflow in unary '-'".to_string(),
                        pos,
                    })
            }
            (UnOp::Negate, Node::Float(n)) => Ok(Node::Float(-n)),
            (UnOp::Plus, Node::Integer(_)) | (UnOp::Plus, Node::Float(_)) => Ok(value.clone()),
            (op, value) => Err(EvalError::TypeError {
                message: format!("Cannot apply unary '{}' to {}", op, value.type_name()),
                pos,
            }),
        }
    }
}

/// Predicate callback handed to the Navigator.
///
/// Builds a child scope per element: the element's properties as bare
/// names, the element itself as `item`, the enclosing lexical scope behind
/// both. Any failure surfaces as `NavigationError`.
struct NavHost<'a, 'r> {
    evaluator: &'a Evaluator<'r>,
    scope: ScopeId,
    pos: Position,
}

impl PredicateHost for NavHost<'_, '_> {
    fn eval_predicate(&self, condition: &Expr, element: &Node) -> Result<bool, EvalError> {
        let mut bindings = vec![("item".to_string(), RuntimeValue::Node(element.clone()))];
        if let Node::Object(obj) = element {
            for (key, value) in &obj.entries {
                bindings.push((key.clone(), RuntimeValue::Node(value.clone())));
            }
        }
        let scope = self.evaluator.env.borrow_mut().child(self.scope, bindings);

        match self.evaluator.eval(condition, scope) {
            Ok(RuntimeValue::Node(Node::Boolean(b))) => Ok(b),
            Ok(RuntimeValue::Node(other)) => Err(EvalError::NavigationError {
                message: format!(
                    "predicate must evaluate to a boolean, got {}",
                    other.type_name()
                ),
                pos: self.pos,
            }),
            Ok(RuntimeValue::Function(_)) => Err(EvalError::NavigationError {
                message: "predicate must evaluate to a boolean, got a function".to_string(),
                pos: self.pos,
            }),
            Err(error @ EvalError::NavigationError { .. }) => Err(error),
            Err(error) => Err(EvalError::NavigationError {
                message: format!("predicate evaluation failed: {}", error),
                pos: error.position(),
            }),
        }
    }
}

fn pos_of(expr: &Expr) -> Position {
    expr.position().unwrap_or(Position::new(1, 1))
}

fn first_or_null(mut matches: Vec<Node>) -> Node {
    if matches.is_empty() {
        Node::Null
    } else {
        matches.swap_remove(0)
    }
}

/// Structural equality, with integers and floats comparing by numeric value.
fn nodes_equal(left: &Node, right: &Node) -> bool {
    match (left, right) {
        (Node::Integer(a), Node::Float(b)) | (Node::Float(b), Node::Integer(a)) => {
            *a as f64 == *b
        }
        (Node::Array(a), Node::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| nodes_equal(x, y))
        }
        (Node::Object(a), Node::Object(b)) => {
            a.metadata == b.metadata
                && a.entries.len() == b.entries.len()
                && a.entries
                    .iter()
                    .zip(&b.entries)
                    .all(|((ka, va), (kb, vb))| ka == kb && nodes_equal(va, vb))
        }
        _ => left == right,
    }
}

/// Mixed integer/float arithmetic through `Decimal`, preserving the integer
/// type whenever the exact result is whole. Falls back to f64 when a value
/// is out of Decimal range or the divisor is zero.
fn mixed_arith(op: BinOp, left: &Node, right: &Node) -> Node {
    let (af, bf) = match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => (a, b),
        _ => unreachable!("mixed_arith called with non-numeric operands"),
    };

    let decimal_of = |node: &Node| match node {
        Node::Integer(n) => Decimal::from_i64(*n),
        Node::Float(n) => Decimal::from_f64(*n),
        _ => None,
    };

    if let Some(ad) = decimal_of(left)
        && let Some(bd) = decimal_of(right)
        && !(matches!(op, BinOp::Divide | BinOp::Modulo) && bd == Decimal::ZERO)
    {
        let rd = match op {
            BinOp::Add => ad + bd,
            BinOp::Subtract => ad - bd,
            BinOp::Multiply => ad * bd,
            BinOp::Divide => ad / bd,
            BinOp::Modulo => ad % bd,
            _ => unreachable!("mixed_arith called with non-arithmetic operator"),
        };
        if rd.is_integer()
            && let Some(r) = rd.to_i64()
        {
            return Node::Integer(r);
        }
        if let Some(r) = rd.to_f64() {
            return Node::Float(r);
        }
    }

    let result = match op {
        BinOp::Add => af + bf,
        BinOp::Subtract => af - bf,
        BinOp::Multiply => af * bf,
        BinOp::Divide => af / bf,
        BinOp::Modulo => af % bf,
        _ => unreachable!(),
    };
    Node::Float(result)
}
