use crate::ast::{BinOp, Position, UnOp};

/// One property of an object literal.
///
/// A key spelled `@name` (bare or quoted) marks the property as an attribute;
/// the distinction is resolved at evaluation time, when attribute properties
/// route into the object's metadata instead of its entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Key with any leading `@` already stripped
    pub key: String,
    pub value: Expr,
    pub is_attribute: bool,
}

/// The name matched by the segment following a recursive descent.
#[derive(Debug, Clone, PartialEq)]
pub enum DescendKey {
    /// `..name` - every descendant property with this name
    Name(String),
    /// `..*` - every descendant node
    Wildcard,
}

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Nodes are immutable after construction and own their children
/// exclusively; a compiled tree is safe to share across concurrent
/// evaluations.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// Literal integer
    Integer(i64),

    /// Literal floating point number
    Float(f64),

    /// String literal
    String(String),

    /// Boolean literal
    Boolean(bool),

    /// Null literal
    Null,

    /// Name lookup in the environment chain
    ///
    /// The input document is an ordinary identifier (`input`), bound by the
    /// evaluator in the root scope.
    Identifier { name: String, pos: Position },

    // Literals with structure
    /// Object literal with ordered properties
    ///
    /// # Example
    /// ```text
    /// {@id: "5", name: input.customer.name}
    /// ```
    Object(Vec<Property>),

    /// Array literal
    Array(Vec<Expr>),

    // Navigation
    /// Member access (`target.name`)
    Member {
        target: Box<Expr>,
        name: String,
        pos: Position,
    },

    /// Index access (`target[0]`, `target[-1]`)
    ///
    /// Only integer literals (optionally negated) parse to an index; any
    /// other bracketed expression is a [`Expr::Predicate`].
    Index {
        target: Box<Expr>,
        index: i64,
        pos: Position,
    },

    /// Attribute access (`target.@name` or `target@name`)
    Attribute {
        target: Box<Expr>,
        name: String,
        pos: Position,
    },

    /// Wildcard access (`target.*` or `target[*]`)
    ///
    /// Selects every array element or every object property value.
    Wildcard { target: Box<Expr>, pos: Position },

    /// Recursive descent (`target..name`, `target..*`)
    ///
    /// Matches the key against every node reachable from the target,
    /// pre-order, including the target itself.
    Descend {
        target: Box<Expr>,
        key: DescendKey,
        pos: Position,
    },

    /// Predicate filter (`target[condition]`)
    ///
    /// Keeps array elements for which the condition evaluates to true. The
    /// element's properties are in scope as bare names; the element itself
    /// is bound as `item`.
    Predicate {
        target: Box<Expr>,
        condition: Box<Expr>,
        pos: Position,
    },

    // Functions
    /// Function call by name
    ///
    /// Resolves to a closure in scope first, then to the function registry.
    Call {
        name: String,
        args: Vec<Expr>,
        pos: Position,
    },

    /// Lambda literal (`x => expr` or `(a, b) => expr`)
    Lambda { params: Vec<String>, body: Box<Expr> },

    // Binding and control
    /// One link of a `let` chain
    ///
    /// `let x = e1, let y = e2, final` nests right:
    /// `Let(x, e1, Let(y, e2, final))`. The nesting is scope: each binding
    /// is visible only to the remainder of its own chain.
    Let {
        name: String,
        value: Box<Expr>,
        body: Box<Expr>,
        pos: Position,
    },

    /// Conditional expression; `else` is mandatory so the form is total
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_ifs: Vec<(Expr, Expr)>,
        else_branch: Box<Expr>,
        pos: Position,
    },

    // Operations
    /// Binary operation (arithmetic, comparison, logical)
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        pos: Position,
    },

    /// Unary operation
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        pos: Position,
    },

    /// Pipeline (`source |> target`)
    ///
    /// The production is right-recursive (`a |> b |> c` parses as
    /// `Pipe(a, Pipe(b, c))`) but data flows strictly left to right at
    /// evaluation time; the evaluator re-threads nested pipe targets.
    Pipe {
        source: Box<Expr>,
        target: Box<Expr>,
    },
}

impl Expr {
    /// Position of the token this node started at, where one is recorded.
    ///
    /// Literal nodes carry no position; errors they participate in are
    /// reported at the nearest enclosing positioned node.
    pub fn position(&self) -> Option<Position> {
        match self {
            Expr::Identifier { pos, .. }
            | Expr::Member { pos, .. }
            | Expr::Index { pos, .. }
            | Expr::Attribute { pos, .. }
            | Expr::Wildcard { pos, .. }
            | Expr::Descend { pos, .. }
            | Expr::Predicate { pos, .. }
            | Expr::Call { pos, .. }
            | Expr::Let { pos, .. }
            | Expr::If { pos, .. }
            | Expr::Binary { pos, .. }
            | Expr::Unary { pos, .. } => Some(*pos),
            Expr::Pipe { source, .. } => source.position(),
            Expr::Lambda { body, .. } => body.position(),
            _ => None,
        }
    }
}
