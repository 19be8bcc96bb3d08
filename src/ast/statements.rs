use crate::ast::{Expr, Position};

/// Top-level statement preceding the script's final expression.
///
/// Only `FunctionDef` is currently produced by the parser; the remaining
/// variants reserve tree shape for planned syntax so downstream consumers
/// can match exhaustively today.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Named function definition
    ///
    /// # Example
    /// ```text
    /// function discount(price, pct) = price * (1 - pct)
    /// ```
    ///
    /// Bound as a closure in the root environment before the body runs.
    FunctionDef {
        name: String,
        params: Vec<String>,
        body: Expr,
        pos: Position,
    },

    /// Pattern match statement. Not yet produced by the parser.
    Match {
        scrutinee: Expr,
        arms: Vec<(Expr, Expr)>,
        pos: Position,
    },

    /// Try/catch statement. Not yet produced by the parser.
    TryCatch {
        body: Expr,
        handler: Expr,
        pos: Position,
    },
}
