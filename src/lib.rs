//! Graft: a small expression language for transforming structured
//! documents.
//!
//! A script declares its input and output formats, then describes the
//! output document as a single expression over the input, bound as
//! `input`:
//!
//! ```text
//! %graft 1.0
//! input json
//! output json
//! ---
//! {
//!   names: input.users.*.name,
//!   active: count(input.users[active == true])
//! }
//! ```
//!
//! The pipeline is conventional: [`lexer`] and [`parser`] build the tree,
//! [`evaluator`] walks it over the format-independent document model in
//! [`udm`], and [`format`] moves documents in and out of JSON, YAML, and
//! CSV. Host applications extend the function library through
//! [`registry::FunctionRegistry`].

pub mod ast;
pub mod builtins;
pub mod env;
pub mod evaluator;
pub mod format;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod script;
pub mod udm;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{BinOp, Expr, Format, Header, Position, Program, Statement, Token, TokenKind, UnOp};
pub use builtins::Builtins;
pub use env::{Environment, ScopeId};
pub use evaluator::{EvalError, Evaluator, FunctionValue, RuntimeValue};
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, Parser};
pub use registry::{Argument, Callable, FunctionRegistry, RegistryError};
pub use script::{compile, compile_expression, CompileError};
pub use udm::{Metadata, Node, ObjectNode};
