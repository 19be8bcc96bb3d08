//! # Graft Transformation Language - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for the Graft
//! transformation language, an expression language that maps between
//! tree-shaped data formats through one universal data model.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer, with source positions
//! - **[expressions]** - Expression nodes (literals, navigation, lambdas, pipes)
//! - **[operators]** - Binary and unary operators
//! - **[statements]** - Top-level statements (function definitions)
//! - **[program]** - Complete compiled script with its format header
//!
//! ## Quick Start
//!
//! ```text
//! %graft 1.0
//! input json
//! output json
//! ---
//! {
//!   invoice: {
//!     @id: input.order.id,
//!     total: sum(input.order.items.*.price)
//!   }
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Navigation
//!
//! The input document is bound to the name `input`; dotted paths, wildcards,
//! recursive descent, predicates, and attribute access navigate it:
//!
//! ```text
//! input.order.items[0].price     // member + index
//! input.order.items.*.price      // wildcard
//! input..name                    // recursive descent
//! input.order.@id                // attribute
//! input.items[price > 100]       // predicate
//! ```
//!
//! ### Bindings and Lambdas
//!
//! `let` chains bind names for the remainder of the chain; lambdas are
//! first-class values with lexical closures:
//!
//! ```text
//! let rate = 1.1,
//! let scale = p => p * rate,
//! map(input.prices, scale)
//! ```
//!
//! ### Pipelines
//!
//! `|>` threads a value into the next call as its first argument:
//!
//! ```text
//! input.items |> filter(i => i.qty > 0) |> map(i => i.price) |> sum()
//! ```
pub mod tokens;
pub mod expressions;
pub mod operators;
pub mod statements;
pub mod program;

pub use tokens::{Position, Token, TokenKind};
pub use expressions::{DescendKey, Expr, Property};
pub use operators::{BinOp, UnOp};
pub use statements::Statement;
pub use program::{Format, Header, Program};
