//! # Expression Language - Abstract Syntax Tree
//!
//! This module defines the tokens and the Abstract Syntax Tree (AST) of the
//! expression language: a small, dynamically typed grammar for arithmetic,
//! relational and logical operators, property and method access, collection
//! literals and lambdas, embedded in literal text.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Token catalog produced by the lexer
//! - **[operators]** - Binary and unary operators
//! - **[expressions]** - Expression nodes (literals, access, calls, operations, lambdas)
//! - **[template]** - Literal text interleaved with `${...}` / `#{...}` expressions
//!
//! ## Quick Start
//!
//! ```text
//! Total: ${order.items.size() > 0 ? order.total * 1.2 : 0}
//! ```
//!
//! ## Core Concepts
//!
//! ### Dual spellings
//!
//! Relational and logical operators accept a symbolic and a word spelling:
//!
//! | symbol | word  |
//! |--------|-------|
//! | `>`    | `gt`  |
//! | `<`    | `lt`  |
//! | `>=`   | `ge`  |
//! | `<=`   | `le`  |
//! | `==`   | `eq`  |
//! | `!=`   | `ne`  |
//! | `!`    | `not` |
//! | `&&`   | `and` |
//! | `\|\|` | `or`  |
//! | `/`    | `div` |
//! | `%`    | `mod` |
//!
//! The lexer emits distinct tokens; the parser maps both to one [`BinOp`].
//!
//! ### Set or map?
//!
//! `{}` is both the empty set and the empty map. The parser always produces
//! an empty [`Expr::Set`]; the coercion engine turns an empty set into an
//! empty map when a map is requested.
//!
//! ## Examples
//!
//! ```text
//! ${a + b}                      // dynamic expression
//! #{bean.price gt 100}          // deferred expression
//! ${[1, 2, 3]}                  // list
//! ${{'k': 'v'}}                 // map
//! ${((x, y) -> x * y)(6, 7)}    // immediately invoked lambda
//! ${fn:length(items)}           // qualified function
//! ```
pub mod expressions;
pub mod operators;
pub mod template;
pub mod tokens;

pub use expressions::Expr;
pub use operators::{BinOp, UnaryOp};
pub use template::{EvalMode, Template, TemplatePart};
pub use tokens::{Position, Token, TokenKind};
