pub mod adapter;
pub mod arithmetic;
pub mod ast;
pub mod cli;
pub mod coercion;
pub mod compare;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod types;
pub mod value;

pub use adapter::LambdaAdapter;
pub use ast::{BinOp, EvalMode, Expr, Position, Template, Token, TokenKind, UnaryOp};
pub use coercion::{
    coerce_to_boolean, coerce_to_character, coerce_to_enum, coerce_to_instant, coerce_to_number,
    coerce_to_string, coerce_to_type,
};
pub use compare::{compare, equals};
pub use context::{BoundContext, EvalContext};
pub use error::{EvalError, ParseError};
pub use evaluator::Evaluator;
pub use expression::Expression;
pub use lexer::{LexState, Lexer, tokenize};
pub use parser::Parser;
pub use resolver::{Resolver, ResolverChain, StandardResolver};
pub use types::{InterfaceType, MethodSignature, NumericKind, NumericType, ValueType};
pub use value::{Clock, EnumType, EnumValue, FixedClock, HostObject, LambdaValue, SystemClock, Value};
