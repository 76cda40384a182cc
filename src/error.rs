//! Error types for the expression engine
//!
//! Every fallible operation returns `Result<T, ParseError>` (lexing and
//! parsing) or `Result<T, EvalError>` (coercion, comparison, evaluation).
//! Nothing is recovered inside the engine; errors reach the caller as-is.

use thiserror::Error;

use crate::ast::Position;

/// Syntax errors raised by the lexer and the parser.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Syntax error at {position}: expected {expected}, found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: Position,
    },

    #[error("Syntax error at {position}: expected {expected}, found end of input")]
    UnexpectedEof { expected: String, position: Position },

    #[error("Syntax error at {position}: illegal character '{ch}'")]
    IllegalCharacter { ch: char, position: Position },

    #[error("Syntax error at {position}: unterminated string literal")]
    UnterminatedString { position: Position },

    #[error("Syntax error at {position}: invalid escape sequence '\\{ch}'")]
    InvalidEscape { ch: char, position: Position },

    #[error("Syntax error at {position}: invalid numeric literal '{lexeme}'")]
    InvalidNumber { lexeme: String, position: Position },

    #[error("Syntax error at {position}: '${{' and '#{{' cannot be mixed in one expression")]
    MixedSyntax { position: Position },

    #[error("Syntax error at {position}: left side of '=' must be an identifier or a property")]
    InvalidAssignmentTarget { position: Position },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedEof { position, .. }
            | ParseError::IllegalCharacter { position, .. }
            | ParseError::UnterminatedString { position }
            | ParseError::InvalidEscape { position, .. }
            | ParseError::InvalidNumber { position, .. }
            | ParseError::MixedSyntax { position }
            | ParseError::InvalidAssignmentTarget { position } => *position,
        }
    }

    /// The offending source text, when there is one
    pub fn lexeme(&self) -> Option<String> {
        match self {
            ParseError::UnexpectedToken { found, .. } => Some(found.clone()),
            ParseError::IllegalCharacter { ch, .. } => Some(ch.to_string()),
            ParseError::InvalidEscape { ch, .. } => Some(format!("\\{}", ch)),
            ParseError::InvalidNumber { lexeme, .. } => Some(lexeme.clone()),
            _ => None,
        }
    }
}

/// Errors that can occur while coercing, comparing or evaluating values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Source and target type cannot be reconciled
    #[error("Cannot convert [{value}] of type [{source_kind}] to [{target}]")]
    Conversion {
        value: String,
        source_kind: String,
        target: String,
    },

    /// Neither operand offers an ordering the other accepts
    #[error("Cannot compare [{left}] to [{right}]")]
    Comparison { left: String, right: String },

    /// `compare` with a null operand
    #[error("Cannot compare null")]
    CompareNull,

    /// A resolver supplied null for a primitive target outside coerce-to-zero mode
    #[error("Null cannot be converted to [{target}]")]
    NullRequired { target: String },

    #[error("Property [{property}] not found on type [{base}]")]
    PropertyNotFound { base: String, property: String },

    #[error("Property [{property}] is not writable on type [{base}]")]
    PropertyNotWritable { base: String, property: String },

    #[error("Method [{method}] not found on type [{base}]")]
    MethodNotFound { base: String, method: String },

    #[error("Function [{name}] not found")]
    FunctionNotFound { name: String },

    #[error("Unknown type [{name}]")]
    UnknownType { name: String },

    #[error("Only [{provided}] arguments were provided for a lambda expression that requires at least [{required}]")]
    LambdaArity { required: usize, provided: usize },

    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    /// A failure raised by host code, wrapped so callers see one error type
    #[error("Host error: {0}")]
    Host(String),
}

impl EvalError {
    pub fn conversion(
        value: impl ToString,
        source_kind: impl ToString,
        target: impl ToString,
    ) -> Self {
        EvalError::Conversion {
            value: value.to_string(),
            source_kind: source_kind.to_string(),
            target: target.to_string(),
        }
    }
}

/// Result type alias for evaluation
pub type Result<T> = std::result::Result<T, EvalError>;
