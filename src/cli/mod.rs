//! CLI support for elexpr
//!
//! Provides programmatic access to the `elexpr` commands for embedding in
//! other tools.

mod check;
mod convert;
mod tokens;

pub use check::{CheckResult, EvalOptions, execute_check, execute_eval};
pub use convert::{json_to_value, value_to_json};
pub use tokens::{format_token, list_tokens};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// `--vars` was valid JSON but not an object
    #[error("Variables must be a JSON object")]
    VariablesNotObject,

    #[error("Unknown type: '{0}'")]
    UnknownType(String),
}

/// Whether `source` is a template (`${...}` / `#{...}`) rather than a bare
/// expression
pub(crate) fn is_template(source: &str) -> bool {
    source.contains("${") || source.contains("#{")
}
