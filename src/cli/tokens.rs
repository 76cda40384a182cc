//! Token listing

use super::{CliError, is_template};
use crate::{Lexer, Token};

/// Tokenize `source` up to and including the end-of-input token.
pub fn list_tokens(source: &str) -> Result<Vec<Token>, CliError> {
    let lexer = if is_template(source) {
        Lexer::new(source)
    } else {
        Lexer::for_expression(source)
    };

    Ok(lexer.collect::<Result<Vec<_>, _>>()?)
}

/// One line per token: `kind lexeme @line:col`
pub fn format_token(token: &Token) -> String {
    format!("{:?} {} @{}", token.kind, token, token.position)
}

#[test]
fn test_lists_through_eof() {
    use crate::TokenKind;

    let tokens = list_tokens("${x}").unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![TokenKind::StartDynamic, TokenKind::Identifier, TokenKind::RBrace, TokenKind::Eof]
    );
}
