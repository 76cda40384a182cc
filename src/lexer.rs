use tracing::trace;

use crate::ast::{Position, Token, TokenKind};
use crate::error::ParseError;

/// Tokenizer mode. The lexer keeps a stack of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexState {
    /// Literal text outside any expression
    Default,
    /// Inside `${...}` or `#{...}`
    InExpression,
    /// Inside a `{...}` set or map literal within an expression
    InSetOrMap,
}

/// Lazy tokenizer over expression-language text.
///
/// Produces tokens one at a time through [`Lexer::next_token`] or the
/// [`Iterator`] impl. The iterator stops after `Eof` or the first error;
/// a lexer cannot be rewound, tokenize again with a fresh one.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    states: Vec<LexState>,
    expect_suffix: bool,
    finished: bool,
}

/// Start tokenizing `text`
pub fn tokenize(text: &str) -> Lexer {
    Lexer::new(text)
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            states: vec![LexState::Default],
            expect_suffix: false,
            finished: false,
        }
    }

    /// Lexer for a bare expression, as if already inside `${`
    pub fn for_expression(input: &str) -> Self {
        let mut lexer = Lexer::new(input);
        lexer.push_state(LexState::InExpression);
        lexer
    }

    /// Current lexical state (top of the state stack)
    pub fn state(&self) -> LexState {
        self.states.last().copied().unwrap_or(LexState::Default)
    }

    /// Number of open `${`/`#{`/`{` levels
    pub fn depth(&self) -> usize {
        self.states.len() - 1
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn here(&self) -> Position {
        Position {
            offset: self.position,
            line: self.line,
            column: self.column,
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn push_state(&mut self, state: LexState) {
        self.states.push(state);
    }

    fn pop_state(&mut self) {
        if self.states.len() > 1 {
            self.states.pop();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\n' | '\r') = self.current_char() {
            self.advance();
        }
    }

    fn is_identifier_start(ch: char) -> bool {
        ch.is_alphabetic() || ch == '_' || ch == '$'
    }

    fn is_identifier_part(ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_' || ch == '$'
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if Self::is_identifier_part(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    /// After an identifier: is this `:name(` with the colon attached on both sides?
    fn at_function_suffix(&self) -> bool {
        if self.current_char() != Some(':') {
            return false;
        }
        if !self.peek_char(1).is_some_and(Self::is_identifier_start) {
            return false;
        }
        let mut offset = 2;
        while self.peek_char(offset).is_some_and(Self::is_identifier_part) {
            offset += 1;
        }
        while let Some(' ' | '\t' | '\n' | '\r') = self.peek_char(offset) {
            offset += 1;
        }
        self.peek_char(offset) == Some('(')
    }

    fn read_string(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.here();
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some(escaped @ ('\\' | '\'' | '"')) => result.push(escaped),
                        Some(other) => {
                            return Err(ParseError::InvalidEscape {
                                ch: other,
                                position: self.here(),
                            });
                        }
                        None => return Err(ParseError::UnterminatedString { position: start }),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(ParseError::UnterminatedString { position: start })
    }

    fn read_digits(&mut self, into: &mut String) {
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                into.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    /// `[eE][+-]?digits`, consumed only when complete
    fn read_exponent(&mut self, into: &mut String) -> bool {
        if !matches!(self.current_char(), Some('e' | 'E')) {
            return false;
        }
        let sign = usize::from(matches!(self.peek_char(1), Some('+' | '-')));
        if !self.peek_char(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
            return false;
        }
        for _ in 0..=sign {
            if let Some(ch) = self.current_char() {
                into.push(ch);
            }
            self.advance();
        }
        self.read_digits(into);
        true
    }

    fn read_number(&mut self) -> TokenKind {
        let mut number = String::new();
        let mut is_float = false;

        self.read_digits(&mut number);
        if self.current_char() == Some('.') {
            is_float = true;
            number.push('.');
            self.advance();
            self.read_digits(&mut number);
        }
        if self.read_exponent(&mut number) {
            is_float = true;
        }

        if is_float {
            TokenKind::Float
        } else {
            TokenKind::Integer
        }
    }

    /// Literal text up to the next unescaped `${` or `#{`
    fn lex_text(&mut self) -> Token {
        let start = self.here();

        match (self.current_char(), self.peek_char(1)) {
            (None, _) => return Token::new(TokenKind::Eof, "", start),
            (Some('$'), Some('{')) => {
                self.advance_by(2);
                self.push_state(LexState::InExpression);
                return Token::new(TokenKind::StartDynamic, "${", start);
            }
            (Some('#'), Some('{')) => {
                self.advance_by(2);
                self.push_state(LexState::InExpression);
                return Token::new(TokenKind::StartDeferred, "#{", start);
            }
            _ => {}
        }

        let mut text = String::new();
        while let Some(ch) = self.current_char() {
            let next = self.peek_char(1);
            match ch {
                '$' | '#' if next == Some('{') => break,
                '\\' if matches!(next, Some('$' | '#')) && self.peek_char(2) == Some('{') => {
                    self.advance();
                    if let Some(marker) = self.current_char() {
                        text.push(marker);
                    }
                    text.push('{');
                    self.advance_by(2);
                }
                _ => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
        Token::new(TokenKind::LiteralText, text, start)
    }

    fn lex_expression(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();
        let start = self.here();

        let Some(ch) = self.current_char() else {
            return Ok(Token::new(TokenKind::Eof, "", start));
        };
        let next = self.peek_char(1);

        let (kind, width) = match (ch, next) {
            ('{', _) => {
                self.advance();
                self.push_state(LexState::InSetOrMap);
                return Ok(Token::new(TokenKind::StartSetOrMap, "{", start));
            }
            ('}', _) => {
                self.advance();
                self.pop_state();
                return Ok(Token::new(TokenKind::RBrace, "}", start));
            }
            ('\'' | '"', _) => {
                let text = self.read_string(ch)?;
                return Ok(Token::new(TokenKind::String, text, start));
            }
            (c, _) if c.is_ascii_digit() => return Ok(self.finish_number(start)),
            ('.', Some(d)) if d.is_ascii_digit() => return Ok(self.finish_number(start)),
            (c, _) if Self::is_identifier_start(c) => return Ok(self.finish_word(start)),

            ('>', Some('=')) => (TokenKind::GtEq, 2),
            ('<', Some('=')) => (TokenKind::LtEq, 2),
            ('=', Some('=')) => (TokenKind::EqEq, 2),
            ('!', Some('=')) => (TokenKind::NotEq, 2),
            ('&', Some('&')) => (TokenKind::AmpAmp, 2),
            ('|', Some('|')) => (TokenKind::PipePipe, 2),
            ('+', Some('=')) => (TokenKind::Concat, 2),
            ('-', Some('>')) => (TokenKind::Arrow, 2),
            ('>', _) => (TokenKind::Gt, 1),
            ('<', _) => (TokenKind::Lt, 1),
            ('=', _) => (TokenKind::Assign, 1),
            ('!', _) => (TokenKind::Exclamation, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('%', _) => (TokenKind::Percent, 1),
            ('?', _) => (TokenKind::Question, 1),
            ('.', _) => (TokenKind::Dot, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            ('[', _) => (TokenKind::LBracket, 1),
            (']', _) => (TokenKind::RBracket, 1),
            (':', _) => (TokenKind::Colon, 1),
            (';', _) => (TokenKind::Semicolon, 1),
            (',', _) => (TokenKind::Comma, 1),
            ('#', _) => (TokenKind::ImplicitObject, 1),
            _ => (TokenKind::IllegalCharacter, 1),
        };

        let lexeme: String = self.input[self.position..self.position + width]
            .iter()
            .collect();
        self.advance_by(width);
        Ok(Token::new(kind, lexeme, start))
    }

    fn finish_number(&mut self, start: Position) -> Token {
        let from = self.position;
        let kind = self.read_number();
        let lexeme: String = self.input[from..self.position].iter().collect();
        Token::new(kind, lexeme, start)
    }

    fn finish_word(&mut self, start: Position) -> Token {
        let word = self.read_identifier();

        if self.expect_suffix {
            self.expect_suffix = false;
            return Token::new(TokenKind::FunctionSuffix, word, start);
        }
        if self.at_function_suffix() {
            self.expect_suffix = true;
            return Token::new(TokenKind::Identifier, word, start);
        }

        let kind = TokenKind::keyword(&word).unwrap_or(TokenKind::Identifier);
        Token::new(kind, word, start)
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        let token = match self.state() {
            LexState::Default => self.lex_text(),
            LexState::InExpression | LexState::InSetOrMap => self.lex_expression()?,
        };
        trace!(kind = ?token.kind, lexeme = %token.lexeme, at = %token.position, "token");
        Ok(token)
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        match &result {
            Ok(token) if token.is(TokenKind::Eof) => self.finished = true,
            Err(_) => self.finished = true,
            Ok(_) => {}
        }
        Some(result)
    }
}

#[test]
fn test_state_stack() {
    let mut lexer = Lexer::new("a${ {1} }b");
    assert_eq!(lexer.state(), LexState::Default);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::LiteralText);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::StartDynamic);
    assert_eq!(lexer.state(), LexState::InExpression);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::StartSetOrMap);
    assert_eq!(lexer.state(), LexState::InSetOrMap);
    assert_eq!(lexer.depth(), 2);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Integer);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::RBrace);
    assert_eq!(lexer.state(), LexState::InExpression);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::RBrace);
    assert_eq!(lexer.state(), LexState::Default);
    let tail = lexer.next_token().unwrap();
    assert_eq!(tail.kind, TokenKind::LiteralText);
    assert_eq!(tail.lexeme, "b");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}

#[test]
fn test_word_operators() {
    let kinds: Vec<TokenKind> = Lexer::new("${a gt b and not c}")
        .map(|t| t.unwrap().kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::StartDynamic,
            TokenKind::Identifier,
            TokenKind::GtWord,
            TokenKind::Identifier,
            TokenKind::AndWord,
            TokenKind::NotWord,
            TokenKind::Identifier,
            TokenKind::RBrace,
            TokenKind::Eof,
        ]
    );
}
