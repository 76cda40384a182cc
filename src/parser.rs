use std::collections::VecDeque;
use std::mem;
use std::str::FromStr;
use std::sync::Arc;

use num_bigint::BigInt;
use bigdecimal::BigDecimal;

use crate::{
    ast::{BinOp, EvalMode, Expr, Position, Template, TemplatePart, Token, TokenKind, UnaryOp},
    error::ParseError,
    lexer::Lexer,
};

/// Recursive-descent parser over the lexer's token stream.
///
/// Tokens are pulled lazily; a small lookahead buffer is only filled when
/// telling a lambda header `(a, b) ->` apart from a parenthesized expression.
pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    lookahead: VecDeque<Token>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
            lookahead: VecDeque::new(),
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = match self.lookahead.pop_front() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        Ok(())
    }

    /// Kind of the token `n` places after the current one
    fn peek_kind(&mut self, n: usize) -> Result<TokenKind, ParseError> {
        while self.lookahead.len() < n {
            let token = self.lexer.next_token()?;
            self.lookahead.push_back(token);
        }
        Ok(self.lookahead[n - 1].kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_token.kind == kind
    }

    fn check_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current_token.kind)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if !self.check(kind) {
            return Err(self.unexpected(&format!("'{}'", kind.image())));
        }
        let token = self.current_token.clone();
        self.advance()?;
        Ok(token)
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if !self.check(TokenKind::Identifier) {
            return Err(self.unexpected("identifier"));
        }
        let name = mem::take(&mut self.current_token.lexeme);
        self.advance()?;
        Ok(name)
    }

    /// Error for the current token, which did not match `expected`
    fn unexpected(&self, expected: &str) -> ParseError {
        let token = &self.current_token;
        match token.kind {
            TokenKind::Eof => ParseError::UnexpectedEof {
                expected: expected.to_string(),
                position: token.position,
            },
            TokenKind::IllegalCharacter => ParseError::IllegalCharacter {
                ch: token.lexeme.chars().next().unwrap_or('\0'),
                position: token.position,
            },
            _ => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.to_string(),
                position: token.position,
            },
        }
    }

    /// Parse a complete template: literal text with embedded `${}` / `#{}`
    pub fn parse(&mut self) -> Result<Template, ParseError> {
        let mut parts = vec![];
        let mut mode = None;

        loop {
            match self.current_token.kind {
                TokenKind::Eof => break,
                TokenKind::LiteralText => {
                    let text = mem::take(&mut self.current_token.lexeme);
                    self.advance()?;
                    parts.push(TemplatePart::Text(text));
                }
                TokenKind::StartDynamic | TokenKind::StartDeferred => {
                    let this_mode = if self.check(TokenKind::StartDynamic) {
                        EvalMode::Dynamic
                    } else {
                        EvalMode::Deferred
                    };
                    match mode {
                        Some(seen) if seen != this_mode => {
                            return Err(ParseError::MixedSyntax {
                                position: self.current_token.position,
                            });
                        }
                        _ => mode = Some(this_mode),
                    }
                    self.advance()?;

                    let expr = self.parse_expression()?;
                    self.expect(TokenKind::RBrace)?;
                    parts.push(TemplatePart::Expression(expr));
                }
                _ => return Err(self.unexpected("literal text or expression start")),
            }
        }

        Ok(Template { parts, mode })
    }

    /// Parse a bare expression (no `${ }` wrapper) up to end of input.
    /// The lexer must have been created with [`Lexer::for_expression`].
    pub fn parse_standalone(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Eof)?;
        Ok(expr)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_semicolon()
    }

    fn parse_semicolon(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_assign()?;
        if !self.check(TokenKind::Semicolon) {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.check(TokenKind::Semicolon) {
            self.advance()?;
            items.push(self.parse_assign()?);
        }
        Ok(Expr::Sequence(items))
    }

    fn parse_assign(&mut self) -> Result<Expr, ParseError> {
        let target = self.parse_lambda()?;

        if self.check(TokenKind::Assign) {
            let position = self.current_token.position;
            if !target.is_assignable() {
                return Err(ParseError::InvalidAssignmentTarget { position });
            }
            self.advance()?;
            // Right-associative: a = b = 1
            let value = self.parse_assign()?;
            return Ok(Expr::Assign {
                target: Box::new(target),
                value: Box::new(value),
            });
        }
        Ok(target)
    }

    fn parse_lambda(&mut self) -> Result<Expr, ParseError> {
        let Some(params) = self.parse_lambda_params()? else {
            return self.parse_ternary();
        };
        self.expect(TokenKind::Arrow)?;
        let body = self.parse_lambda()?;
        Ok(Expr::Lambda {
            params,
            body: Arc::new(body),
        })
    }

    /// `x`, `()`, `(x)` or `(x, y, ...)` when followed by `->`; `None` otherwise
    fn parse_lambda_params(&mut self) -> Result<Option<Vec<String>>, ParseError> {
        if self.check(TokenKind::Identifier) {
            if self.peek_kind(1)? != TokenKind::Arrow {
                return Ok(None);
            }
            let name = self.expect_identifier()?;
            return Ok(Some(vec![name]));
        }

        if !self.check(TokenKind::LParen) {
            return Ok(None);
        }

        // Scan ahead without consuming: ( [ident (, ident)*] ) ->
        let mut n = 1;
        let mut expect_name = true;
        loop {
            match (self.peek_kind(n)?, expect_name) {
                (TokenKind::RParen, _) if n == 1 || !expect_name => break,
                (TokenKind::Identifier, true) => expect_name = false,
                (TokenKind::Comma, false) => expect_name = true,
                _ => return Ok(None),
            }
            n += 1;
        }
        if self.peek_kind(n + 1)? != TokenKind::Arrow {
            return Ok(None);
        }

        self.advance()?; // (
        let mut params = vec![];
        while !self.check(TokenKind::RParen) {
            params.push(self.expect_identifier()?);
            if self.check(TokenKind::Comma) {
                self.advance()?;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(Some(params))
    }

    fn parse_ternary(&mut self) -> Result<Expr, ParseError> {
        let condition = self.parse_or()?;

        if !self.check(TokenKind::Question) {
            return Ok(condition);
        }
        self.advance()?;
        let then_branch = self.parse_ternary()?;
        self.expect(TokenKind::Colon)?;
        let else_branch = self.parse_ternary()?;

        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;

        while self.check_any(&[TokenKind::PipePipe, TokenKind::OrWord]) {
            self.advance()?;
            let right = self.parse_and()?;
            left = Expr::binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;

        while self.check_any(&[TokenKind::AmpAmp, TokenKind::AndWord]) {
            self.advance()?;
            let right = self.parse_equality()?;
            left = Expr::binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match self.current_token.kind {
                TokenKind::EqEq | TokenKind::EqWord => BinOp::Equal,
                TokenKind::NotEq | TokenKind::NeWord => BinOp::NotEqual,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_relational()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_concat()?;

        loop {
            let op = match self.current_token.kind {
                TokenKind::Lt | TokenKind::LtWord => BinOp::LessThan,
                TokenKind::Gt | TokenKind::GtWord => BinOp::GreaterThan,
                TokenKind::LtEq | TokenKind::LeWord => BinOp::LessEqual,
                TokenKind::GtEq | TokenKind::GeWord => BinOp::GreaterEqual,
                TokenKind::Instanceof => {
                    self.advance()?;
                    let type_name = self.parse_type_name()?;
                    left = Expr::InstanceOf {
                        operand: Box::new(left),
                        type_name,
                    };
                    continue;
                }
                _ => break,
            };
            self.advance()?;
            let right = self.parse_concat()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    /// `Name` or dotted `a.b.Name`
    fn parse_type_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.expect_identifier()?;
        while self.check(TokenKind::Dot) {
            self.advance()?;
            name.push('.');
            name.push_str(&self.expect_identifier()?);
        }
        Ok(name)
    }

    fn parse_concat(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;

        while self.check(TokenKind::Concat) {
            self.advance()?;
            let right = self.parse_additive()?;
            left = Expr::binary(BinOp::Concat, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token.kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Subtract,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token.kind {
                TokenKind::Star => BinOp::Multiply,
                TokenKind::Slash | TokenKind::DivWord => BinOp::Divide,
                TokenKind::Percent | TokenKind::ModWord => BinOp::Modulo,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current_token.kind {
            TokenKind::Minus => UnaryOp::Negate,
            TokenKind::Exclamation | TokenKind::NotWord => UnaryOp::Not,
            TokenKind::Empty => UnaryOp::Empty,
            _ => return self.parse_postfix(),
        };
        self.advance()?;
        let operand = self.parse_unary()?;
        Ok(Expr::unary(op, operand))
    }

    /// Property access, indexing and calls chained after a primary
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current_token.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let name = self.expect_identifier()?;
                    if self.check(TokenKind::LParen) {
                        let args = self.parse_arguments()?;
                        expr = Expr::MethodCall {
                            object: Box::new(expr),
                            method: name,
                            args,
                        };
                    } else {
                        expr = Expr::Access {
                            object: Box::new(expr),
                            key: Box::new(Expr::Key(name)),
                        };
                    }
                }
                TokenKind::LBracket => {
                    self.advance()?;
                    let key = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Access {
                        object: Box::new(expr),
                        key: Box::new(key),
                    };
                }
                TokenKind::LParen => {
                    let args = self.parse_arguments()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut args = vec![];

        while !self.check(TokenKind::RParen) {
            args.push(self.parse_assign()?);
            if !self.check(TokenKind::RParen) {
                self.expect(TokenKind::Comma)?;
            }
        }

        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    /// Parse primary expressions: literals, identifiers, function calls,
    /// parenthesized expressions and collection literals
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let position = self.current_token.position;

        match self.current_token.kind {
            TokenKind::Integer => {
                let lexeme = mem::take(&mut self.current_token.lexeme);
                self.advance()?;
                parse_integer(&lexeme, position)
            }
            TokenKind::Float => {
                let lexeme = mem::take(&mut self.current_token.lexeme);
                self.advance()?;
                parse_float(&lexeme, position)
            }
            TokenKind::String => {
                let text = mem::take(&mut self.current_token.lexeme);
                self.advance()?;
                Ok(Expr::String(text))
            }
            TokenKind::True => {
                self.advance()?;
                Ok(Expr::Boolean(true))
            }
            TokenKind::False => {
                self.advance()?;
                Ok(Expr::Boolean(false))
            }
            TokenKind::Null => {
                self.advance()?;
                Ok(Expr::Null)
            }

            TokenKind::Identifier => {
                // prefix:name( - the lexer has already classified the suffix
                if self.peek_kind(1)? == TokenKind::Colon
                    && self.peek_kind(2)? == TokenKind::FunctionSuffix
                {
                    let prefix = self.expect_identifier()?;
                    self.advance()?; // :
                    let name = mem::take(&mut self.current_token.lexeme);
                    self.advance()?;
                    let args = self.parse_arguments()?;
                    return Ok(Expr::FunctionCall {
                        prefix: Some(prefix),
                        name,
                        args,
                    });
                }

                let name = self.expect_identifier()?;
                if self.check(TokenKind::LParen) {
                    let args = self.parse_arguments()?;
                    return Ok(Expr::FunctionCall {
                        prefix: None,
                        name,
                        args,
                    });
                }
                Ok(Expr::Identifier(name))
            }

            TokenKind::ImplicitObject => {
                self.advance()?;
                let name = self.expect_identifier()?;
                Ok(Expr::ImplicitObject(name))
            }

            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }

            TokenKind::LBracket => {
                self.advance()?;
                self.parse_list_literal()
            }

            TokenKind::StartSetOrMap => {
                self.advance()?;
                self.parse_set_or_map_literal()
            }

            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_list_literal(&mut self) -> Result<Expr, ParseError> {
        let mut elements = vec![];

        while !self.check(TokenKind::RBracket) {
            elements.push(self.parse_assign()?);

            if !self.check(TokenKind::RBracket) {
                self.expect(TokenKind::Comma)?;
            }
        }

        self.expect(TokenKind::RBracket)?;
        Ok(Expr::List(elements))
    }

    /// Body of `{...}`. `{}` is always an empty set.
    fn parse_set_or_map_literal(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenKind::RBrace) {
            self.advance()?;
            return Ok(Expr::Set(vec![]));
        }

        let first = self.parse_assign()?;

        if self.check(TokenKind::Colon) {
            self.advance()?;
            let value = self.parse_assign()?;
            let mut pairs = vec![(first, value)];

            while self.check(TokenKind::Comma) {
                self.advance()?;
                let key = self.parse_assign()?;
                self.expect(TokenKind::Colon)?;
                let value = self.parse_assign()?;
                pairs.push((key, value));
            }
            self.expect(TokenKind::RBrace)?;
            return Ok(Expr::Map(pairs));
        }

        let mut elements = vec![first];
        while self.check(TokenKind::Comma) {
            self.advance()?;
            elements.push(self.parse_assign()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Set(elements))
    }
}

/// Integer literal; falls back to a big integer past `i64::MAX`
fn parse_integer(lexeme: &str, position: Position) -> Result<Expr, ParseError> {
    if let Ok(n) = lexeme.parse::<i64>() {
        return Ok(Expr::Integer(n));
    }
    BigInt::from_str(lexeme)
        .map(Expr::BigInteger)
        .map_err(|_| ParseError::InvalidNumber {
            lexeme: lexeme.to_string(),
            position,
        })
}

/// Floating literal; falls back to a decimal when `f64` overflows
fn parse_float(lexeme: &str, position: Position) -> Result<Expr, ParseError> {
    let invalid = || ParseError::InvalidNumber {
        lexeme: lexeme.to_string(),
        position,
    };

    let value = lexeme.parse::<f64>().map_err(|_| invalid())?;
    if value.is_finite() {
        return Ok(Expr::Float(value));
    }
    BigDecimal::from_str(lexeme)
        .map(Expr::BigDecimal)
        .map_err(|_| invalid())
}
