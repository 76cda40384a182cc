use std::fmt;

/// Location of a token in the source text.
///
/// `offset` counts characters (not bytes) from the start of the input;
/// `line` and `column` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn start() -> Self {
        Position {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Closed catalog of token kinds.
///
/// Relational and logical operators have two spellings, symbolic and
/// word-form. The lexer keeps them apart; the parser folds each pair into
/// one [`BinOp`](crate::ast::BinOp).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// End of input
    Eof,

    // Template level
    /// Run of literal text outside any expression
    ///
    /// # Examples
    /// ```text
    /// Hello ${name}   // "Hello " is the literal run
    /// ```
    LiteralText,
    /// `${` - start of a dynamic (eagerly evaluated) expression
    StartDynamic,
    /// `#{` - start of a deferred (lazily evaluated) expression
    StartDeferred,

    // Braces
    /// `{` inside an expression, opening a set or map literal
    StartSetOrMap,
    /// `}`, closing an expression or a set/map literal
    RBrace,

    // Literals
    /// Integer literal
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 9223372036854775808   // becomes a BigInteger
    /// ```
    Integer,
    /// Floating-point literal, exponent included
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// .5
    /// 1e10
    /// 2.5E-3
    /// ```
    Float,
    /// Single or double quoted string; the lexeme holds the unescaped text
    String,
    True,
    False,
    Null,

    // Punctuation
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Semicolon,
    Comma,

    // Relational, symbolic and word spellings
    /// `>`
    Gt,
    /// `gt`
    GtWord,
    /// `<`
    Lt,
    /// `lt`
    LtWord,
    /// `>=`
    GtEq,
    /// `ge`
    GeWord,
    /// `<=`
    LtEq,
    /// `le`
    LeWord,
    /// `==`
    EqEq,
    /// `eq`
    EqWord,
    /// `!=`
    NotEq,
    /// `ne`
    NeWord,

    // Logical
    /// `!`
    Exclamation,
    /// `not`
    NotWord,
    /// `&&`
    AmpAmp,
    /// `and`
    AndWord,
    /// `||`
    PipePipe,
    /// `or`
    OrWord,

    /// `empty`
    Empty,
    /// `instanceof`
    Instanceof,

    // Arithmetic
    Star,
    Plus,
    Minus,
    Question,
    /// `/`
    Slash,
    /// `div`
    DivWord,
    /// `%`
    Percent,
    /// `mod`
    ModWord,

    /// `+=` - string concatenation
    Concat,
    /// `=`
    Assign,
    /// `->`
    Arrow,

    /// Identifier
    ///
    /// # Examples
    /// ```text
    /// user
    /// item_count
    /// $total
    /// ```
    Identifier,
    /// Name after the colon of a qualified function call
    ///
    /// # Examples
    /// ```text
    /// fn:length(list)   // "length" is the suffix
    /// ```
    FunctionSuffix,
    /// `#` not followed by `{`, introducing an implicit object
    ImplicitObject,

    /// Any character no other pattern accepts
    IllegalCharacter,
}

impl TokenKind {
    /// Canonical spelling, used in diagnostics
    pub fn image(self) -> &'static str {
        use TokenKind::*;
        match self {
            Eof => "<EOF>",
            LiteralText => "<LITERAL_TEXT>",
            StartDynamic => "${",
            StartDeferred => "#{",
            StartSetOrMap => "{",
            RBrace => "}",
            Integer => "<INTEGER_LITERAL>",
            Float => "<FLOATING_POINT_LITERAL>",
            String => "<STRING_LITERAL>",
            True => "true",
            False => "false",
            Null => "null",
            Dot => ".",
            LParen => "(",
            RParen => ")",
            LBracket => "[",
            RBracket => "]",
            Colon => ":",
            Semicolon => ";",
            Comma => ",",
            Gt => ">",
            GtWord => "gt",
            Lt => "<",
            LtWord => "lt",
            GtEq => ">=",
            GeWord => "ge",
            LtEq => "<=",
            LeWord => "le",
            EqEq => "==",
            EqWord => "eq",
            NotEq => "!=",
            NeWord => "ne",
            Exclamation => "!",
            NotWord => "not",
            AmpAmp => "&&",
            AndWord => "and",
            PipePipe => "||",
            OrWord => "or",
            Empty => "empty",
            Instanceof => "instanceof",
            Star => "*",
            Plus => "+",
            Minus => "-",
            Question => "?",
            Slash => "/",
            DivWord => "div",
            Percent => "%",
            ModWord => "mod",
            Concat => "+=",
            Assign => "=",
            Arrow => "->",
            Identifier => "<IDENTIFIER>",
            FunctionSuffix => "<FUNCTION_SUFFIX>",
            ImplicitObject => "#",
            IllegalCharacter => "<ILLEGAL_CHARACTER>",
        }
    }

    /// Map a reserved word to its token kind
    pub fn keyword(word: &str) -> Option<TokenKind> {
        use TokenKind::*;
        let kind = match word {
            "true" => True,
            "false" => False,
            "null" => Null,
            "gt" => GtWord,
            "lt" => LtWord,
            "ge" => GeWord,
            "le" => LeWord,
            "eq" => EqWord,
            "ne" => NeWord,
            "not" => NotWord,
            "and" => AndWord,
            "or" => OrWord,
            "empty" => Empty,
            "instanceof" => Instanceof,
            "div" => DivWord,
            "mod" => ModWord,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.image())
    }
}

/// A lexical token: its kind, the text it was read from, and where.
///
/// For string literals and literal text the lexeme is the unescaped
/// content (no quotes, no `\${` escapes); for every other kind it is the
/// source text verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, position: Position) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            position,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::String => write!(f, "'{}'", self.lexeme),
            TokenKind::Eof => f.write_str("<EOF>"),
            _ => f.write_str(&self.lexeme),
        }
    }
}
