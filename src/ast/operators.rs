use std::fmt;

/// Binary operators.
///
/// Symbolic and word spellings (`>` / `gt`, `&&` / `and`, ...) collapse to
/// the same variant during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Comparison
    /// Equal (`==`, `eq`)
    Equal,
    /// Not equal (`!=`, `ne`)
    NotEqual,
    /// Less than (`<`, `lt`)
    LessThan,
    /// Greater than (`>`, `gt`)
    GreaterThan,
    /// Less than or equal (`<=`, `le`)
    LessEqual,
    /// Greater than or equal (`>=`, `ge`)
    GreaterEqual,

    // Arithmetic
    /// Addition (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`, `div`)
    Divide,
    /// Modulo (`%`, `mod`)
    Modulo,

    /// String concatenation (`+=`)
    Concat,

    // Logical
    /// Logical AND (`&&`, `and`)
    And,
    /// Logical OR (`||`, `or`)
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::LessThan => "<",
            BinOp::GreaterThan => ">",
            BinOp::LessEqual => "<=",
            BinOp::GreaterEqual => ">=",
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
            BinOp::Concat => "+=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation (`-`)
    Negate,
    /// Logical negation (`!`, `not`)
    Not,
    /// Emptiness test (`empty`)
    Empty,
}
