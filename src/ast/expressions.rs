use std::sync::Arc;

use num_bigint::BigInt;

use crate::ast::{BinOp, UnaryOp};

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Nodes own their children; the tree is built once and is immutable
/// afterwards, so one tree can be evaluated from many threads at once.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// Integer literal that fits in 64 bits
    ///
    /// # Example
    /// ```text
    /// 42
    /// ```
    Integer(i64),

    /// Integer literal too wide for 64 bits
    BigInteger(BigInt),

    /// Floating-point literal
    ///
    /// # Example
    /// ```text
    /// 4.2e1
    /// ```
    Float(f64),

    /// Floating-point literal out of `f64` range
    BigDecimal(bigdecimal::BigDecimal),

    /// String literal
    String(String),

    /// Boolean literal
    Boolean(bool),

    /// Null literal
    Null,

    // References
    /// Bare identifier, looked up in lambda scopes, the resolver, then variables
    Identifier(String),

    /// Implicit object reference (`#name`)
    ImplicitObject(String),

    /// Property name after a dot. Only appears as the `key` of `Expr::Access`.
    Key(String),

    // Access
    /// Property or index access
    ///
    /// # Examples
    /// ```text
    /// user.name
    /// user['name']
    /// items[0]
    /// ```
    Access { object: Box<Expr>, key: Box<Expr> },

    /// Method call on a value
    ///
    /// # Examples
    /// ```text
    /// name.toUpperCase()
    /// list.contains(3)
    /// ```
    MethodCall {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },

    /// Named function call, optionally qualified
    ///
    /// # Examples
    /// ```text
    /// fn:length(items)
    /// square(4)
    /// ```
    FunctionCall {
        prefix: Option<String>,
        name: String,
        args: Vec<Expr>,
    },

    /// Invocation of a callee expression that evaluates to a lambda
    ///
    /// # Example
    /// ```text
    /// (x -> x * 2)(21)
    /// ```
    Call { callee: Box<Expr>, args: Vec<Expr> },

    // Operations
    /// Prefix operation
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation (arithmetic, comparison, logical, concatenation)
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Conditional (`a ? b : c`)
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Type test (`value instanceof Type`)
    InstanceOf {
        operand: Box<Expr>,
        type_name: String,
    },

    // Collection literals
    /// List literal (`[1, 2, 3]`)
    List(Vec<Expr>),

    /// Set literal (`{1, 2, 3}`). `{}` always parses to an empty set.
    Set(Vec<Expr>),

    /// Map literal (`{'a': 1, 'b': 2}`)
    Map(Vec<(Expr, Expr)>),

    /// Lambda expression
    ///
    /// # Examples
    /// ```text
    /// x -> x + 1
    /// (a, b) -> a * b
    /// () -> 42
    /// ```
    Lambda {
        params: Vec<String>,
        body: Arc<Expr>,
    },

    /// Assignment (`target = value`)
    Assign { target: Box<Expr>, value: Box<Expr> },

    /// Semicolon-separated sequence; evaluates to the last element
    Sequence(Vec<Expr>),
}

impl Expr {
    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// True for nodes that may appear on the left of `=`
    pub fn is_assignable(&self) -> bool {
        matches!(self, Expr::Identifier(_) | Expr::Access { .. })
    }
}
