use crate::ast::Expr;

/// How an embedded expression was introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMode {
    /// `${...}`, evaluated as soon as it is encountered
    Dynamic,
    /// `#{...}`, evaluation postponed to the consumer
    Deferred,
}

/// One piece of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Literal text, escapes already removed
    Text(String),
    /// Embedded expression
    Expression(Expr),
}

/// A complete parsed input: literal text interleaved with expressions.
///
/// All embedded expressions of one template share one [`EvalMode`];
/// mixing `${` and `#{` is rejected by the parser.
///
/// # Examples
/// ```text
/// Hello ${user.name}!        // Text, Expression, Text
/// #{cart.total * 1.2}        // a single deferred Expression
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub parts: Vec<TemplatePart>,
    /// `None` when the template is pure literal text
    pub mode: Option<EvalMode>,
}

impl Template {
    pub fn is_literal_text(&self) -> bool {
        self.mode.is_none()
    }

    pub fn is_deferred(&self) -> bool {
        self.mode == Some(EvalMode::Deferred)
    }

    /// The expression when the template is exactly one `${...}` / `#{...}`
    pub fn single_expression(&self) -> Option<&Expr> {
        match self.parts.as_slice() {
            [TemplatePart::Expression(expr)] => Some(expr),
            _ => None,
        }
    }
}
