use crate::ast::{EvalMode, Template, TemplatePart};
use crate::coercion::coerce_to_type;
use crate::context::EvalContext;
use crate::error::{EvalError, ParseError};
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::types::ValueType;
use crate::value::Value;

/// A compiled expression: parse once, evaluate many times.
///
/// The parsed tree is immutable and `Send + Sync`, so one `Expression` can
/// be evaluated from several threads as long as each uses its own
/// [`EvalContext`].
///
/// # Examples
///
/// ```
/// use elexpr::{EvalContext, Expression, Value};
///
/// let expr = Expression::compile("Hello ${name}!").unwrap();
/// let mut ctx = EvalContext::new().with_variable("name", Value::from("world"));
/// assert_eq!(expr.evaluate(&mut ctx).unwrap(), Value::from("Hello world!"));
/// assert!(!expr.is_deferred());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    template: Template,
}

impl Expression {
    /// Compile a template: literal text with `${...}` or `#{...}` expressions
    pub fn compile(source: &str) -> Result<Self, ParseError> {
        let template = Parser::new(Lexer::new(source))?.parse()?;
        Ok(Expression {
            source: source.to_string(),
            template,
        })
    }

    /// Compile a bare expression, as if written inside `${...}`
    pub fn compile_standalone(source: &str) -> Result<Self, ParseError> {
        let expr = Parser::new(Lexer::for_expression(source))?.parse_standalone()?;
        Ok(Expression {
            source: source.to_string(),
            template: Template {
                parts: vec![TemplatePart::Expression(expr)],
                mode: Some(EvalMode::Dynamic),
            },
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn is_deferred(&self) -> bool {
        self.template.is_deferred()
    }

    pub fn is_literal_text(&self) -> bool {
        self.template.is_literal_text()
    }

    pub fn evaluate(&self, ctx: &mut EvalContext) -> Result<Value, EvalError> {
        Evaluator::new(ctx).eval_template(&self.template)
    }

    /// Evaluate and coerce the result to `expected`
    pub fn evaluate_as(&self, ctx: &mut EvalContext, expected: &ValueType) -> Result<Value, EvalError> {
        let value = self.evaluate(ctx)?;
        coerce_to_type(ctx, &value, expected)
    }
}
