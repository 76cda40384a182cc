use std::sync::Arc;

use tracing::trace;

use crate::{
    arithmetic,
    ast::{BinOp, Expr, Template, TemplatePart, UnaryOp},
    coercion::{coerce_to_boolean, coerce_to_number, coerce_to_string},
    compare::{compare, equals},
    context::EvalContext,
    error::{EvalError, Result},
    types::{NumericKind, NumericType},
    value::{LambdaValue, Value},
};

/// Walks a parsed template or expression against an [`EvalContext`].
///
/// The evaluator holds no state of its own; everything an evaluation
/// mutates (variables, lambda scopes, the resolved flag) lives in the
/// context.
///
/// # Examples
///
/// ```
/// use elexpr::{EvalContext, Evaluator, Value};
/// use elexpr::lexer::Lexer;
/// use elexpr::parser::Parser;
///
/// let mut parser = Parser::new(Lexer::new("${price * quantity}")).unwrap();
/// let template = parser.parse().unwrap();
///
/// let mut ctx = EvalContext::new()
///     .with_variable("price", Value::Long(12))
///     .with_variable("quantity", Value::Long(3));
/// let result = Evaluator::new(&mut ctx).eval_template(&template).unwrap();
/// assert_eq!(result, Value::Long(36));
/// ```
pub struct Evaluator<'c> {
    ctx: &'c mut EvalContext,
}

/// `null`, `""` and empty collections
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::List(items) | Value::Set(items) | Value::Array(items) => items.is_empty(),
        Value::Map(entries) => entries.is_empty(),
        _ => false,
    }
}

impl<'c> Evaluator<'c> {
    pub fn new(ctx: &'c mut EvalContext) -> Self {
        Evaluator { ctx }
    }

    pub fn context(&self) -> &EvalContext {
        &*self.ctx
    }

    /// Evaluate a template.
    ///
    /// A template made of exactly one expression yields that expression's
    /// value unconverted; anything else is concatenated as text.
    pub fn eval_template(&mut self, template: &Template) -> Result<Value> {
        trace!(parts = template.parts.len(), mode = ?template.mode, "eval template");
        if let Some(expr) = template.single_expression() {
            return self.eval_expr(expr);
        }

        let mut text = String::new();
        for part in &template.parts {
            match part {
                TemplatePart::Text(literal) => text.push_str(literal),
                TemplatePart::Expression(expr) => {
                    let value = self.eval_expr(expr)?;
                    text.push_str(&coerce_to_string(self.context(), &value)?);
                }
            }
        }
        Ok(Value::String(text))
    }

    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Integer(n) => Ok(Value::Long(*n)),
            Expr::BigInteger(n) => Ok(Value::BigInteger(n.clone())),
            Expr::Float(n) => Ok(Value::Double(*n)),
            Expr::BigDecimal(d) => Ok(Value::BigDecimal(d.clone())),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Key(name) => Ok(Value::String(name.clone())),

            Expr::Identifier(name) => self.lookup_identifier(name),
            Expr::ImplicitObject(name) => self.lookup_implicit(name),

            Expr::Access { object, key } => {
                let base = self.eval_expr(object)?;
                let key = self.eval_expr(key)?;
                self.get_property(&base, &key)
            }
            Expr::MethodCall {
                object,
                method,
                args,
            } => {
                let base = self.eval_expr(object)?;
                let args = self.eval_all(args)?;
                self.call_method(&base, method, &args)
            }
            Expr::FunctionCall { prefix, name, args } => {
                let args = self.eval_all(args)?;
                self.call_function(prefix.as_deref(), name, &args)
            }
            Expr::Call { callee, args } => {
                let callee = self.eval_expr(callee)?;
                let args = self.eval_all(args)?;
                self.call_value(&callee, &args)
            }

            Expr::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                match op {
                    UnaryOp::Negate => arithmetic::negate(&value),
                    UnaryOp::Not => Ok(Value::Boolean(!self.truth(&value)?)),
                    UnaryOp::Empty => Ok(Value::Boolean(is_empty(&value))),
                }
            }
            Expr::BinaryOp { op, left, right } => self.eval_binary(*op, left, right),
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.eval_expr(condition)?;
                if self.truth(&condition)? {
                    self.eval_expr(then_branch)
                } else {
                    self.eval_expr(else_branch)
                }
            }
            Expr::InstanceOf { operand, type_name } => {
                let value = self.eval_expr(operand)?;
                let ty = self
                    .ctx
                    .resolve_type(type_name)?
                    .ok_or_else(|| EvalError::UnknownType {
                        name: type_name.clone(),
                    })?;
                Ok(Value::Boolean(!value.is_null() && ty.accepts(&value)))
            }

            Expr::List(items) => Ok(Value::List(self.eval_all(items)?)),
            Expr::Set(items) => Ok(Value::set_of(self.eval_all(items)?)),
            Expr::Map(entries) => {
                let mut map = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = self.eval_expr(key)?;
                    let value = self.eval_expr(value)?;
                    Value::map_insert(&mut map, key, value);
                }
                Ok(Value::Map(map))
            }

            Expr::Lambda { params, body } => Ok(Value::Lambda(Arc::new(LambdaValue {
                params: params.clone(),
                body: Arc::clone(body),
                captured: self.ctx.visible_arguments(),
            }))),
            Expr::Assign { target, value } => {
                let value = self.eval_expr(value)?;
                self.assign(target, value.clone())?;
                Ok(value)
            }
            Expr::Sequence(items) => {
                let mut last = Value::Null;
                for item in items {
                    last = self.eval_expr(item)?;
                }
                Ok(last)
            }
        }
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>> {
        exprs.iter().map(|expr| self.eval_expr(expr)).collect()
    }

    /// Primitive boolean coercion used by `!`, `&&`, `||` and `?:`
    fn truth(&self, value: &Value) -> Result<bool> {
        Ok(coerce_to_boolean(self.context(), value, true)?.unwrap_or(false))
    }

    fn eval_binary(&mut self, op: BinOp, left: &Expr, right: &Expr) -> Result<Value> {
        // Short-circuit
        match op {
            BinOp::And => {
                let left = self.eval_expr(left)?;
                if !self.truth(&left)? {
                    return Ok(Value::Boolean(false));
                }
                let right = self.eval_expr(right)?;
                return Ok(Value::Boolean(self.truth(&right)?));
            }
            BinOp::Or => {
                let left = self.eval_expr(left)?;
                if self.truth(&left)? {
                    return Ok(Value::Boolean(true));
                }
                let right = self.eval_expr(right)?;
                return Ok(Value::Boolean(self.truth(&right)?));
            }
            _ => {}
        }

        let left = self.eval_expr(left)?;
        let right = self.eval_expr(right)?;
        let ctx = self.context();
        let result = match op {
            BinOp::Equal => Value::Boolean(equals(ctx, &left, &right)),
            BinOp::NotEqual => Value::Boolean(!equals(ctx, &left, &right)),
            BinOp::LessThan | BinOp::GreaterThan | BinOp::LessEqual | BinOp::GreaterEqual => {
                if left.is_null() || right.is_null() {
                    return Ok(Value::Boolean(false));
                }
                let ordering = compare(ctx, &left, &right)?;
                Value::Boolean(match op {
                    BinOp::LessThan => ordering.is_lt(),
                    BinOp::GreaterThan => ordering.is_gt(),
                    BinOp::LessEqual => ordering.is_le(),
                    _ => ordering.is_ge(),
                })
            }
            BinOp::Concat => {
                let mut text = coerce_to_string(ctx, &left)?;
                text.push_str(&coerce_to_string(ctx, &right)?);
                Value::String(text)
            }
            _ => arithmetic::apply(op, &left, &right)?,
        };
        Ok(result)
    }

    // Lookup

    fn lookup_identifier(&mut self, name: &str) -> Result<Value> {
        if let Some(argument) = self.ctx.lambda_argument(name) {
            return Ok(argument.clone());
        }
        let property = Value::String(name.to_string());
        let ctx = self.context();
        if let Some(value) = ctx.claim(|r| r.get_value(ctx, None, &property))? {
            return Ok(value);
        }
        self.ctx
            .variable(name)
            .cloned()
            .ok_or_else(|| EvalError::PropertyNotFound {
                base: "EvalContext".into(),
                property: name.to_string(),
            })
    }

    fn lookup_implicit(&mut self, name: &str) -> Result<Value> {
        let ctx = self.context();
        ctx.claim(|r| r.resolve_implicit(ctx, name))?
            .ok_or_else(|| EvalError::PropertyNotFound {
                base: "#".into(),
                property: name.to_string(),
            })
    }

    /// Index into a list-like value; `None` when negative
    fn index(&self, base: &Value, key: &Value) -> Result<Option<usize>> {
        let long = NumericType {
            kind: NumericKind::Long,
            primitive: true,
        };
        match coerce_to_number(self.context(), key, long) {
            Ok(Value::Long(n)) => Ok(usize::try_from(n).ok()),
            _ => Err(EvalError::PropertyNotFound {
                base: base.kind_name(),
                property: key.to_string(),
            }),
        }
    }

    fn get_property(&mut self, base: &Value, key: &Value) -> Result<Value> {
        let ctx = self.context();
        if let Some(value) = ctx.claim(|r| r.get_value(ctx, Some(base), key))? {
            return Ok(value);
        }

        match base {
            Value::Null => Ok(Value::Null),
            Value::Map(entries) => Ok(Value::map_get(entries, key).cloned().unwrap_or(Value::Null)),
            Value::List(items) | Value::Set(items) | Value::Array(items) => {
                let index = self.index(base, key)?;
                Ok(index
                    .and_then(|i| items.get(i))
                    .cloned()
                    .unwrap_or(Value::Null))
            }
            other => Err(EvalError::PropertyNotFound {
                base: other.kind_name(),
                property: key.to_string(),
            }),
        }
    }

    // Calls

    fn call_method(&mut self, base: &Value, method: &str, args: &[Value]) -> Result<Value> {
        let ctx = self.context();
        if let Some(value) = ctx.claim(|r| r.invoke(ctx, base, method, args))? {
            return Ok(value);
        }
        if let Value::Adapter(adapter) = base {
            return adapter.invoke(method, args);
        }
        // a lambda stored under the method's name
        if let Ok(Value::Lambda(lambda)) = self.get_property(base, &Value::from(method)) {
            return self.invoke_lambda(&lambda, args);
        }
        Err(EvalError::MethodNotFound {
            base: base.kind_name(),
            method: method.to_string(),
        })
    }

    fn call_function(&mut self, prefix: Option<&str>, name: &str, args: &[Value]) -> Result<Value> {
        if prefix.is_none() {
            let callee = self
                .ctx
                .lambda_argument(name)
                .or_else(|| self.ctx.variable(name))
                .cloned();
            if let Some(callee @ (Value::Lambda(_) | Value::Adapter(_))) = callee {
                return self.call_value(&callee, args);
            }
        }

        let ctx = self.context();
        if let Some(value) = ctx.claim(|r| r.call_function(ctx, prefix, name, args))? {
            return Ok(value);
        }
        Err(EvalError::FunctionNotFound {
            name: match prefix {
                Some(prefix) => format!("{}:{}", prefix, name),
                None => name.to_string(),
            },
        })
    }

    fn call_value(&mut self, callee: &Value, args: &[Value]) -> Result<Value> {
        match callee {
            Value::Lambda(lambda) => self.invoke_lambda(lambda, args),
            Value::Adapter(adapter) => adapter.call(args),
            other => Err(EvalError::conversion(other, other.kind_name(), "Lambda")),
        }
    }

    /// Invoke a lambda with positional arguments. Extra arguments are
    /// ignored; missing ones are an error.
    pub fn invoke_lambda(&mut self, lambda: &LambdaValue, args: &[Value]) -> Result<Value> {
        if args.len() < lambda.params.len() {
            return Err(EvalError::LambdaArity {
                required: lambda.params.len(),
                provided: args.len(),
            });
        }
        trace!(params = ?lambda.params, "invoke lambda");

        let mut scope = lambda.captured.clone();
        for (param, arg) in lambda.params.iter().zip(args) {
            scope.insert(param.clone(), arg.clone());
        }
        self.ctx.push_lambda_scope(scope);
        let result = self.eval_expr(&lambda.body);
        self.ctx.pop_lambda_scope();
        result
    }

    // Assignment

    fn assign(&mut self, target: &Expr, value: Value) -> Result<()> {
        match target {
            Expr::Identifier(name) => {
                let property = Value::String(name.clone());
                let ctx = self.context();
                let claimed = ctx.claim(|r| Ok(r.set_value(ctx, None, &property, &value)?.then_some(())))?;
                if claimed.is_none() {
                    self.ctx.set_variable(name.clone(), value);
                }
                Ok(())
            }
            Expr::Access { object, key } => {
                let base = self.eval_expr(object)?;
                let key = self.eval_expr(key)?;
                let ctx = self.context();
                let claimed =
                    ctx.claim(|r| Ok(r.set_value(ctx, Some(&base), &key, &value)?.then_some(())))?;
                if claimed.is_some() {
                    return Ok(());
                }
                if let Expr::Identifier(name) = object.as_ref()
                    && self.store_in_variable(name, &base, &key, value)?
                {
                    return Ok(());
                }
                Err(EvalError::PropertyNotWritable {
                    base: base.kind_name(),
                    property: key.to_string(),
                })
            }
            _ => Err(EvalError::PropertyNotWritable {
                base: "expression".into(),
                property: String::new(),
            }),
        }
    }

    /// Write into a map or list held directly by a variable
    fn store_in_variable(&mut self, name: &str, base: &Value, key: &Value, value: Value) -> Result<bool> {
        let index = match base {
            Value::List(_) | Value::Array(_) => self.index(base, key)?,
            Value::Map(_) => None,
            _ => return Ok(false),
        };
        match (self.ctx.variable_mut(name), index) {
            (Some(Value::Map(entries)), _) => {
                Value::map_insert(entries, key.clone(), value);
                Ok(true)
            }
            (Some(Value::List(items) | Value::Array(items)), Some(i)) if i < items.len() => {
                items[i] = value;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[test]
fn test_short_circuit_skips_right_operand() {
    let mut ctx = EvalContext::new();
    let expr = Expr::binary(BinOp::And, Expr::Boolean(false), Expr::Identifier("missing".into()));
    let result = Evaluator::new(&mut ctx).eval_expr(&expr).unwrap();
    assert_eq!(result, Value::Boolean(false));
}

#[test]
fn test_lambda_scope_popped_after_error() {
    let mut ctx = EvalContext::new();
    let lambda = LambdaValue {
        params: vec!["x".into()],
        body: Arc::new(Expr::Identifier("missing".into())),
        captured: Default::default(),
    };
    assert!(Evaluator::new(&mut ctx).invoke_lambda(&lambda, &[Value::Long(1)]).is_err());
    assert!(ctx.lambda_argument("x").is_none());
}
