//! # Resolver hook
//!
//! A [`Resolver`] is consulted before the built-in rules for conversions,
//! identifier and property lookup, assignment, method and function calls,
//! implicit objects and type names. Every method declines by default;
//! returning `Some` claims the request and the built-in rules are skipped.
//!
//! Resolvers compose with [`ResolverChain`]: the first claim wins.

use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::coercion::{coerce_to_number, coerce_to_string};
use crate::compare::equals;
use crate::context::EvalContext;
use crate::error::{EvalError, Result};
use crate::types::{NumericKind, NumericType, ValueType};
use crate::value::Value;

pub trait Resolver: Send + Sync {
    /// Convert `value` to `target`
    fn convert_to_type(
        &self,
        _ctx: &EvalContext,
        _value: &Value,
        _target: &ValueType,
    ) -> Result<Option<Value>> {
        Ok(None)
    }

    /// Read `property` of `base`; a `None` base asks for a top-level identifier
    fn get_value(
        &self,
        _ctx: &EvalContext,
        _base: Option<&Value>,
        _property: &Value,
    ) -> Result<Option<Value>> {
        Ok(None)
    }

    /// Write `property` of `base`; `true` claims the write
    fn set_value(
        &self,
        _ctx: &EvalContext,
        _base: Option<&Value>,
        _property: &Value,
        _value: &Value,
    ) -> Result<bool> {
        Ok(false)
    }

    fn invoke(
        &self,
        _ctx: &EvalContext,
        _base: &Value,
        _method: &str,
        _args: &[Value],
    ) -> Result<Option<Value>> {
        Ok(None)
    }

    /// Call `prefix:name(args)` or `name(args)`
    fn call_function(
        &self,
        _ctx: &EvalContext,
        _prefix: Option<&str>,
        _name: &str,
        _args: &[Value],
    ) -> Result<Option<Value>> {
        Ok(None)
    }

    /// Value of `#name`
    fn resolve_implicit(&self, _ctx: &EvalContext, _name: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    fn resolve_type(&self, _ctx: &EvalContext, _name: &str) -> Result<Option<ValueType>> {
        Ok(None)
    }
}

/// Resolvers tried in order; the first to claim wins.
#[derive(Default, Clone)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn Resolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn push(&mut self, resolver: Arc<dyn Resolver>) {
        self.resolvers.push(resolver);
    }

    fn first<T>(&self, mut ask: impl FnMut(&dyn Resolver) -> Result<Option<T>>) -> Result<Option<T>> {
        for resolver in &self.resolvers {
            if let Some(found) = ask(resolver.as_ref())? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

impl Resolver for ResolverChain {
    fn convert_to_type(&self, ctx: &EvalContext, value: &Value, target: &ValueType) -> Result<Option<Value>> {
        self.first(|r| r.convert_to_type(ctx, value, target))
    }

    fn get_value(&self, ctx: &EvalContext, base: Option<&Value>, property: &Value) -> Result<Option<Value>> {
        self.first(|r| r.get_value(ctx, base, property))
    }

    fn set_value(
        &self,
        ctx: &EvalContext,
        base: Option<&Value>,
        property: &Value,
        value: &Value,
    ) -> Result<bool> {
        for resolver in &self.resolvers {
            if resolver.set_value(ctx, base, property, value)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn invoke(&self, ctx: &EvalContext, base: &Value, method: &str, args: &[Value]) -> Result<Option<Value>> {
        self.first(|r| r.invoke(ctx, base, method, args))
    }

    fn call_function(
        &self,
        ctx: &EvalContext,
        prefix: Option<&str>,
        name: &str,
        args: &[Value],
    ) -> Result<Option<Value>> {
        self.first(|r| r.call_function(ctx, prefix, name, args))
    }

    fn resolve_implicit(&self, ctx: &EvalContext, name: &str) -> Result<Option<Value>> {
        self.first(|r| r.resolve_implicit(ctx, name))
    }

    fn resolve_type(&self, ctx: &EvalContext, name: &str) -> Result<Option<ValueType>> {
        self.first(|r| r.resolve_type(ctx, name))
    }
}

/// Everyday methods on strings and collections, and the `fn:` function
/// library.
///
/// | receiver    | methods                                                   |
/// |-------------|-----------------------------------------------------------|
/// | string      | `length toUpperCase toLowerCase trim contains startsWith endsWith matches split` |
/// | collection  | `size isEmpty contains`                                   |
///
/// Functions: `fn:length fn:join fn:toUpperCase fn:toLowerCase fn:matches`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardResolver;

const FUNCTION_PREFIX: &str = "fn";

fn text_arg(ctx: &EvalContext, args: &[Value], index: usize) -> Result<String> {
    coerce_to_string(ctx, args.get(index).unwrap_or(&Value::Null))
}

fn pattern(source: &str) -> Result<Regex> {
    // whole-string match
    Regex::new(&format!("^(?:{})$", source))
        .map_err(|e| EvalError::Host(format!("invalid pattern '{}': {}", source, e)))
}

fn length_of(ctx: &EvalContext, value: &Value) -> Result<i64> {
    let length = match value {
        Value::Null => 0,
        Value::String(s) => s.chars().count(),
        Value::List(items) | Value::Set(items) | Value::Array(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => coerce_to_string(ctx, other)?.chars().count(),
    };
    Ok(length as i64)
}

impl StandardResolver {
    fn string_method(ctx: &EvalContext, s: &str, method: &str, args: &[Value]) -> Result<Option<Value>> {
        let result = match (method, args.len()) {
            ("length", 0) => Value::Integer(s.chars().count() as i32),
            ("toUpperCase", 0) => Value::String(s.to_uppercase()),
            ("toLowerCase", 0) => Value::String(s.to_lowercase()),
            ("trim", 0) => Value::String(s.trim().to_string()),
            ("isEmpty", 0) => Value::Boolean(s.is_empty()),
            ("contains", 1) => Value::Boolean(s.contains(text_arg(ctx, args, 0)?.as_str())),
            ("startsWith", 1) => Value::Boolean(s.starts_with(text_arg(ctx, args, 0)?.as_str())),
            ("endsWith", 1) => Value::Boolean(s.ends_with(text_arg(ctx, args, 0)?.as_str())),
            ("matches", 1) => Value::Boolean(pattern(&text_arg(ctx, args, 0)?)?.is_match(s)),
            ("split", 1) => {
                let separator = split_pattern(&text_arg(ctx, args, 0)?)?;
                Value::Array(
                    separator
                        .split(s)
                        .map(|part| Value::String(part.to_string()))
                        .collect(),
                )
            }
            ("charAt", 1) => {
                let index = coerce_to_number(ctx, &args[0], NumericType {
                    kind: NumericKind::Long,
                    primitive: true,
                })?;
                let index = match index {
                    Value::Long(n) => usize::try_from(n).ok(),
                    _ => None,
                };
                match index.and_then(|i| s.chars().nth(i)) {
                    Some(c) => Value::Char(c),
                    None => {
                        return Err(EvalError::Host(format!(
                            "index out of range for string of length {}",
                            s.chars().count()
                        )));
                    }
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(result))
    }

    fn collection_method(ctx: &EvalContext, items: &[Value], method: &str, args: &[Value]) -> Option<Value> {
        match (method, args) {
            ("size", []) => Some(Value::Integer(items.len() as i32)),
            ("isEmpty", []) => Some(Value::Boolean(items.is_empty())),
            ("contains", [needle]) => Some(Value::Boolean(
                items.iter().any(|item| equals(ctx, item, needle)),
            )),
            _ => None,
        }
    }
}

/// `split` separators are regular expressions
fn split_pattern(source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|e| EvalError::Host(format!("invalid pattern '{}': {}", source, e)))
}

impl Resolver for StandardResolver {
    fn invoke(&self, ctx: &EvalContext, base: &Value, method: &str, args: &[Value]) -> Result<Option<Value>> {
        let result = match base {
            Value::String(s) => StandardResolver::string_method(ctx, s, method, args)?,
            Value::List(items) | Value::Set(items) | Value::Array(items) => {
                StandardResolver::collection_method(ctx, items, method, args)
            }
            Value::Map(entries) => match (method, args) {
                ("size", []) => Some(Value::Integer(entries.len() as i32)),
                ("isEmpty", []) => Some(Value::Boolean(entries.is_empty())),
                ("containsKey", [key]) => Some(Value::Boolean(
                    entries.iter().any(|(k, _)| equals(ctx, k, key)),
                )),
                _ => None,
            },
            _ => None,
        };
        if result.is_some() {
            debug!(method, receiver = %base.kind_name(), "standard method");
        }
        Ok(result)
    }

    fn call_function(
        &self,
        ctx: &EvalContext,
        prefix: Option<&str>,
        name: &str,
        args: &[Value],
    ) -> Result<Option<Value>> {
        if prefix != Some(FUNCTION_PREFIX) {
            return Ok(None);
        }
        let result = match (name, args) {
            ("length", [value]) => Value::Long(length_of(ctx, value)?),
            ("toUpperCase", [value]) => Value::String(coerce_to_string(ctx, value)?.to_uppercase()),
            ("toLowerCase", [value]) => Value::String(coerce_to_string(ctx, value)?.to_lowercase()),
            ("matches", [value, regex]) => {
                let text = coerce_to_string(ctx, value)?;
                Value::Boolean(pattern(&coerce_to_string(ctx, regex)?)?.is_match(&text))
            }
            ("join", [items, separator]) => {
                let separator = coerce_to_string(ctx, separator)?;
                let parts = match items.as_elements() {
                    Some(items) => items
                        .iter()
                        .map(|item| coerce_to_string(ctx, item))
                        .collect::<Result<Vec<_>>>()?,
                    None if items.is_null() => vec![],
                    None => vec![coerce_to_string(ctx, items)?],
                };
                Value::String(parts.join(&separator))
            }
            _ => return Ok(None),
        };
        Ok(Some(result))
    }
}

#[test]
fn test_chain_first_claim_wins() {
    struct Fixed(&'static str);
    impl Resolver for Fixed {
        fn resolve_implicit(&self, _: &EvalContext, _: &str) -> Result<Option<Value>> {
            Ok(Some(Value::from(self.0)))
        }
    }

    let chain = ResolverChain::new()
        .with(Arc::new(StandardResolver))
        .with(Arc::new(Fixed("first")))
        .with(Arc::new(Fixed("second")));
    let ctx = EvalContext::new();
    assert_eq!(
        chain.resolve_implicit(&ctx, "anything").unwrap(),
        Some(Value::from("first"))
    );
}
