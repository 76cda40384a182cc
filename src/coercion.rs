//! # Coercion engine
//!
//! Converts a value to a target [`ValueType`]. Every entry point first offers
//! the pair to the context's resolver; a claim is returned as-is. Otherwise
//! the built-in rules apply in a fixed order:
//!
//! 1. values already of the target type pass through
//! 2. `null` becomes `null` for nullable targets, unless coerce-to-zero is on
//! 3. strings, numbers, characters, booleans and enumerations
//! 4. any other `null` stays `null`
//! 5. instants and dates
//! 6. text through an editor registered on the context
//! 7. `{}` to an empty map
//! 8. arrays, element by element
//! 9. lambdas to single-abstract-method interfaces
//!
//! Anything else is a [`EvalError::Conversion`].

mod number;
mod temporal;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::adapter::LambdaAdapter;
use crate::context::EvalContext;
use crate::error::{EvalError, Result};
use crate::types::{InterfaceType, NumericType, ValueType};
use crate::value::{EnumType, EnumValue, LambdaValue, Value};

pub(crate) use number::{
    bigint_value, decimal_value, double_value, is_float_text, long_value, parse_decimal,
    parse_double,
};

/// Coerce `value` to `target`.
///
/// # Examples
///
/// ```
/// use elexpr::{coerce_to_type, EvalContext, NumericKind, Value, ValueType};
///
/// let ctx = EvalContext::new();
/// let long = ValueType::number(NumericKind::Long);
/// assert_eq!(coerce_to_type(&ctx, &Value::from("42"), &long).unwrap(), Value::Long(42));
/// assert!(coerce_to_type(&ctx, &Value::from("forty-two"), &long).is_err());
/// ```
pub fn coerce_to_type(ctx: &EvalContext, value: &Value, target: &ValueType) -> Result<Value> {
    trace!(source = %value.kind_name(), target_type = %target, "coerce");
    if let Some(claimed) = ctx.offer_conversion(value, target)? {
        return primitive_claim(ctx, claimed, target);
    }

    if target.accepts(value) {
        return Ok(value.clone());
    }
    if value.is_null()
        && !ctx.coerce_to_zero()
        && !target.is_primitive()
        && *target != ValueType::String
    {
        return Ok(Value::Null);
    }

    match target {
        ValueType::String => string_of(value).map(Value::String),
        ValueType::Number(numeric) => number_of(ctx, value, *numeric),
        ValueType::Character { .. } => character_of(value).map(Value::Char),
        ValueType::Boolean { primitive } => Ok(boolean_of(ctx, value, *primitive)?
            .map(Value::Boolean)
            .unwrap_or(Value::Null)),
        ValueType::Enum(ty) => Ok(enum_of(value, ty)?.map(Value::Enum).unwrap_or(Value::Null)),
        _ => coerce_structured(ctx, value, target),
    }
}

/// Rules for targets that are not scalars
fn coerce_structured(ctx: &EvalContext, value: &Value, target: &ValueType) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match (target, value) {
        (ValueType::Instant, _) => return temporal::instant_of(value).map(Value::Instant),
        (ValueType::Date, _) => return temporal::date_of(value).map(Value::Date),
        (_, Value::String(text)) => return edit_text(ctx, text, target),
        (ValueType::Map, Value::Set(items)) if items.is_empty() => return Ok(Value::Map(vec![])),
        (ValueType::Array(element), Value::Array(items)) => {
            let converted = items
                .iter()
                .map(|item| coerce_to_type(ctx, item, element))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Value::Array(converted));
        }
        (ValueType::Interface(iface), Value::Lambda(lambda)) => {
            if let Some(adapter) = adapt_lambda(ctx, lambda, iface) {
                return Ok(Value::Adapter(adapter));
            }
        }
        _ => {}
    }

    Err(EvalError::conversion(value, value.kind_name(), target))
}

/// Text to an arbitrary target through a registered editor. Without an
/// editor, or when the editor fails, empty text becomes `null`.
fn edit_text(ctx: &EvalContext, text: &str, target: &ValueType) -> Result<Value> {
    let failure = || EvalError::conversion(text, "String", target);
    match ctx.editor(target) {
        Some(editor) => match editor(text) {
            Ok(value) => Ok(value),
            Err(_) if text.is_empty() => Ok(Value::Null),
            Err(e) => {
                debug!(error = %e, target_type = %target, "editor rejected text");
                Err(failure())
            }
        },
        None if text.is_empty() => Ok(Value::Null),
        None => Err(failure()),
    }
}

fn adapt_lambda(
    ctx: &EvalContext,
    lambda: &Arc<LambdaValue>,
    iface: &Arc<InterfaceType>,
) -> Option<Arc<LambdaAdapter>> {
    let method = iface.single_abstract_method()?;
    debug!(interface = iface.name(), method = %method.name, "adapting lambda");
    Some(Arc::new(LambdaAdapter::new(
        Arc::clone(lambda),
        Arc::clone(iface),
        ctx.snapshot(),
    )))
}

// String

/// Textual form of a value: `null` is empty, enumerations give their name.
pub fn coerce_to_string(ctx: &EvalContext, value: &Value) -> Result<String> {
    match ctx.offer_conversion(value, &ValueType::String)? {
        Some(Value::String(s)) => Ok(s),
        Some(Value::Null) => Ok(String::new()),
        Some(other) => Err(EvalError::conversion(&other, other.kind_name(), "String")),
        None => string_of(value),
    }
}

fn string_of(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Enum(e) => Ok(e.name().to_string()),
        Value::Object(object) => object.to_text().map_err(|e| match e.downcast::<EvalError>() {
            Ok(engine) => *engine,
            Err(other) => EvalError::Host(other.to_string()),
        }),
        other => Ok(other.to_string()),
    }
}

// Numbers

/// Coerce to a member of the numeric tower.
///
/// `null` and `""` give the zero of the target when it is primitive or
/// coerce-to-zero is on, `null` otherwise.
pub fn coerce_to_number(ctx: &EvalContext, value: &Value, target: NumericType) -> Result<Value> {
    match ctx.offer_conversion(value, &ValueType::Number(target))? {
        Some(claimed) => primitive_claim(ctx, claimed, &ValueType::Number(target)),
        None => number_of(ctx, value, target),
    }
}

/// A resolver's `null` cannot stand in for a primitive: it becomes the
/// zero of the target in coerce-to-zero mode and fails otherwise.
fn primitive_claim(ctx: &EvalContext, claimed: Value, target: &ValueType) -> Result<Value> {
    if !claimed.is_null() || !target.is_primitive() {
        return Ok(claimed);
    }
    if !ctx.coerce_to_zero() {
        return Err(EvalError::NullRequired {
            target: target.to_string(),
        });
    }
    match target {
        ValueType::Number(numeric) => number::zero(*numeric),
        ValueType::Character { .. } => Ok(Value::Char('\0')),
        ValueType::Boolean { .. } => Ok(Value::Boolean(false)),
        _ => Ok(claimed),
    }
}

fn number_of(ctx: &EvalContext, value: &Value, target: NumericType) -> Result<Value> {
    if value.is_null() && !target.primitive && !ctx.coerce_to_zero() {
        return Ok(Value::Null);
    }
    match value {
        Value::Null => number::zero(target),
        Value::String(s) if s.is_empty() => number::zero(target),
        Value::String(s) => number::parse(s, target),
        Value::Char(c) => number::convert(&number::char_to_short(*c), target),
        v if v.is_number() => number::convert(v, target),
        other => Err(EvalError::conversion(
            other,
            other.kind_name(),
            ValueType::Number(target),
        )),
    }
}

// Characters

pub fn coerce_to_character(ctx: &EvalContext, value: &Value) -> Result<char> {
    let target = ValueType::Character { primitive: false };
    match ctx.offer_conversion(value, &target)? {
        Some(Value::Char(c)) => Ok(c),
        Some(other) => Err(EvalError::conversion(&other, other.kind_name(), target)),
        None => character_of(value),
    }
}

fn character_of(value: &Value) -> Result<char> {
    let fail = || EvalError::conversion(value, value.kind_name(), "Character");
    match value {
        Value::Null => Ok('\0'),
        Value::String(s) => Ok(s.chars().next().unwrap_or('\0')),
        Value::Char(c) => Ok(*c),
        v if v.is_number() => {
            let code = number::short_value(v).ok_or_else(fail)?;
            char::from_u32(u32::from(code as u16)).ok_or_else(fail)
        }
        _ => Err(fail()),
    }
}

// Booleans

/// Coerce to a boolean; only `"true"` in any case is true among strings.
///
/// Returns `None` for `null` on a non-primitive target when coerce-to-zero is
/// off.
pub fn coerce_to_boolean(ctx: &EvalContext, value: &Value, primitive: bool) -> Result<Option<bool>> {
    let target = ValueType::Boolean { primitive };
    match ctx.offer_conversion(value, &target)? {
        Some(Value::Boolean(b)) => Ok(Some(b)),
        Some(Value::Null) if primitive => match primitive_claim(ctx, Value::Null, &target)? {
            Value::Boolean(b) => Ok(Some(b)),
            _ => Ok(None),
        },
        Some(Value::Null) => Ok(None),
        Some(other) => Err(EvalError::conversion(&other, other.kind_name(), "Boolean")),
        None => boolean_of(ctx, value, primitive),
    }
}

fn boolean_of(ctx: &EvalContext, value: &Value, primitive: bool) -> Result<Option<bool>> {
    match value {
        Value::Null if !primitive && !ctx.coerce_to_zero() => Ok(None),
        Value::Null => Ok(Some(false)),
        Value::Boolean(b) => Ok(Some(*b)),
        Value::String(s) => Ok(Some(s.eq_ignore_ascii_case("true"))),
        other => Err(EvalError::conversion(other, other.kind_name(), "Boolean")),
    }
}

// Enumerations

/// Coerce to a member of `ty` by exact member name; `null` and `""` give
/// `None`.
pub fn coerce_to_enum(ctx: &EvalContext, value: &Value, ty: &Arc<EnumType>) -> Result<Option<EnumValue>> {
    match ctx.offer_conversion(value, &ValueType::Enum(Arc::clone(ty)))? {
        Some(Value::Enum(e)) => Ok(Some(e)),
        Some(Value::Null) => Ok(None),
        Some(other) => Err(EvalError::conversion(&other, other.kind_name(), ty.name())),
        None => enum_of(value, ty),
    }
}

fn enum_of(value: &Value, ty: &Arc<EnumType>) -> Result<Option<EnumValue>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::Enum(e) if e.is_of(ty) => Ok(Some(e.clone())),
        Value::String(s) => ty
            .value_of(s)
            .map(Some)
            .ok_or_else(|| EvalError::conversion(s, "String", ty.name())),
        other => Err(EvalError::conversion(other, other.kind_name(), ty.name())),
    }
}

// Temporal

/// Normalize a temporal value or ISO-8601 text to an instant; `null` gives
/// `None`.
pub fn coerce_to_instant(ctx: &EvalContext, value: &Value) -> Result<Option<DateTime<Utc>>> {
    match ctx.offer_conversion(value, &ValueType::Instant)? {
        Some(Value::Instant(t)) => Ok(Some(t)),
        Some(Value::Null) => Ok(None),
        Some(other) => Err(EvalError::conversion(&other, other.kind_name(), "Instant")),
        None if value.is_null() => Ok(None),
        None => temporal::instant_of(value).map(Some),
    }
}
