//! Ordering and equality across heterogeneous operands.
//!
//! The common comparison type is picked in this order:
//!
//! | operands                                   | compared as          |
//! |--------------------------------------------|----------------------|
//! | no string; either `BigDecimal`             | `BigDecimal`         |
//! | no string; either `Float`/`Double`         | `f64` (total order)  |
//! | no string; either `BigInteger`             | `BigInt`             |
//! | no string; either integral or `Char`       | `i64`                |
//! | either temporal                            | instant              |
//! | either a string                            | string               |
//! | otherwise                                  | native ordering      |

use std::cmp::Ordering;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use tracing::debug;

use crate::coercion::{
    coerce_to_boolean, coerce_to_enum, coerce_to_instant, coerce_to_number, coerce_to_string,
};
use crate::context::EvalContext;
use crate::error::{EvalError, Result};
use crate::types::{NumericKind, NumericType};
use crate::value::Value;

/// Compare two values.
///
/// Fails when either side is `null` (and the other is not), or when no
/// rule gives the pair an order.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use elexpr::{compare, EvalContext, Value};
///
/// let ctx = EvalContext::new();
/// assert_eq!(compare(&ctx, &Value::Integer(3), &Value::Double(3.5)).unwrap(), Ordering::Less);
/// // a string operand forces string comparison
/// assert_eq!(compare(&ctx, &Value::from("10"), &Value::Long(9)).unwrap(), Ordering::Less);
/// ```
pub fn compare(ctx: &EvalContext, a: &Value, b: &Value) -> Result<Ordering> {
    if equals(ctx, a, b) {
        return Ok(Ordering::Equal);
    }
    if a.is_null() || b.is_null() {
        return Err(EvalError::CompareNull);
    }

    if !a.is_text() && !b.is_text() {
        if either(a, b, |v| matches!(v, Value::BigDecimal(_))) {
            return Ok(decimal(ctx, a)?.cmp(&decimal(ctx, b)?));
        }
        if either(a, b, |v| matches!(v, Value::Float(_) | Value::Double(_))) {
            return Ok(double(ctx, a)?.total_cmp(&double(ctx, b)?));
        }
        if either(a, b, |v| matches!(v, Value::BigInteger(_))) {
            return Ok(big_integer(ctx, a)?.cmp(&big_integer(ctx, b)?));
        }
        if either(a, b, is_integral) {
            return Ok(long(ctx, a)?.cmp(&long(ctx, b)?));
        }
    }
    if either(a, b, Value::is_temporal) {
        return Ok(instant(ctx, a)?.cmp(&instant(ctx, b)?));
    }
    if a.is_text() || b.is_text() {
        return Ok(coerce_to_string(ctx, a)?.cmp(&coerce_to_string(ctx, b)?));
    }

    if let Some(ordering) = native_order(a, b) {
        return ordering;
    }
    if let Some(ordering) = native_order(b, a) {
        return ordering.map(Ordering::reverse);
    }
    Err(EvalError::Comparison {
        left: a.to_string(),
        right: b.to_string(),
    })
}

/// Test two values for equality. Never fails: a pair that cannot be
/// coerced to a common type is unequal.
pub fn equals(ctx: &EvalContext, a: &Value, b: &Value) -> bool {
    match try_equals(ctx, a, b) {
        Ok(equal) => equal,
        Err(e) => {
            debug!(error = %e, "equality degraded to false");
            false
        }
    }
}

fn try_equals(ctx: &EvalContext, a: &Value, b: &Value) -> Result<bool> {
    if a == b {
        return Ok(true);
    }
    if a.is_null() || b.is_null() {
        return Ok(false);
    }

    if !a.is_text() && !b.is_text() {
        if either(a, b, |v| matches!(v, Value::BigDecimal(_))) {
            return Ok(decimal(ctx, a)? == decimal(ctx, b)?);
        }
        if either(a, b, |v| matches!(v, Value::Float(_) | Value::Double(_))) {
            return Ok(double(ctx, a)?.total_cmp(&double(ctx, b)?).is_eq());
        }
        if either(a, b, |v| matches!(v, Value::BigInteger(_))) {
            return Ok(big_integer(ctx, a)? == big_integer(ctx, b)?);
        }
        if either(a, b, is_integral) {
            return Ok(long(ctx, a)? == long(ctx, b)?);
        }
    }
    if either(a, b, |v| matches!(v, Value::Boolean(_))) {
        return Ok(coerce_to_boolean(ctx, a, false)? == coerce_to_boolean(ctx, b, false)?);
    }
    if let Value::Enum(e) = a {
        return Ok(coerce_to_enum(ctx, b, e.enum_type())?.as_ref() == Some(e));
    }
    if let Value::Enum(e) = b {
        return Ok(coerce_to_enum(ctx, a, e.enum_type())?.as_ref() == Some(e));
    }
    if either(a, b, Value::is_temporal) {
        return Ok(instant(ctx, a)? == instant(ctx, b)?);
    }
    if a.is_text() || b.is_text() {
        return Ok(coerce_to_string(ctx, a)? == coerce_to_string(ctx, b)?);
    }
    Ok(false)
}

fn either(a: &Value, b: &Value, test: impl Fn(&Value) -> bool) -> bool {
    test(a) || test(b)
}

fn is_integral(value: &Value) -> bool {
    matches!(
        value,
        Value::Byte(_) | Value::Short(_) | Value::Integer(_) | Value::Long(_) | Value::Char(_)
    )
}

/// Ordering a value offers on its own terms
fn native_order(a: &Value, b: &Value) -> Option<Result<Ordering>> {
    match (a, b) {
        (Value::Boolean(x), Value::Boolean(y)) => Some(Ok(x.cmp(y))),
        (Value::Enum(x), Value::Enum(y)) if x.is_of(y.enum_type()) => {
            Some(Ok(x.ordinal().cmp(&y.ordinal())))
        }
        (Value::Object(object), other) => object.compare_to(other),
        _ => None,
    }
}

fn as_number(ctx: &EvalContext, value: &Value, kind: NumericKind) -> Result<Value> {
    let target = NumericType {
        kind,
        primitive: false,
    };
    coerce_to_number(ctx, value, target)
}

fn mismatch(value: &Value, target: &str) -> EvalError {
    EvalError::conversion(value, value.kind_name(), target)
}

fn decimal(ctx: &EvalContext, value: &Value) -> Result<BigDecimal> {
    match as_number(ctx, value, NumericKind::BigDecimal)? {
        Value::BigDecimal(d) => Ok(d),
        _ => Err(mismatch(value, "BigDecimal")),
    }
}

fn double(ctx: &EvalContext, value: &Value) -> Result<f64> {
    match as_number(ctx, value, NumericKind::Double)? {
        Value::Double(n) => Ok(n),
        _ => Err(mismatch(value, "Double")),
    }
}

fn big_integer(ctx: &EvalContext, value: &Value) -> Result<BigInt> {
    match as_number(ctx, value, NumericKind::BigInteger)? {
        Value::BigInteger(n) => Ok(n),
        _ => Err(mismatch(value, "BigInteger")),
    }
}

fn long(ctx: &EvalContext, value: &Value) -> Result<i64> {
    match as_number(ctx, value, NumericKind::Long)? {
        Value::Long(n) => Ok(n),
        _ => Err(mismatch(value, "Long")),
    }
}

fn instant(ctx: &EvalContext, value: &Value) -> Result<chrono::DateTime<chrono::Utc>> {
    coerce_to_instant(ctx, value)?.ok_or(EvalError::CompareNull)
}

#[test]
fn test_decimal_equality_is_numeric() {
    use std::str::FromStr;

    let ctx = EvalContext::new();
    let one = Value::BigDecimal(BigDecimal::from_str("1.0").unwrap());
    let one_hundredths = Value::BigDecimal(BigDecimal::from_str("1.00").unwrap());
    assert!(equals(&ctx, &one, &one_hundredths));
    assert!(equals(&ctx, &one, &Value::Long(1)));
}

#[test]
fn test_booleans_order_natively() {
    let ctx = EvalContext::new();
    assert_eq!(
        compare(&ctx, &Value::Boolean(false), &Value::Boolean(true)).unwrap(),
        Ordering::Less
    );
}
