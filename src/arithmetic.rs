//! Arithmetic over the numeric tower.
//!
//! Operands are promoted to the highest rank present: `BigDecimal`, then
//! `Double` (floats and float-looking text included), then `BigInteger`,
//! then `Long`. `Long` arithmetic wraps on overflow; `BigDecimal` is
//! unbounded, and a quotient that does not terminate is rounded to 100
//! significant digits. Two `null` operands give `Long(0)`.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::ast::BinOp;
use crate::coercion::{
    bigint_value, decimal_value, double_value, is_float_text, long_value, parse_decimal,
    parse_double,
};
use crate::error::{EvalError, Result};
use crate::value::Value;

/// Promotion target of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rank {
    Long,
    BigInteger,
    Double,
    BigDecimal,
}

fn is_decimal(v: &Value) -> bool {
    matches!(v, Value::BigDecimal(_))
}

fn is_big_integer(v: &Value) -> bool {
    matches!(v, Value::BigInteger(_))
}

fn is_floating(v: &Value) -> bool {
    match v {
        Value::Float(_) | Value::Double(_) => true,
        Value::String(s) => is_float_text(s),
        _ => false,
    }
}

fn any(a: &Value, b: &Value, test: fn(&Value) -> bool) -> bool {
    test(a) || test(b)
}

/// Apply an arithmetic operator. Non-arithmetic operators are rejected.
pub fn apply(op: BinOp, a: &Value, b: &Value) -> Result<Value> {
    if a.is_null() && b.is_null() {
        return Ok(Value::Long(0));
    }
    match op {
        BinOp::Add | BinOp::Subtract | BinOp::Multiply => {
            let rank = if any(a, b, is_decimal) {
                Rank::BigDecimal
            } else if any(a, b, is_floating) {
                if any(a, b, is_big_integer) {
                    Rank::BigDecimal
                } else {
                    Rank::Double
                }
            } else if any(a, b, is_big_integer) {
                Rank::BigInteger
            } else {
                Rank::Long
            };
            combine(op, rank, a, b)
        }
        BinOp::Divide => {
            let rank = if any(a, b, is_decimal) || any(a, b, is_big_integer) {
                Rank::BigDecimal
            } else {
                Rank::Double
            };
            combine(op, rank, a, b)
        }
        BinOp::Modulo => {
            let rank = if any(a, b, is_decimal) || any(a, b, is_floating) {
                Rank::Double
            } else if any(a, b, is_big_integer) {
                Rank::BigInteger
            } else {
                Rank::Long
            };
            combine(op, rank, a, b)
        }
        other => Err(EvalError::Arithmetic(format!(
            "'{}' is not an arithmetic operator",
            other
        ))),
    }
}

fn combine(op: BinOp, rank: Rank, a: &Value, b: &Value) -> Result<Value> {
    match rank {
        Rank::Long => {
            let (x, y) = (to_long(a)?, to_long(b)?);
            let n = match op {
                BinOp::Add => x.wrapping_add(y),
                BinOp::Subtract => x.wrapping_sub(y),
                BinOp::Multiply => x.wrapping_mul(y),
                _ if y == 0 => return Err(EvalError::Arithmetic("/ by zero".into())),
                _ => x.wrapping_rem(y),
            };
            Ok(Value::Long(n))
        }
        Rank::Double => {
            let (x, y) = (to_double(a)?, to_double(b)?);
            let n = match op {
                BinOp::Add => x + y,
                BinOp::Subtract => x - y,
                BinOp::Multiply => x * y,
                BinOp::Divide => x / y,
                _ => x % y,
            };
            Ok(Value::Double(n))
        }
        Rank::BigInteger => {
            let (x, y) = (to_big_integer(a)?, to_big_integer(b)?);
            let n = match op {
                BinOp::Add => x + y,
                BinOp::Subtract => x - y,
                BinOp::Multiply => x * y,
                _ => {
                    if !y.is_positive() {
                        return Err(EvalError::Arithmetic("modulus not positive".into()));
                    }
                    ((x % &y) + &y) % &y
                }
            };
            Ok(Value::BigInteger(n))
        }
        Rank::BigDecimal => {
            let (x, y) = (to_decimal(a)?, to_decimal(b)?);
            let n = match op {
                BinOp::Add => x + y,
                BinOp::Subtract => x - y,
                BinOp::Multiply => x * y,
                _ if y.is_zero() => return Err(EvalError::Arithmetic("/ by zero".into())),
                _ => x / y,
            };
            Ok(Value::BigDecimal(n))
        }
    }
}

/// Arithmetic negation within the operand's own kind
pub fn negate(value: &Value) -> Result<Value> {
    let negated = match value {
        Value::Null => Value::Long(0),
        Value::BigDecimal(d) => Value::BigDecimal(-d.clone()),
        Value::BigInteger(n) => Value::BigInteger(-n),
        Value::String(s) if is_float_text(s) => Value::Double(-to_double(value)?),
        Value::String(_) => Value::Long(to_long(value)?.wrapping_neg()),
        Value::Long(n) => Value::Long(n.wrapping_neg()),
        Value::Double(n) => Value::Double(-n),
        Value::Integer(n) => Value::Integer(n.wrapping_neg()),
        Value::Float(n) => Value::Float(-n),
        Value::Short(n) => Value::Short(n.wrapping_neg()),
        Value::Byte(n) => Value::Byte(n.wrapping_neg()),
        other => Value::Long(to_long(other)?.wrapping_neg()),
    };
    Ok(negated)
}

fn not_a_number(value: &Value) -> EvalError {
    EvalError::conversion(value, value.kind_name(), "Number")
}

/// Operands in arithmetic: numbers, characters, numeric text, and `null`
/// or `""` as zero
fn operand(value: &Value) -> Option<Value> {
    match value {
        Value::Null => Some(Value::Long(0)),
        Value::String(s) if s.is_empty() => Some(Value::Long(0)),
        Value::Char(c) => Some(Value::Long(i64::from(*c as u32 as u16 as i16))),
        v if v.is_number() => Some(v.clone()),
        _ => None,
    }
}

fn to_long(value: &Value) -> Result<i64> {
    if let Value::String(s) = value
        && !s.is_empty()
    {
        return s
            .parse()
            .map_err(|_| EvalError::conversion(s, "String", "Long"));
    }
    operand(value)
        .and_then(|v| long_value(&v))
        .ok_or_else(|| not_a_number(value))
}

fn to_double(value: &Value) -> Result<f64> {
    if let Value::String(s) = value
        && !s.is_empty()
    {
        return parse_double(s).ok_or_else(|| EvalError::conversion(s, "String", "Double"));
    }
    operand(value)
        .and_then(|v| double_value(&v))
        .ok_or_else(|| not_a_number(value))
}

fn to_big_integer(value: &Value) -> Result<BigInt> {
    if let Value::String(s) = value
        && !s.is_empty()
    {
        return s
            .parse()
            .map_err(|_| EvalError::conversion(s, "String", "BigInteger"));
    }
    operand(value)
        .and_then(|v| bigint_value(&v))
        .ok_or_else(|| not_a_number(value))
}

fn to_decimal(value: &Value) -> Result<BigDecimal> {
    if let Value::String(s) = value
        && !s.is_empty()
    {
        return parse_decimal(s).ok_or_else(|| EvalError::conversion(s, "String", "BigDecimal"));
    }
    operand(value)
        .and_then(|v| decimal_value(&v))
        .ok_or_else(|| not_a_number(value))
}
