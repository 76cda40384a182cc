//! Numeric tower conversions.
//!
//! Narrowing follows two's-complement truncation, floating to integral
//! conversion truncates toward zero and saturates. Nothing here consults
//! the resolver.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::error::{EvalError, Result};
use crate::types::{NumericKind, NumericType, ValueType};
use crate::value::Value;

fn target_name(target: NumericType) -> String {
    ValueType::Number(target).to_string()
}

/// Convert a member of the numeric tower to `target`.
pub(crate) fn convert(number: &Value, target: NumericType) -> Result<Value> {
    let fail = || EvalError::conversion(number, number.kind_name(), target_name(target));
    let converted = match target.kind {
        NumericKind::Long => Value::Long(long_value(number).ok_or_else(fail)?),
        NumericKind::Integer => Value::Integer(int_value(number).ok_or_else(fail)?),
        NumericKind::Short => Value::Short(int_value(number).ok_or_else(fail)? as i16),
        NumericKind::Byte => Value::Byte(int_value(number).ok_or_else(fail)? as i8),
        NumericKind::Double => Value::Double(double_value(number).ok_or_else(fail)?),
        NumericKind::Float => Value::Float(double_value(number).ok_or_else(fail)? as f32),
        NumericKind::BigInteger => Value::BigInteger(bigint_value(number).ok_or_else(fail)?),
        NumericKind::BigDecimal => Value::BigDecimal(decimal_value(number).ok_or_else(fail)?),
        NumericKind::Any if number.is_number() => number.clone(),
        NumericKind::Any => return Err(fail()),
    };
    Ok(converted)
}

/// Parse text as `target`. A bare "number" target has no textual form.
pub(crate) fn parse(text: &str, target: NumericType) -> Result<Value> {
    let parsed = match target.kind {
        NumericKind::Long => text.parse().ok().map(Value::Long),
        NumericKind::Integer => text.parse().ok().map(Value::Integer),
        NumericKind::Short => text.parse().ok().map(Value::Short),
        NumericKind::Byte => text.parse().ok().map(Value::Byte),
        NumericKind::Double => parse_double(text).map(Value::Double),
        NumericKind::Float => text.trim().parse().ok().map(Value::Float),
        NumericKind::BigInteger => BigInt::from_str(text).ok().map(Value::BigInteger),
        NumericKind::BigDecimal => parse_decimal(text).map(Value::BigDecimal),
        NumericKind::Any => None,
    };
    parsed.ok_or_else(|| EvalError::conversion(text, "String", target_name(target)))
}

/// The zero of `target`; `Long(0)` for an unspecified number
pub(crate) fn zero(target: NumericType) -> Result<Value> {
    convert(&Value::Long(0), target)
}

/// A character as the short integer of its code unit
pub(crate) fn char_to_short(c: char) -> Value {
    Value::Short(c as u32 as u16 as i16)
}

pub(crate) fn short_value(number: &Value) -> Option<i16> {
    int_value(number).map(|n| n as i16)
}

/// Text that reads as a floating-point number: more than one character and
/// a `.`, `e` or `E` somewhere in it
pub(crate) fn is_float_text(text: &str) -> bool {
    text.chars().count() > 1 && text.contains(['.', 'e', 'E'])
}

pub(crate) fn parse_double(text: &str) -> Option<f64> {
    text.trim().parse().ok()
}

pub(crate) fn parse_decimal(text: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(text).ok()
}

pub(crate) fn long_value(number: &Value) -> Option<i64> {
    let n = match number {
        Value::Byte(n) => i64::from(*n),
        Value::Short(n) => i64::from(*n),
        Value::Integer(n) => i64::from(*n),
        Value::Long(n) => *n,
        Value::Float(n) => *n as i64,
        Value::Double(n) => *n as i64,
        Value::BigInteger(n) => wrap_to_i64(n),
        Value::BigDecimal(d) => wrap_to_i64(&decimal_to_bigint(d)),
        _ => return None,
    };
    Some(n)
}

fn int_value(number: &Value) -> Option<i32> {
    match number {
        Value::Float(n) => Some(*n as i32),
        Value::Double(n) => Some(*n as i32),
        other => long_value(other).map(|n| n as i32),
    }
}

pub(crate) fn double_value(number: &Value) -> Option<f64> {
    match number {
        Value::Byte(n) => Some(f64::from(*n)),
        Value::Short(n) => Some(f64::from(*n)),
        Value::Integer(n) => Some(f64::from(*n)),
        Value::Long(n) => Some(*n as f64),
        Value::Float(n) => Some(f64::from(*n)),
        Value::Double(n) => Some(*n),
        Value::BigInteger(n) => n.to_f64(),
        Value::BigDecimal(d) => d.to_f64(),
        _ => None,
    }
}

pub(crate) fn bigint_value(number: &Value) -> Option<BigInt> {
    match number {
        Value::BigInteger(n) => Some(n.clone()),
        Value::BigDecimal(d) => Some(decimal_to_bigint(d)),
        other => long_value(other).map(BigInt::from),
    }
}

/// Exact for every source; floating sources fail on NaN and infinities
pub(crate) fn decimal_value(number: &Value) -> Option<BigDecimal> {
    match number {
        Value::BigDecimal(d) => Some(d.clone()),
        Value::BigInteger(n) => Some(BigDecimal::new(n.clone(), 0)),
        Value::Float(n) => exact_decimal(f64::from(*n)),
        Value::Double(n) => exact_decimal(*n),
        other => long_value(other).map(BigDecimal::from),
    }
}

/// The binary value of a finite double, digit for digit
fn exact_decimal(n: f64) -> Option<BigDecimal> {
    if !n.is_finite() {
        return None;
    }
    let bits = n.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = match biased {
        0 => (fraction, -1074),
        _ => (fraction | (1u64 << 52), biased - 1075),
    };
    let mut digits = BigInt::from(mantissa);
    if bits >> 63 == 1 {
        digits = -digits;
    }
    // m * 2^-k == m * 5^k / 10^k
    let exact = if exponent >= 0 {
        BigDecimal::new(digits << exponent as usize, 0)
    } else {
        let k = -exponent;
        BigDecimal::new(digits * BigInt::from(5u8).pow(k as u32), k)
    };
    Some(exact.normalized())
}

/// Integral part of a decimal, truncated toward zero
pub(crate) fn decimal_to_bigint(d: &BigDecimal) -> BigInt {
    d.with_scale(0).into_bigint_and_exponent().0
}

/// Low 64 bits, two's complement
fn wrap_to_i64(n: &BigInt) -> i64 {
    let mask = BigInt::from(u64::MAX);
    (n & &mask).to_u64().unwrap_or_default() as i64
}

#[test]
fn test_narrowing_wraps() {
    let byte = NumericType {
        kind: NumericKind::Byte,
        primitive: true,
    };
    assert_eq!(convert(&Value::Long(300), byte).unwrap(), Value::Byte(44));

    let big = BigInt::from(u64::MAX) + BigInt::from(2u8);
    assert_eq!(long_value(&Value::BigInteger(big)), Some(1));
}

#[test]
fn test_decimal_truncates_to_integer() {
    let d = BigDecimal::from_str("-12.75").unwrap();
    assert_eq!(decimal_to_bigint(&d), BigInt::from(-12));

    let wide = BigDecimal::from_str("1.5e40").unwrap();
    assert_eq!(decimal_to_bigint(&wide), BigInt::from(15) * BigInt::from(10).pow(39));
}

#[test]
fn test_doubles_convert_exactly() {
    assert_eq!(exact_decimal(0.5), BigDecimal::from_str("0.5").ok());
    assert_eq!(
        exact_decimal(0.1),
        BigDecimal::from_str("0.1000000000000000055511151231257827021181583404541015625").ok()
    );
    assert_eq!(
        exact_decimal(-1e30),
        BigDecimal::from_str("-1000000000000000019884624838656").ok()
    );
    assert_eq!(exact_decimal(f64::NAN), None);
    assert_eq!(exact_decimal(f64::INFINITY), None);
}

#[test]
fn test_float_text() {
    assert!(is_float_text("1.5"));
    assert!(is_float_text("1e3"));
    assert!(!is_float_text("."));
    assert!(!is_float_text("15"));
}
