//! JSON <-> Value conversion utilities

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::Value;

/// Convert serde_json::Value to Value
///
/// Integers become `Long`, or `BigInteger` beyond `i64`; other numbers
/// become `Double`. Objects become maps keyed by strings.
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Long(i)
            } else if let Some(u) = n.as_u64() {
                Value::BigInteger(BigInt::from(u))
            } else {
                Value::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::List(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => Value::Map(
            obj.into_iter()
                .map(|(k, v)| (Value::String(k), json_to_value(v)))
                .collect(),
        ),
    }
}

fn float_to_json(f: f64) -> serde_json::Value {
    serde_json::Number::from_f64(f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// Convert Value to serde_json::Value
///
/// Values with no JSON counterpart (temporal values, enumerations, lambdas,
/// host objects) are written as their text form.
pub fn value_to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Byte(n) => serde_json::Value::Number((*n).into()),
        Value::Short(n) => serde_json::Value::Number((*n).into()),
        Value::Integer(n) => serde_json::Value::Number((*n).into()),
        Value::Long(n) => serde_json::Value::Number((*n).into()),
        Value::Float(f) => float_to_json(f64::from(*f)),
        Value::Double(f) => float_to_json(*f),
        Value::BigInteger(n) => match (n.to_i64(), n.to_u64()) {
            (Some(i), _) => serde_json::Value::Number(i.into()),
            (_, Some(u)) => serde_json::Value::Number(u.into()),
            _ => serde_json::Value::String(n.to_string()),
        },
        Value::BigDecimal(d) => match d.to_f64() {
            Some(f) if f.is_finite() => float_to_json(f),
            _ => serde_json::Value::String(d.to_string()),
        },
        Value::List(items) | Value::Set(items) | Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(value_to_json).collect())
        }
        Value::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), value_to_json(v)))
                .collect(),
        ),
        other => serde_json::Value::String(other.to_string()),
    }
}

#[test]
fn test_json_numbers() {
    assert_eq!(json_to_value(serde_json::json!(7)), Value::Long(7));
    assert_eq!(json_to_value(serde_json::json!(1.5)), Value::Double(1.5));
    assert_eq!(
        json_to_value(serde_json::json!(u64::MAX)),
        Value::BigInteger(BigInt::from(u64::MAX))
    );
}

#[test]
fn test_map_to_object() {
    let map = Value::Map(vec![(Value::from("a"), Value::Long(1))]);
    assert_eq!(value_to_json(&map), serde_json::json!({"a": 1}));
}
