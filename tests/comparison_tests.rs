use std::any::Any;
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use elexpr::{
    EnumType, EvalContext, EvalError, Expression, HostObject, Value, ValueType, coerce_to_type,
    compare, equals,
};
use num_bigint::BigInt;
use proptest::prelude::*;

fn cmp(a: Value, b: Value) -> Ordering {
    compare(&EvalContext::new(), &a, &b).unwrap()
}

// ============================================================================
// Numeric Tower
// ============================================================================

#[test]
fn test_mixed_integral_widths() {
    assert_eq!(cmp(Value::Byte(3), Value::Long(4)), Ordering::Less);
    assert_eq!(cmp(Value::Integer(7), Value::Short(7)), Ordering::Equal);
    assert_eq!(cmp(Value::Char('b'), Value::Long(97)), Ordering::Greater);
}

#[test]
fn test_floating_promotion() {
    assert_eq!(cmp(Value::Long(2), Value::Double(2.5)), Ordering::Less);
    assert_eq!(cmp(Value::Float(1.5), Value::Double(1.5)), Ordering::Equal);
}

#[test]
fn test_big_integer_promotion() {
    let huge = Value::BigInteger(BigInt::from(i64::MAX) * 4);
    assert_eq!(cmp(huge.clone(), Value::Long(i64::MAX)), Ordering::Greater);
    assert_eq!(cmp(Value::Long(-1), huge), Ordering::Less);
}

#[test]
fn test_decimal_wins_over_double() {
    let tenth = Value::BigDecimal(BigDecimal::from_str("0.1").unwrap());
    assert_eq!(cmp(tenth.clone(), Value::Double(0.2)), Ordering::Less);
    assert_eq!(cmp(tenth, Value::Long(0)), Ordering::Greater);
}

#[test]
fn test_decimal_against_wide_operands() {
    let small = Value::BigDecimal(BigDecimal::from_str("1.5").unwrap());
    assert_eq!(cmp(small.clone(), Value::Double(1e30)), Ordering::Less);
    assert_eq!(cmp(Value::Double(-1e300), small.clone()), Ordering::Less);

    let wide: BigInt = "100000000000000000000000000000000".parse().unwrap();
    assert_eq!(cmp(small, Value::BigInteger(wide.clone())), Ordering::Less);

    let ctx = EvalContext::new();
    let same = Value::BigDecimal(BigDecimal::from_str("1e32").unwrap());
    assert!(equals(&ctx, &same, &Value::BigInteger(wide)));
}

#[test]
fn test_decimal_sees_binary_double() {
    // 0.1 as a double is slightly above one tenth
    let tenth = Value::BigDecimal(BigDecimal::from_str("0.1").unwrap());
    assert_eq!(cmp(tenth, Value::Double(0.1)), Ordering::Less);
    let half = Value::BigDecimal(BigDecimal::from_str("0.50").unwrap());
    assert_eq!(cmp(half, Value::Double(0.5)), Ordering::Equal);
}

#[test]
fn test_string_operand_forces_text_order() {
    assert_eq!(cmp(Value::from("10"), Value::Long(9)), Ordering::Less);
    assert_eq!(cmp(Value::Long(9), Value::from("10")), Ordering::Greater);
    assert_eq!(cmp(Value::from("apple"), Value::from("banana")), Ordering::Less);
}

// ============================================================================
// Nulls
// ============================================================================

#[test]
fn test_null_comparison_fails() {
    let ctx = EvalContext::new();
    assert_eq!(
        compare(&ctx, &Value::Null, &Value::Long(1)),
        Err(EvalError::CompareNull)
    );
    assert_eq!(
        compare(&ctx, &Value::from("a"), &Value::Null),
        Err(EvalError::CompareNull)
    );
    assert_eq!(compare(&ctx, &Value::Null, &Value::Null), Ok(Ordering::Equal));
}

#[test]
fn test_null_equality() {
    let ctx = EvalContext::new();
    assert!(equals(&ctx, &Value::Null, &Value::Null));
    assert!(!equals(&ctx, &Value::Null, &Value::Long(0)));
    assert!(!equals(&ctx, &Value::from(""), &Value::Null));
}

// ============================================================================
// Equality
// ============================================================================

#[test]
fn test_equality_never_fails() {
    let ctx = EvalContext::new();
    assert!(!equals(&ctx, &Value::Long(1), &Value::Boolean(true)));
    assert!(!equals(&ctx, &Value::List(vec![]), &Value::Long(0)));
    assert!(!equals(&ctx, &Value::Instant(chrono::Utc::now()), &Value::Long(0)));
}

#[test]
fn test_boolean_equality_with_text() {
    let ctx = EvalContext::new();
    assert!(equals(&ctx, &Value::Boolean(true), &Value::from("TRUE")));
    assert!(equals(&ctx, &Value::Boolean(false), &Value::from("no")));
}

#[test]
fn test_enum_equality_with_text() {
    let color = EnumType::new("Color", ["RED", "GREEN"]);
    let red = Value::Enum(color.value_of("RED").unwrap());
    let ctx = EvalContext::new();
    assert!(equals(&ctx, &red, &Value::from("RED")));
    assert!(equals(&ctx, &Value::from("RED"), &red));
    assert!(!equals(&ctx, &red, &Value::from("PURPLE")));
}

#[test]
fn test_enum_ordering_by_ordinal() {
    let color = EnumType::new("Color", ["RED", "GREEN"]);
    let red = Value::Enum(color.value_of("RED").unwrap());
    let green = Value::Enum(color.value_of("GREEN").unwrap());
    assert_eq!(cmp(red, green), Ordering::Less);
}

#[test]
fn test_temporal_equality_across_offsets() {
    let ctx = EvalContext::new();
    let utc = Value::from("2024-01-01T10:00:00Z");
    let zoned = Value::Temporal(
        chrono::DateTime::parse_from_rfc3339("2024-01-01T12:00:00+02:00").unwrap(),
    );
    assert!(equals(&ctx, &zoned, &utc));
    let later = Value::from("2024-01-01T10:00:01Z");
    assert_eq!(compare(&ctx, &zoned, &later).unwrap(), Ordering::Less);
}

#[test]
fn test_collections_holding_nan_are_reflexive() {
    let ctx = EvalContext::new();
    let list = Value::List(vec![Value::Double(f64::NAN), Value::Long(1)]);
    assert!(equals(&ctx, &list, &list));
    assert_eq!(compare(&ctx, &list, &list), Ok(Ordering::Equal));

    let map = Value::Map(vec![(Value::from("k"), Value::Float(f32::NAN))]);
    assert!(equals(&ctx, &map, &map.clone()));
}

#[test]
fn test_collections_compare_structurally_only() {
    let ctx = EvalContext::new();
    let a = Value::List(vec![Value::Long(1)]);
    let b = Value::List(vec![Value::Long(1)]);
    assert!(equals(&ctx, &a, &b));
    assert!(matches!(
        compare(&ctx, &a, &Value::List(vec![Value::Long(2)])),
        Err(EvalError::Comparison { .. })
    ));
}

// ============================================================================
// Host Objects
// ============================================================================

#[derive(Debug)]
struct Version(u32);

impl HostObject for Version {
    fn type_name(&self) -> &str {
        "Version"
    }

    fn to_text(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Ok(format!("v{}", self.0))
    }

    fn equals(&self, other: &dyn HostObject) -> bool {
        other
            .as_any()
            .downcast_ref::<Version>()
            .is_some_and(|v| v.0 == self.0)
    }

    fn compare_to(&self, other: &Value) -> Option<Result<Ordering, EvalError>> {
        let Value::Object(other) = other else {
            return None;
        };
        let other = other.as_any().downcast_ref::<Version>()?;
        Some(Ok(self.0.cmp(&other.0)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn version(n: u32) -> Value {
    Value::Object(Arc::new(Version(n)))
}

#[test]
fn test_host_object_native_order() {
    assert_eq!(cmp(version(1), version(2)), Ordering::Less);
    assert_eq!(cmp(version(3), version(3)), Ordering::Equal);
}

#[test]
fn test_host_object_without_peer_order() {
    let ctx = EvalContext::new();
    assert!(matches!(
        compare(&ctx, &version(1), &Value::Boolean(true)),
        Err(EvalError::Comparison { .. })
    ));
}

#[test]
fn test_host_object_against_text_uses_its_text() {
    let ctx = EvalContext::new();
    assert!(equals(&ctx, &version(2), &Value::from("v2")));
}

#[test]
fn test_relational_operator_on_host_objects() {
    let mut ctx = EvalContext::new()
        .with_variable("a", version(1))
        .with_variable("b", version(2));
    let result = Expression::compile("${a lt b && b gt a}")
        .unwrap()
        .evaluate(&mut ctx)
        .unwrap();
    assert_eq!(result, Value::Boolean(true));
}

// ============================================================================
// Properties
// ============================================================================

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Boolean),
        any::<i8>().prop_map(Value::Byte),
        any::<i32>().prop_map(Value::Integer),
        any::<i64>().prop_map(Value::Long),
        (-1.0e12f64..1.0e12).prop_map(Value::Double),
        "[a-z0-9]{0,8}".prop_map(Value::String),
    ]
}

fn collection() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![scalar(), Just(Value::Double(f64::NAN))].boxed();
    prop_oneof![
        leaf.clone(),
        prop::collection::vec(leaf.clone(), 0..4).prop_map(Value::List),
        prop::collection::vec(leaf.clone(), 0..4).prop_map(Value::Set),
        prop::collection::vec((leaf.clone(), leaf), 0..4).prop_map(|pairs| {
            let mut entries = Vec::new();
            for (key, value) in pairs {
                Value::map_insert(&mut entries, key, value);
            }
            Value::Map(entries)
        }),
    ]
}

fn integral() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i8>().prop_map(Value::Byte),
        any::<i16>().prop_map(Value::Short),
        any::<i32>().prop_map(Value::Integer),
        any::<i64>().prop_map(Value::Long),
    ]
}

proptest! {
    #[test]
    fn prop_compare_is_reflexive(v in scalar()) {
        let ctx = EvalContext::new();
        prop_assert_eq!(compare(&ctx, &v, &v).unwrap(), Ordering::Equal);
        prop_assert!(equals(&ctx, &v, &v));
    }

    #[test]
    fn prop_collections_are_reflexive(v in collection()) {
        let ctx = EvalContext::new();
        prop_assert!(equals(&ctx, &v, &v.clone()));
        prop_assert_eq!(compare(&ctx, &v, &v).unwrap(), Ordering::Equal);
    }

    #[test]
    fn prop_integral_order_is_antisymmetric(a in integral(), b in integral()) {
        let ctx = EvalContext::new();
        let forward = compare(&ctx, &a, &b).unwrap();
        let backward = compare(&ctx, &b, &a).unwrap();
        prop_assert_eq!(forward, backward.reverse());
    }

    #[test]
    fn prop_integral_text_round_trip(v in integral()) {
        let ctx = EvalContext::new();
        let text = coerce_to_type(&ctx, &v, &ValueType::String).unwrap();
        let back = coerce_to_type(&ctx, &text, &ValueType::of(&v)).unwrap();
        prop_assert_eq!(back, v);
    }

    #[test]
    fn prop_relational_spellings_agree(a in any::<i32>(), b in any::<i32>()) {
        let pairs = [("<", "lt"), (">", "gt"), ("<=", "le"), (">=", "ge"), ("==", "eq"), ("!=", "ne")];
        for (symbol, word) in pairs {
            let mut ctx = EvalContext::new()
                .with_variable("a", Value::Integer(a))
                .with_variable("b", Value::Integer(b));
            let symbolic = Expression::compile(&format!("${{a {} b}}", symbol))
                .unwrap()
                .evaluate(&mut ctx)
                .unwrap();
            let spelled = Expression::compile(&format!("${{a {} b}}", word))
                .unwrap()
                .evaluate(&mut ctx)
                .unwrap();
            prop_assert_eq!(symbolic, spelled);
        }
    }
}
