use std::sync::Arc;

use bigdecimal::BigDecimal;
use elexpr::{
    EnumType, EvalContext, EvalError, Expression, NumericKind, StandardResolver, Value, ValueType,
};

fn eval(source: &str, ctx: &mut EvalContext) -> Result<Value, EvalError> {
    Expression::compile(source).unwrap().evaluate(ctx)
}

fn eval_plain(source: &str) -> Value {
    let mut ctx = EvalContext::new().with_resolver(Arc::new(StandardResolver));
    eval(source, &mut ctx).unwrap()
}

fn list(values: Vec<Value>) -> Value {
    Value::List(values)
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn test_single_expression_keeps_type() {
    assert_eq!(eval_plain("${1 + 2}"), Value::Long(3));
    assert_eq!(eval_plain("${true}"), Value::Boolean(true));
    assert_eq!(eval_plain("${null}"), Value::Null);
}

#[test]
fn test_composite_template_is_text() {
    let mut ctx = EvalContext::new()
        .with_variable("name", Value::from("Ada"))
        .with_variable("count", Value::Long(3));
    assert_eq!(
        eval("Hello ${name}, you have ${count} messages", &mut ctx).unwrap(),
        Value::from("Hello Ada, you have 3 messages")
    );
}

#[test]
fn test_literal_text_passes_through() {
    assert_eq!(eval_plain("just text"), Value::from("just text"));
    assert_eq!(eval_plain(r"price: \${x}"), Value::from("price: ${x}"));
}

#[test]
fn test_null_renders_empty() {
    let mut ctx = EvalContext::new().with_variable("missing", Value::Null);
    assert_eq!(eval("[${missing}]", &mut ctx).unwrap(), Value::from("[]"));
}

#[test]
fn test_deferred_evaluates_the_same() {
    let expr = Expression::compile("#{2 * 21}").unwrap();
    assert!(expr.is_deferred());
    assert_eq!(expr.evaluate(&mut EvalContext::new()).unwrap(), Value::Long(42));
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_integer_arithmetic() {
    assert_eq!(eval_plain("${7 - 2 * 3}"), Value::Long(1));
    assert_eq!(eval_plain("${7 % 3}"), Value::Long(1));
    assert_eq!(eval_plain("${7 mod 3}"), Value::Long(1));
    assert_eq!(eval_plain("${-(2 + 3)}"), Value::Long(-5));
}

#[test]
fn test_division_promotes_to_double() {
    assert_eq!(eval_plain("${7 / 2}"), Value::Double(3.5));
    assert_eq!(eval_plain("${1 div 4}"), Value::Double(0.25));
}

#[test]
fn test_float_arithmetic() {
    assert_eq!(eval_plain("${1.5 + 1}"), Value::Double(2.5));
}

#[test]
fn test_numeric_strings_in_arithmetic() {
    assert_eq!(eval_plain("${'4' * 2}"), Value::Long(8));
    assert_eq!(eval_plain("${'1.5' + 1}"), Value::Double(2.5));
}

#[test]
fn test_null_is_zero_in_arithmetic() {
    assert_eq!(eval_plain("${null + 5}"), Value::Long(5));
}

#[test]
fn test_big_integer_literal_arithmetic() {
    match eval_plain("${9223372036854775808 + 1}") {
        Value::BigInteger(n) => assert_eq!(n.to_string(), "9223372036854775809"),
        other => panic!("expected a big integer, got {:?}", other),
    }
}

#[test]
fn test_wide_integer_times_float() {
    match eval_plain("${100000000000000000000000000000000 * 1.5}") {
        Value::BigDecimal(d) => assert_eq!(d, "1.5e32".parse::<BigDecimal>().unwrap()),
        other => panic!("expected a decimal, got {:?}", other),
    }
}

#[test]
fn test_huge_float_literal() {
    assert_eq!(eval_plain("${1e400 > 1e300}"), Value::Boolean(true));
    match eval_plain("${1e400}") {
        Value::BigDecimal(d) => assert_eq!(d, "1e400".parse::<BigDecimal>().unwrap()),
        other => panic!("expected a decimal, got {:?}", other),
    }
}

#[test]
fn test_non_numeric_text_fails() {
    let mut ctx = EvalContext::new();
    assert!(matches!(
        eval("${'abc' + 1}", &mut ctx),
        Err(EvalError::Conversion { .. })
    ));
}

// ============================================================================
// Comparison and Logic
// ============================================================================

#[test]
fn test_relational_spellings() {
    assert_eq!(eval_plain("${3 > 2}"), Value::Boolean(true));
    assert_eq!(eval_plain("${3 gt 2}"), Value::Boolean(true));
    assert_eq!(eval_plain("${2 le 2}"), Value::Boolean(true));
    assert_eq!(eval_plain("${'a' lt 'b'}"), Value::Boolean(true));
}

#[test]
fn test_equality_across_types() {
    assert_eq!(eval_plain("${1 == 1.0}"), Value::Boolean(true));
    assert_eq!(eval_plain("${'1' eq 1}"), Value::Boolean(true));
    assert_eq!(eval_plain("${null == null}"), Value::Boolean(true));
    assert_eq!(eval_plain("${null != 0}"), Value::Boolean(true));
}

#[test]
fn test_relational_with_null_is_false() {
    assert_eq!(eval_plain("${null < 1}"), Value::Boolean(false));
    assert_eq!(eval_plain("${null >= 1}"), Value::Boolean(false));
}

#[test]
fn test_string_operand_compares_as_text() {
    assert_eq!(eval_plain("${'10' < 9}"), Value::Boolean(true));
}

#[test]
fn test_logical_operators() {
    assert_eq!(eval_plain("${true and false}"), Value::Boolean(false));
    assert_eq!(eval_plain("${true || missing}"), Value::Boolean(true));
    assert_eq!(eval_plain("${not false}"), Value::Boolean(true));
    assert_eq!(eval_plain("${'TRUE' && true}"), Value::Boolean(true));
}

#[test]
fn test_ternary() {
    let mut ctx = EvalContext::new().with_variable("n", Value::Long(5));
    assert_eq!(
        eval("${n > 3 ? 'big' : 'small'}", &mut ctx).unwrap(),
        Value::from("big")
    );
}

#[test]
fn test_empty_operator() {
    let mut ctx = EvalContext::new()
        .with_variable("blank", Value::from(""))
        .with_variable("items", list(vec![Value::Long(1)]));
    assert_eq!(eval("${empty blank}", &mut ctx).unwrap(), Value::Boolean(true));
    assert_eq!(eval("${empty items}", &mut ctx).unwrap(), Value::Boolean(false));
    assert_eq!(eval("${empty null}", &mut ctx).unwrap(), Value::Boolean(true));
    assert_eq!(eval("${empty {}}", &mut ctx).unwrap(), Value::Boolean(true));
}

#[test]
fn test_concat_operator() {
    assert_eq!(eval_plain("${'a' += 1 + 2}"), Value::from("a3"));
}

// ============================================================================
// Collections and Access
// ============================================================================

#[test]
fn test_collection_literals() {
    assert_eq!(
        eval_plain("${[1, 'two']}"),
        list(vec![Value::Long(1), Value::from("two")])
    );
    assert_eq!(
        eval_plain("${{1, 1, 2}}"),
        Value::Set(vec![Value::Long(1), Value::Long(2)])
    );
    assert_eq!(
        eval_plain("${{'k': 'v'}}"),
        Value::Map(vec![(Value::from("k"), Value::from("v"))])
    );
    assert_eq!(eval_plain("${{}}"), Value::Set(vec![]));
}

#[test]
fn test_property_and_index_access() {
    let user = Value::Map(vec![
        (Value::from("name"), Value::from("Ada")),
        (
            Value::from("tags"),
            list(vec![Value::from("x"), Value::from("y")]),
        ),
    ]);
    let mut ctx = EvalContext::new().with_variable("user", user);
    assert_eq!(eval("${user.name}", &mut ctx).unwrap(), Value::from("Ada"));
    assert_eq!(eval("${user['tags'][1]}", &mut ctx).unwrap(), Value::from("y"));
    assert_eq!(eval("${user.tags['0']}", &mut ctx).unwrap(), Value::from("x"));
    assert_eq!(eval("${user.tags[5]}", &mut ctx).unwrap(), Value::Null);
    assert_eq!(eval("${user.missing}", &mut ctx).unwrap(), Value::Null);
}

#[test]
fn test_unknown_identifier() {
    let mut ctx = EvalContext::new();
    match eval("${nobody}", &mut ctx) {
        Err(EvalError::PropertyNotFound { property, .. }) => assert_eq!(property, "nobody"),
        other => panic!("expected PropertyNotFound, got {:?}", other),
    }
}

// ============================================================================
// Methods and Functions
// ============================================================================

#[test]
fn test_string_methods() {
    assert_eq!(eval_plain("${'abc'.toUpperCase()}"), Value::from("ABC"));
    assert_eq!(eval_plain("${'  pad '.trim()}"), Value::from("pad"));
    assert_eq!(eval_plain("${'hello'.length()}"), Value::Integer(5));
    assert_eq!(eval_plain("${'hello'.startsWith('he')}"), Value::Boolean(true));
    assert_eq!(eval_plain("${'abc123'.matches('[a-z]+[0-9]+')}"), Value::Boolean(true));
    assert_eq!(eval_plain("${'abc123'.matches('[a-z]+')}"), Value::Boolean(false));
    assert_eq!(eval_plain("${'hello'.charAt(1)}"), Value::Char('e'));
    assert_eq!(
        eval_plain("${'a,b'.split(',')}"),
        Value::Array(vec![Value::from("a"), Value::from("b")])
    );
}

#[test]
fn test_collection_methods() {
    assert_eq!(eval_plain("${[1, 2, 3].size()}"), Value::Integer(3));
    assert_eq!(eval_plain("${[1, 2, 3].contains(2.0)}"), Value::Boolean(true));
    assert_eq!(eval_plain("${{'a': 1}.containsKey('a')}"), Value::Boolean(true));
}

#[test]
fn test_standard_functions() {
    assert_eq!(eval_plain("${fn:length('four')}"), Value::Long(4));
    assert_eq!(eval_plain("${fn:length([1, 2])}"), Value::Long(2));
    assert_eq!(eval_plain("${fn:join(['a', 'b'], '-')}"), Value::from("a-b"));
    assert_eq!(eval_plain("${fn:toUpperCase('x')}"), Value::from("X"));
}

#[test]
fn test_unknown_method_and_function() {
    let mut ctx = EvalContext::new().with_resolver(Arc::new(StandardResolver));
    assert!(matches!(
        eval("${'x'.reverse()}", &mut ctx),
        Err(EvalError::MethodNotFound { .. })
    ));
    match eval("${fn:nothing(1)}", &mut ctx) {
        Err(EvalError::FunctionNotFound { name }) => assert_eq!(name, "fn:nothing"),
        other => panic!("expected FunctionNotFound, got {:?}", other),
    }
}

// ============================================================================
// Lambdas
// ============================================================================

#[test]
fn test_immediately_invoked_lambda() {
    assert_eq!(eval_plain("${((x, y) -> x * y)(6, 7)}"), Value::Long(42));
    assert_eq!(eval_plain("${(() -> 'hi')()}"), Value::from("hi"));
}

#[test]
fn test_lambda_stored_in_variable() {
    let mut ctx = EvalContext::new();
    assert_eq!(
        eval("${square = x -> x * x; square(4)}", &mut ctx).unwrap(),
        Value::Long(16)
    );
    assert!(matches!(ctx.variable("square"), Some(Value::Lambda(_))));
}

#[test]
fn test_lambda_captures_enclosing_arguments() {
    assert_eq!(eval_plain("${(x -> y -> x + y)(1)(2)}"), Value::Long(3));
}

#[test]
fn test_lambda_arity() {
    let mut ctx = EvalContext::new();
    match eval("${((a, b) -> a)(1)}", &mut ctx) {
        Err(EvalError::LambdaArity { required, provided }) => {
            assert_eq!((required, provided), (2, 1));
        }
        other => panic!("expected LambdaArity, got {:?}", other),
    }
}

#[test]
fn test_lambda_arguments_shadow_variables() {
    let mut ctx = EvalContext::new().with_variable("x", Value::Long(100));
    assert_eq!(eval("${(x -> x + 1)(1)}", &mut ctx).unwrap(), Value::Long(2));
    assert_eq!(eval("${x}", &mut ctx).unwrap(), Value::Long(100));
}

// ============================================================================
// Assignment
// ============================================================================

#[test]
fn test_assignment_defines_variable() {
    let mut ctx = EvalContext::new();
    assert_eq!(eval("${a = 5; a * 2}", &mut ctx).unwrap(), Value::Long(10));
    assert_eq!(ctx.variable("a"), Some(&Value::Long(5)));
}

#[test]
fn test_assignment_into_map_and_list() {
    let mut ctx = EvalContext::new()
        .with_variable("m", Value::Map(vec![]))
        .with_variable("l", list(vec![Value::Long(0), Value::Long(0)]));
    eval("${m.k = 'v'; l[1] = 9}", &mut ctx).unwrap();
    assert_eq!(
        ctx.variable("m"),
        Some(&Value::Map(vec![(Value::from("k"), Value::from("v"))]))
    );
    assert_eq!(
        ctx.variable("l"),
        Some(&list(vec![Value::Long(0), Value::Long(9)]))
    );
}

#[test]
fn test_assignment_to_read_only_value() {
    let mut ctx = EvalContext::new().with_variable("s", Value::from("text"));
    assert!(matches!(
        eval("${s.length = 1}", &mut ctx),
        Err(EvalError::PropertyNotWritable { .. })
    ));
}

// ============================================================================
// instanceof
// ============================================================================

#[test]
fn test_instanceof() {
    let colors = EnumType::new("Color", ["RED", "GREEN"]);
    let mut ctx = EvalContext::new().with_variable("c", Value::Enum(colors.value_of("RED").unwrap()));
    ctx.register_enum(colors);

    assert_eq!(eval("${'x' instanceof String}", &mut ctx).unwrap(), Value::Boolean(true));
    assert_eq!(eval("${1 instanceof String}", &mut ctx).unwrap(), Value::Boolean(false));
    assert_eq!(eval("${1 instanceof Long}", &mut ctx).unwrap(), Value::Boolean(true));
    assert_eq!(eval("${null instanceof Object}", &mut ctx).unwrap(), Value::Boolean(false));
    assert_eq!(eval("${c instanceof Color}", &mut ctx).unwrap(), Value::Boolean(true));
    assert!(matches!(
        eval("${c instanceof Shape}", &mut ctx),
        Err(EvalError::UnknownType { .. })
    ));
}

// ============================================================================
// Typed Evaluation
// ============================================================================

#[test]
fn test_evaluate_as() {
    let mut ctx = EvalContext::new();
    let expr = Expression::compile("${'4' + '2'}").unwrap();
    assert_eq!(
        expr.evaluate_as(&mut ctx, &ValueType::number(NumericKind::Integer)).unwrap(),
        Value::Integer(6)
    );
    assert_eq!(
        expr.evaluate_as(&mut ctx, &ValueType::String).unwrap(),
        Value::from("6")
    );
}

#[test]
fn test_compile_standalone() {
    let expr = Expression::compile_standalone("1 + 2").unwrap();
    assert_eq!(expr.source(), "1 + 2");
    assert_eq!(expr.evaluate(&mut EvalContext::new()).unwrap(), Value::Long(3));
}

#[test]
fn test_expression_shared_across_threads() {
    let expr = Arc::new(Expression::compile("${n * 2}").unwrap());
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let expr = Arc::clone(&expr);
            std::thread::spawn(move || {
                let mut ctx = EvalContext::new().with_variable("n", Value::Long(n));
                expr.evaluate(&mut ctx).unwrap()
            })
        })
        .collect();
    let results: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        results,
        vec![Value::Long(0), Value::Long(2), Value::Long(4), Value::Long(6)]
    );
}
