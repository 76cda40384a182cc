// tests/parser_tests.rs

use bigdecimal::BigDecimal;
use elexpr::ast::{BinOp, EvalMode, Expr, Template, TemplatePart, UnaryOp};
use elexpr::error::ParseError;
use elexpr::lexer::Lexer;
use elexpr::parser::Parser;
use num_bigint::BigInt;

fn parse(input: &str) -> Expr {
    let mut parser = Parser::new(Lexer::for_expression(input)).unwrap();
    parser.parse_standalone().unwrap()
}

fn parse_template(input: &str) -> Result<Template, ParseError> {
    Parser::new(Lexer::new(input))?.parse()
}

fn ident(name: &str) -> Expr {
    Expr::Identifier(name.to_string())
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn test_template_parts() {
    let template = parse_template("Hello ${name}!").unwrap();
    assert_eq!(template.mode, Some(EvalMode::Dynamic));
    assert_eq!(
        template.parts,
        vec![
            TemplatePart::Text("Hello ".into()),
            TemplatePart::Expression(ident("name")),
            TemplatePart::Text("!".into()),
        ]
    );
}

#[test]
fn test_literal_only_template() {
    let template = parse_template("no expressions here").unwrap();
    assert!(template.is_literal_text());
    assert_eq!(template.mode, None);
}

#[test]
fn test_deferred_template() {
    let template = parse_template("#{a}#{b}").unwrap();
    assert!(template.is_deferred());
    assert_eq!(template.parts.len(), 2);
}

#[test]
fn test_mixed_syntax_rejected() {
    assert!(matches!(
        parse_template("${a} #{b}"),
        Err(ParseError::MixedSyntax { .. })
    ));
}

#[test]
fn test_single_expression() {
    let template = parse_template("${1 + 2}").unwrap();
    assert_eq!(
        template.single_expression(),
        Some(&Expr::binary(BinOp::Add, Expr::Integer(1), Expr::Integer(2)))
    );
}

#[test]
fn test_unclosed_expression() {
    assert!(matches!(
        parse_template("${a + b"),
        Err(ParseError::UnexpectedEof { .. })
    ));
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_dual_spellings_parse_identically() {
    let pairs = vec![
        ("a > b", "a gt b"),
        ("a < b", "a lt b"),
        ("a >= b", "a ge b"),
        ("a <= b", "a le b"),
        ("a == b", "a eq b"),
        ("a != b", "a ne b"),
        ("a && b", "a and b"),
        ("a || b", "a or b"),
        ("!a", "not a"),
        ("a / b", "a div b"),
        ("a % b", "a mod b"),
    ];

    for (symbolic, word) in pairs {
        assert_eq!(parse(symbolic), parse(word), "Failed for: {} / {}", symbolic, word);
    }
}

#[test]
fn test_precedence() {
    // a + b * c
    assert_eq!(
        parse("a + b * c"),
        Expr::binary(
            BinOp::Add,
            ident("a"),
            Expr::binary(BinOp::Multiply, ident("b"), ident("c"))
        )
    );

    // a || b && c
    assert_eq!(
        parse("a || b && c"),
        Expr::binary(
            BinOp::Or,
            ident("a"),
            Expr::binary(BinOp::And, ident("b"), ident("c"))
        )
    );

    // a == b < c
    assert_eq!(
        parse("a == b < c"),
        Expr::binary(
            BinOp::Equal,
            ident("a"),
            Expr::binary(BinOp::LessThan, ident("b"), ident("c"))
        )
    );
}

#[test]
fn test_parentheses() {
    match parse("(1 + 2) * 3") {
        Expr::BinaryOp {
            op: BinOp::Multiply,
            left,
            right,
        } => {
            assert!(matches!(*left, Expr::BinaryOp { op: BinOp::Add, .. }));
            assert_eq!(*right, Expr::Integer(3));
        }
        other => panic!("Expected multiplication, got {:?}", other),
    }
}

#[test]
fn test_left_associative_subtraction() {
    assert_eq!(
        parse("10 - 4 - 3"),
        Expr::binary(
            BinOp::Subtract,
            Expr::binary(BinOp::Subtract, Expr::Integer(10), Expr::Integer(4)),
            Expr::Integer(3)
        )
    );
}

#[test]
fn test_unary_operators() {
    assert_eq!(parse("-x"), Expr::unary(UnaryOp::Negate, ident("x")));
    assert_eq!(parse("empty list"), Expr::unary(UnaryOp::Empty, ident("list")));
    assert_eq!(
        parse("!!flag"),
        Expr::unary(UnaryOp::Not, Expr::unary(UnaryOp::Not, ident("flag")))
    );
}

#[test]
fn test_concat_binds_looser_than_addition() {
    assert_eq!(
        parse("a += b + 1"),
        Expr::binary(
            BinOp::Concat,
            ident("a"),
            Expr::binary(BinOp::Add, ident("b"), Expr::Integer(1))
        )
    );
}

#[test]
fn test_ternary_is_right_associative() {
    match parse("a ? 1 : b ? 2 : 3") {
        Expr::Ternary { else_branch, .. } => {
            assert!(matches!(*else_branch, Expr::Ternary { .. }));
        }
        other => panic!("Expected ternary, got {:?}", other),
    }
}

#[test]
fn test_instanceof() {
    assert_eq!(
        parse("x instanceof java.lang.String"),
        Expr::InstanceOf {
            operand: Box::new(ident("x")),
            type_name: "java.lang.String".into(),
        }
    );
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_number_literals() {
    assert_eq!(parse("42"), Expr::Integer(42));
    assert_eq!(parse("1.5"), Expr::Float(1.5));
    assert_eq!(
        parse("9223372036854775808"),
        Expr::BigInteger("9223372036854775808".parse::<BigInt>().unwrap())
    );
}

#[test]
fn test_out_of_range_float_becomes_decimal() {
    let mut parser = Parser::new(Lexer::for_expression("1e400")).unwrap();
    match parser.parse_standalone().unwrap() {
        Expr::BigDecimal(d) => assert_eq!(d, "1e400".parse::<BigDecimal>().unwrap()),
        other => panic!("expected a decimal literal, got {:?}", other),
    }
}

#[test]
fn test_collection_literals() {
    assert_eq!(
        parse("[1, 2]"),
        Expr::List(vec![Expr::Integer(1), Expr::Integer(2)])
    );
    assert_eq!(parse("{1, 2}"), Expr::Set(vec![Expr::Integer(1), Expr::Integer(2)]));
    assert_eq!(
        parse("{'a': 1}"),
        Expr::Map(vec![(Expr::String("a".into()), Expr::Integer(1))])
    );
    assert_eq!(parse("[]"), Expr::List(vec![]));
}

#[test]
fn test_empty_braces_are_a_set() {
    assert_eq!(parse("{}"), Expr::Set(vec![]));
}

// ============================================================================
// Access and Calls
// ============================================================================

#[test]
fn test_property_chain() {
    assert_eq!(
        parse("user.address['city']"),
        Expr::Access {
            object: Box::new(Expr::Access {
                object: Box::new(ident("user")),
                key: Box::new(Expr::Key("address".into())),
            }),
            key: Box::new(Expr::String("city".into())),
        }
    );
}

#[test]
fn test_method_call() {
    assert_eq!(
        parse("name.startsWith('A')"),
        Expr::MethodCall {
            object: Box::new(ident("name")),
            method: "startsWith".into(),
            args: vec![Expr::String("A".into())],
        }
    );
}

#[test]
fn test_qualified_function() {
    assert_eq!(
        parse("fn:join(items, ',')"),
        Expr::FunctionCall {
            prefix: Some("fn".into()),
            name: "join".into(),
            args: vec![ident("items"), Expr::String(",".into())],
        }
    );
}

#[test]
fn test_unqualified_function() {
    assert_eq!(
        parse("square(4)"),
        Expr::FunctionCall {
            prefix: None,
            name: "square".into(),
            args: vec![Expr::Integer(4)],
        }
    );
}

#[test]
fn test_implicit_object() {
    assert_eq!(parse("#now"), Expr::ImplicitObject("now".into()));
}

// ============================================================================
// Lambdas, Assignment, Sequences
// ============================================================================

#[test]
fn test_lambda_forms() {
    for (input, params) in [
        ("x -> x", vec!["x"]),
        ("(x) -> x", vec!["x"]),
        ("(a, b) -> a", vec!["a", "b"]),
        ("() -> 1", vec![]),
    ] {
        match parse(input) {
            Expr::Lambda { params: parsed, .. } => {
                assert_eq!(parsed, params, "Failed for: {}", input);
            }
            other => panic!("Expected lambda for {}, got {:?}", input, other),
        }
    }
}

#[test]
fn test_immediately_invoked_lambda() {
    match parse("((x, y) -> x * y)(6, 7)") {
        Expr::Call { callee, args } => {
            assert!(matches!(*callee, Expr::Lambda { .. }));
            assert_eq!(args, vec![Expr::Integer(6), Expr::Integer(7)]);
        }
        other => panic!("Expected call, got {:?}", other),
    }
}

#[test]
fn test_parenthesized_identifier_is_not_a_lambda() {
    assert_eq!(
        parse("(a) + 1"),
        Expr::binary(BinOp::Add, ident("a"), Expr::Integer(1))
    );
}

#[test]
fn test_assignment_is_right_associative() {
    assert_eq!(
        parse("a = b = 1"),
        Expr::Assign {
            target: Box::new(ident("a")),
            value: Box::new(Expr::Assign {
                target: Box::new(ident("b")),
                value: Box::new(Expr::Integer(1)),
            }),
        }
    );
}

#[test]
fn test_invalid_assignment_target() {
    let mut parser = Parser::new(Lexer::for_expression("1 = 2")).unwrap();
    assert!(matches!(
        parser.parse_standalone(),
        Err(ParseError::InvalidAssignmentTarget { .. })
    ));
}

#[test]
fn test_sequence() {
    assert_eq!(
        parse("a = 1; a + 1"),
        Expr::Sequence(vec![
            Expr::Assign {
                target: Box::new(ident("a")),
                value: Box::new(Expr::Integer(1)),
            },
            Expr::binary(BinOp::Add, ident("a"), Expr::Integer(1)),
        ])
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_illegal_character_reported() {
    let mut parser = Parser::new(Lexer::for_expression("a @ b")).unwrap();
    match parser.parse_standalone() {
        Err(ParseError::IllegalCharacter { ch, position }) => {
            assert_eq!(ch, '@');
            assert_eq!(position.column, 3);
        }
        other => panic!("Expected illegal character, got {:?}", other),
    }
}

#[test]
fn test_unexpected_token_names_lexeme() {
    let mut parser = Parser::new(Lexer::for_expression("1 +")).unwrap();
    assert!(matches!(
        parser.parse_standalone(),
        Err(ParseError::UnexpectedEof { .. })
    ));

    let mut parser = Parser::new(Lexer::for_expression("a b")).unwrap();
    let err = parser.parse_standalone().unwrap_err();
    assert_eq!(err.lexeme(), Some("b".to_string()));
    assert_eq!(err.position().column, 3);
}
