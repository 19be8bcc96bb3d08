// tests/parser_tests.rs

use graft_lang::ast::{BinOp, DescendKey, Expr, UnOp};
use graft_lang::{compile_expression, CompileError};

fn parse(source: &str) -> Expr {
    compile_expression(source).unwrap()
}

// ============================================================================
// Precedence and associativity
// ============================================================================

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let expr = parse("1 + 2 * 3");
    match expr {
        Expr::Binary {
            op: BinOp::Add,
            left,
            right,
            ..
        } => {
            assert!(matches!(*left, Expr::Integer(1)));
            assert!(matches!(
                *right,
                Expr::Binary {
                    op: BinOp::Multiply,
                    ..
                }
            ));
        }
        other => panic!("expected addition at the root, got {:?}", other),
    }
}

#[test]
fn test_comparison_binds_tighter_than_logic() {
    let expr = parse("a < 1 && b > 2");
    assert!(matches!(expr, Expr::Binary { op: BinOp::And, .. }));
}

#[test]
fn test_subtraction_is_left_associative() {
    let expr = parse("10 - 3 - 2");
    match expr {
        Expr::Binary {
            op: BinOp::Subtract,
            left,
            ..
        } => assert!(matches!(
            *left,
            Expr::Binary {
                op: BinOp::Subtract,
                ..
            }
        )),
        other => panic!("expected subtraction at the root, got {:?}", other),
    }
}

#[test]
fn test_unary_is_right_associative() {
    let expr = parse("!!a");
    match expr {
        Expr::Unary {
            op: UnOp::Not,
            operand,
            ..
        } => assert!(matches!(*operand, Expr::Unary { op: UnOp::Not, .. })),
        other => panic!("expected nested unary, got {:?}", other),
    }
}

// ============================================================================
// Navigation postfix
// ============================================================================

#[test]
fn test_member_chain() {
    let expr = parse("input.user.name");
    match expr {
        Expr::Member { target, name, .. } => {
            assert_eq!(name, "name");
            assert!(matches!(*target, Expr::Member { .. }));
        }
        other => panic!("expected member access, got {:?}", other),
    }
}

#[test]
fn test_bracket_forms() {
    assert!(matches!(parse("xs[0]"), Expr::Index { index: 0, .. }));
    assert!(matches!(parse("xs[-1]"), Expr::Index { index: -1, .. }));
    assert!(matches!(parse("xs[*]"), Expr::Wildcard { .. }));
    match parse(r#"xs["key"]"#) {
        Expr::Member { name, .. } => assert_eq!(name, "key"),
        other => panic!("expected string bracket as member access, got {:?}", other),
    }
}

#[test]
fn test_bracket_expression_is_a_predicate() {
    let expr = parse("items[price > 50]");
    match expr {
        Expr::Predicate { condition, .. } => {
            assert!(matches!(
                *condition,
                Expr::Binary {
                    op: BinOp::GreaterThan,
                    ..
                }
            ));
        }
        other => panic!("expected a predicate, got {:?}", other),
    }
}

#[test]
fn test_recursive_descent() {
    match parse("input..name") {
        Expr::Descend {
            key: DescendKey::Name(name),
            ..
        } => assert_eq!(name, "name"),
        other => panic!("expected recursive descent, got {:?}", other),
    }
    assert!(matches!(
        parse("input..*"),
        Expr::Descend {
            key: DescendKey::Wildcard,
            ..
        }
    ));
}

#[test]
fn test_attribute_access() {
    match parse("node.@id") {
        Expr::Attribute { name, .. } => assert_eq!(name, "id"),
        other => panic!("expected attribute access, got {:?}", other),
    }
    assert!(matches!(parse("node@id"), Expr::Attribute { .. }));
}

// ============================================================================
// Lambdas, let chains, pipes
// ============================================================================

#[test]
fn test_single_parameter_lambda() {
    match parse("x => x + 1") {
        Expr::Lambda { params, .. } => assert_eq!(params, vec!["x".to_string()]),
        other => panic!("expected a lambda, got {:?}", other),
    }
}

#[test]
fn test_parenthesized_lambda_parameters() {
    match parse("(a, b) => a + b") {
        Expr::Lambda { params, .. } => {
            assert_eq!(params, vec!["a".to_string(), "b".to_string()])
        }
        other => panic!("expected a lambda, got {:?}", other),
    }
}

#[test]
fn test_parenthesized_group_is_not_a_lambda() {
    assert!(matches!(parse("(a)"), Expr::Identifier { .. }));
}

#[test]
fn test_let_chain_nests_rightward() {
    match parse("let a = 1, let b = a + 1, a + b") {
        Expr::Let { name, body, .. } => {
            assert_eq!(name, "a");
            assert!(matches!(*body, Expr::Let { .. }));
        }
        other => panic!("expected a let chain, got {:?}", other),
    }
}

#[test]
fn test_pipe_chain() {
    match parse("xs |> filter(f) |> count()") {
        Expr::Pipe { source, target } => {
            assert!(matches!(*source, Expr::Identifier { .. }));
            assert!(matches!(*target, Expr::Pipe { .. }));
        }
        other => panic!("expected a pipe, got {:?}", other),
    }
}

// ============================================================================
// Object literals and conditionals
// ============================================================================

#[test]
fn test_object_literal_attribute_keys() {
    match parse(r#"{ @id: "5", "@ns": "x", val: 1 }"#) {
        Expr::Object(properties) => {
            assert_eq!(properties.len(), 3);
            assert!(properties[0].is_attribute);
            assert_eq!(properties[0].key, "id");
            assert!(properties[1].is_attribute);
            assert_eq!(properties[1].key, "ns");
            assert!(!properties[2].is_attribute);
        }
        other => panic!("expected an object literal, got {:?}", other),
    }
}

#[test]
fn test_empty_literals_are_valid() {
    assert!(matches!(parse("{}"), Expr::Object(ref p) if p.is_empty()));
    assert!(matches!(parse("[]"), Expr::Array(ref e) if e.is_empty()));
}

#[test]
fn test_trailing_commas_are_rejected() {
    assert!(matches!(
        compile_expression("{a: 1,}"),
        Err(CompileError::Parse(_))
    ));
    assert!(matches!(
        compile_expression("[1, 2,]"),
        Err(CompileError::Parse(_))
    ));
}

#[test]
fn test_if_requires_else() {
    let result = compile_expression("if (true) 1");
    assert!(matches!(result, Err(CompileError::Parse(_))));
}

#[test]
fn test_else_if_chain() {
    match parse("if (a) 1 else if (b) 2 else 3") {
        Expr::If {
            else_ifs,
            else_branch,
            ..
        } => {
            assert_eq!(else_ifs.len(), 1);
            assert!(matches!(*else_branch, Expr::Integer(3)));
        }
        other => panic!("expected a conditional, got {:?}", other),
    }
}

#[test]
fn test_same_source_parses_identically() {
    let source = r#"let n = 2, input.items[price > n] |> map(i => { @id: i.sku, total: i.qty * i.price })"#;
    assert_eq!(parse(source), parse(source));
}

#[test]
fn test_trailing_tokens_are_rejected() {
    assert!(matches!(
        compile_expression("1 + 2 3"),
        Err(CompileError::Parse(_))
    ));
}
