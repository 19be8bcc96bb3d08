// tests/evaluator_tests.rs

use graft_lang::ast::Format;
use graft_lang::format::parser_for;
use graft_lang::{compile_expression, Builtins, EvalError, Evaluator, Node};

fn eval(source: &str, input_json: &str) -> Result<Node, EvalError> {
    let expr = compile_expression(source).unwrap();
    let input = parser_for(Format::Json).unwrap().parse(input_json).unwrap();
    let registry = Builtins::new();
    let evaluator = Evaluator::new(&registry);
    evaluator.eval_expression(&expr, input)
}

fn eval_ok(source: &str, input_json: &str) -> Node {
    eval(source, input_json).unwrap()
}

// ============================================================================
// Bindings and scoping
// ============================================================================

#[test]
fn test_let_chain_sees_earlier_bindings() {
    let result = eval_ok("let a = 1, let b = a + 1, b + a", "null");
    assert_eq!(result, Node::Integer(3));
}

#[test]
fn test_binding_is_not_visible_outside_its_chain() {
    let result = eval("(let a = 1, a) + a", "null");
    assert!(matches!(
        result,
        Err(EvalError::UndefinedVariable { ref name, .. }) if name == "a"
    ));
}

#[test]
fn test_inner_binding_shadows_outer() {
    let result = eval_ok("let x = 1, let x = x + 1, x", "null");
    assert_eq!(result, Node::Integer(2));
}

#[test]
fn test_input_is_an_ordinary_binding() {
    let result = eval_ok("let input = 5, input", "{\"a\": 1}");
    assert_eq!(result, Node::Integer(5));
}

#[test]
fn test_closures_capture_their_defining_scope() {
    let result = eval_ok("let n = 10, let f = x => x + n, let n = 99, f(1)", "null");
    assert_eq!(result, Node::Integer(11));
}

#[test]
fn test_closure_capture_survives_the_registry_boundary() {
    let result = eval_ok("let n = 10, map([1, 2], x => x + n)", "null");
    assert_eq!(
        result,
        Node::Array(vec![Node::Integer(11), Node::Integer(12)])
    );
}

// ============================================================================
// Pipes
// ============================================================================

#[test]
fn test_pipe_threads_left_to_right() {
    let result = eval_ok(
        "let add1 = x => x + 1, let double = x => x * 2, 5 |> add1 |> double",
        "null",
    );
    assert_eq!(result, Node::Integer(12));
}

#[test]
fn test_piped_value_becomes_the_first_argument() {
    let result = eval_ok("[3, 1, 2] |> sort() |> first()", "null");
    assert_eq!(result, Node::Integer(1));
}

#[test]
fn test_pipe_into_lambda_literal() {
    let result = eval_ok("4 |> (x => x * x)", "null");
    assert_eq!(result, Node::Integer(16));
}

#[test]
fn test_pipe_into_a_non_function_fails() {
    let result = eval("let v = 1, 5 |> v", "null");
    assert!(matches!(result, Err(EvalError::UndefinedFunction { .. })));
}

#[test]
fn test_pipe_with_extra_arguments() {
    let result = eval_ok("[1, 2, 3] |> map(x => x * 10) |> join(\",\")", "null");
    assert_eq!(result, Node::String("10,20,30".to_string()));
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn test_member_access() {
    let result = eval_ok("input.user.name", r#"{"user": {"name": "ada"}}"#);
    assert_eq!(result, Node::String("ada".to_string()));
}

#[test]
fn test_absent_member_is_null_not_an_error() {
    assert_eq!(eval_ok("input.missing", r#"{"a": 1}"#), Node::Null);
    assert_eq!(eval_ok("input.missing.deeper", r#"{"a": 1}"#), Node::Null);
    assert_eq!(eval_ok("input.a.b", r#"{"a": 1}"#), Node::Null);
}

#[test]
fn test_negative_index_counts_from_the_end() {
    assert_eq!(eval_ok("input[-1]", "[1, 2, 3]"), Node::Integer(3));
    assert_eq!(eval_ok("input[0]", "[1, 2, 3]"), Node::Integer(1));
    assert_eq!(eval_ok("input[9]", "[1, 2, 3]"), Node::Null);
}

#[test]
fn test_wildcard_collects_all_values() {
    let result = eval_ok("input.*", r#"{"a": 1, "b": 2}"#);
    assert_eq!(
        result,
        Node::Array(vec![Node::Integer(1), Node::Integer(2)])
    );
}

#[test]
fn test_wildcard_on_a_scalar_is_an_empty_array() {
    assert_eq!(eval_ok("input.*", "5"), Node::Array(vec![]));
}

#[test]
fn test_recursive_descent_is_preorder() {
    let doc = r#"{"a": {"name": "x", "b": {"name": "y"}}}"#;
    let result = eval_ok("input..name", doc);
    assert_eq!(
        result,
        Node::Array(vec![
            Node::String("x".to_string()),
            Node::String("y".to_string()),
        ])
    );
}

#[test]
fn test_member_after_wildcard_maps_over_every_match() {
    let doc = r#"{"users": [{"name": "ada"}, {"name": "grace"}]}"#;
    assert_eq!(
        eval_ok("input.users.*.name", doc),
        Node::Array(vec![
            Node::String("ada".to_string()),
            Node::String("grace".to_string()),
        ])
    );

    // elements without the property drop out of the match set
    let sparse = r#"{"users": [{"name": "ada"}, {"id": 2}]}"#;
    assert_eq!(
        eval_ok("input.users.*.name", sparse),
        Node::Array(vec![Node::String("ada".to_string())])
    );
}

#[test]
fn test_member_after_recursive_descent_maps_over_every_match() {
    let doc = r#"{"a": {"item": {"name": "x"}}, "b": {"item": {"name": "y"}}}"#;
    assert_eq!(
        eval_ok("input..item.name", doc),
        Node::Array(vec![
            Node::String("x".to_string()),
            Node::String("y".to_string()),
        ])
    );
}

#[test]
fn test_member_after_predicate_maps_over_every_match() {
    let doc = r#"{"items": [{"sku": "a", "price": 10}, {"sku": "b", "price": 90}]}"#;
    assert_eq!(
        eval_ok("input.items[price > 50].sku", doc),
        Node::Array(vec![Node::String("b".to_string())])
    );
}

#[test]
fn test_predicate_filters_by_element_properties() {
    let doc = r#"{"items": [{"sku": "a", "price": 10}, {"sku": "b", "price": 90}]}"#;
    let result = eval_ok("input.items[price > 50] |> map(i => i.sku)", doc);
    assert_eq!(result, Node::Array(vec![Node::String("b".to_string())]));
}

#[test]
fn test_predicate_item_binding_for_scalars() {
    let result = eval_ok("input[item > 2]", "[1, 2, 3, 4]");
    assert_eq!(
        result,
        Node::Array(vec![Node::Integer(3), Node::Integer(4)])
    );
}

#[test]
fn test_non_boolean_predicate_is_a_navigation_error() {
    let result = eval("input[price]", r#"[{"price": 10}]"#);
    assert!(matches!(result, Err(EvalError::NavigationError { .. })));
}

#[test]
fn test_attribute_access_reads_metadata() {
    let doc = r#"{"node": {"@id": "5", "val": 1}}"#;
    assert_eq!(
        eval_ok("input.node.@id", doc),
        Node::String("5".to_string())
    );
    assert_eq!(eval_ok("input.node.@missing", doc), Node::Null);
}

// ============================================================================
// Object construction
// ============================================================================

#[test]
fn test_attribute_properties_land_in_metadata() {
    let result = eval_ok(r#"{ @id: 5, val: 1 }"#, "null");
    match result {
        Node::Object(object) => {
            assert_eq!(object.metadata.attribute("id"), Some("5"));
            assert_eq!(object.entries, vec![("val".to_string(), Node::Integer(1))]);
        }
        other => panic!("expected an object, got {:?}", other),
    }
}

#[test]
fn test_non_scalar_attribute_value_is_a_type_error() {
    let result = eval(r#"{ @id: [1, 2] }"#, "null");
    assert!(matches!(result, Err(EvalError::TypeError { .. })));
}

#[test]
fn test_object_equality_is_order_sensitive() {
    assert_eq!(
        eval_ok(r#"{a: 1, b: 2} == {b: 2, a: 1}"#, "null"),
        Node::Boolean(false)
    );
    assert_eq!(
        eval_ok(r#"{a: 1, b: 2} == {a: 1, b: 2}"#, "null"),
        Node::Boolean(true)
    );
}

// ============================================================================
// Arithmetic and conditionals
// ============================================================================

#[test]
fn test_exact_mixed_arithmetic_stays_integer() {
    assert_eq!(eval_ok("1 + 2.0", "null"), Node::Integer(3));
    assert_eq!(eval_ok("2 * 1.5", "null"), Node::Integer(3));
    assert_eq!(eval_ok("1 + 0.5", "null"), Node::Float(1.5));
    assert_eq!(eval_ok("10 / 4", "null"), Node::Float(2.5));
    assert_eq!(eval_ok("10 / 5", "null"), Node::Integer(2));
}

#[test]
fn test_integer_overflow_is_a_type_error() {
    let max = i64::MAX.to_string();
    assert!(matches!(
        eval(&format!("{} + 1", max), "null"),
        Err(EvalError::TypeError { .. })
    ));
    assert!(matches!(
        eval(&format!("{} * 2", max), "null"),
        Err(EvalError::TypeError { .. })
    ));
    assert!(matches!(
        eval(&format!("0 - {} - 2", max), "null"),
        Err(EvalError::TypeError { .. })
    ));
}

#[test]
fn test_division_by_integer_zero_is_a_type_error() {
    assert!(matches!(eval("1 / 0", "null"), Err(EvalError::TypeError { .. })));
    assert!(matches!(eval("1 % 0", "null"), Err(EvalError::TypeError { .. })));
}

#[test]
fn test_if_condition_must_be_boolean() {
    let result = eval("if (1) 2 else 3", "null");
    assert!(matches!(result, Err(EvalError::TypeError { .. })));
}

#[test]
fn test_else_if_chain_takes_the_first_true_branch() {
    let result = eval_ok(
        "let n = 5, if (n < 0) \"neg\" else if (n == 0) \"zero\" else \"pos\"",
        "null",
    );
    assert_eq!(result, Node::String("pos".to_string()));
}

#[test]
fn test_logical_operators_reject_non_booleans() {
    assert!(matches!(
        eval("1 && true", "null"),
        Err(EvalError::TypeError { .. })
    ));
}

#[test]
fn test_short_circuit_skips_the_right_operand() {
    // boom() would be undefined; && must not reach it
    assert_eq!(eval_ok("false && boom()", "null"), Node::Boolean(false));
    assert_eq!(eval_ok("true || boom()", "null"), Node::Boolean(true));
}

#[test]
fn test_string_concatenation_and_comparison() {
    assert_eq!(
        eval_ok(r#""ab" + "cd""#, "null"),
        Node::String("abcd".to_string())
    );
    assert_eq!(eval_ok(r#""apple" < "banana""#, "null"), Node::Boolean(true));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_undefined_function_is_reported_by_name() {
    match eval("frobnicate(1)", "null") {
        Err(EvalError::UndefinedFunction { name, pos }) => {
            assert_eq!(name, "frobnicate");
            assert_eq!(pos.line, 1);
        }
        other => panic!("expected an undefined function error, got {:?}", other),
    }
}

#[test]
fn test_closure_arity_is_checked() {
    match eval("let f = (a, b) => a + b, f(1)", "null") {
        Err(EvalError::ArityError { expected, got, .. }) => {
            assert_eq!((expected, got), (2, 1));
        }
        other => panic!("expected an arity error, got {:?}", other),
    }
}

#[test]
fn test_lambda_error_keeps_its_own_position() {
    // the failure is inside the lambda body, not at the map call
    let result = eval("map([1], x => y)", "null");
    assert!(matches!(
        result,
        Err(EvalError::UndefinedVariable { ref name, .. }) if name == "y"
    ));
}
