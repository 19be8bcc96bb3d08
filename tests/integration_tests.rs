// tests/integration_tests.rs
//
// End-to-end runs through the same path the binary takes: script text and
// input text in, serialized output text out.

use graft_lang::cli::{execute_transform, CliError, TransformOptions};

fn run(script: &str, input: &str) -> Result<String, CliError> {
    execute_transform(&TransformOptions {
        script: script.to_string(),
        input: Some(input.to_string()),
        pretty: false,
    })
}

#[test]
fn test_json_to_json_reshaping() {
    let script = r#"%graft 1.0
input json
output json
---
{
  names: input.users |> map(u => u.name),
  total: count(input.users)
}"#;
    let input = r#"{"users": [{"name": "ada"}, {"name": "grace"}]}"#;
    assert_eq!(
        run(script, input).unwrap(),
        r#"{"names":["ada","grace"],"total":2}"#
    );
}

#[test]
fn test_top_level_function_definitions() {
    let script = r#"%graft 1.0
input json
output json
---
function add(a, b) = a + b
function double(x) = x * 2

input.n |> add(1) |> double"#;
    assert_eq!(run(script, r#"{"n": 5}"#).unwrap(), "12");
}

#[test]
fn test_functions_can_call_each_other() {
    let script = r#"%graft 1.0
input json
output json
---
function area(r) = r * r * 3
function total(rs) = sum(map(rs, area))

total(input)"#;
    assert_eq!(run(script, "[1, 2]").unwrap(), "15");
}

#[test]
fn test_json_to_yaml() {
    let script = "%graft 1.0\ninput json\noutput yaml\n---\n{ a: input.x }";
    let output = run(script, r#"{"x": 1}"#).unwrap();
    assert_eq!(output.trim(), "a: 1");
}

#[test]
fn test_csv_to_json_with_inference() {
    let script = "%graft 1.0\ninput csv\noutput json\n---\ninput |> map(r => r.qty)";
    let output = run(script, "name,qty\nbolt,3\nnut,7\n").unwrap();
    assert_eq!(output, "[3,7]");
}

#[test]
fn test_json_to_csv() {
    let script = "%graft 1.0\ninput json\noutput csv\n---\ninput.rows";
    let input = r#"{"rows": [{"a": 1, "b": "x"}, {"a": 2, "b": "y"}]}"#;
    assert_eq!(run(script, input).unwrap(), "a,b\n1,x\n2,y\n");
}

#[test]
fn test_attributes_survive_a_round_trip() {
    let script = "%graft 1.0\ninput json\noutput json\n---\ninput";
    let input = r#"{"@id":"5","val":1}"#;
    assert_eq!(run(script, input).unwrap(), input);
}

#[test]
fn test_comments_are_allowed_in_the_body() {
    let script = "%graft 1.0\ninput json\noutput json\n---\n// sum of all values\nsum(input.*) /* trailing */";
    assert_eq!(run(script, r#"{"a": 1, "b": 2}"#).unwrap(), "3");
}

#[test]
fn test_xml_is_declared_but_unsupported() {
    let script = "%graft 1.0\ninput xml\noutput json\n---\ninput";
    let result = run(script, "<a/>");
    assert!(matches!(result, Err(CliError::Format(_))));
}

#[test]
fn test_runtime_errors_surface_with_positions() {
    let script = "%graft 1.0\ninput json\noutput json\n---\nlet x = 1,\nnope(x)";
    match run(script, "null") {
        Err(CliError::Eval(e)) => {
            // body starts at line 5; the bad call is on line 6
            assert_eq!(e.position().line, 6);
        }
        other => panic!("expected an eval error, got {:?}", other.err()),
    }
}

#[test]
fn test_malformed_input_document_is_a_format_error() {
    let script = "%graft 1.0\ninput json\noutput json\n---\ninput";
    assert!(matches!(
        run(script, "{not json"),
        Err(CliError::Format(_))
    ));
}

#[test]
fn test_missing_input_is_reported() {
    let result = execute_transform(&TransformOptions {
        script: "%graft 1.0\ninput json\noutput json\n---\n1".to_string(),
        input: None,
        pretty: false,
    });
    assert!(matches!(result, Err(CliError::NoInput)));
}
