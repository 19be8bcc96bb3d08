//! The built-in function library.
//!
//! Everything here works on plain `Node` values; lambdas arrive as opaque
//! callables and are invoked without knowing anything about the
//! interpreter behind them. Names are resolved by [`Builtins`], the
//! default [`FunctionRegistry`] wired up by the CLI.

use std::collections::HashMap;

use regex::Regex;

use crate::registry::{Argument, Callable, FunctionRegistry, RegistryError};
use crate::udm::Node;

type BuiltinFn = for<'a> fn(Vec<Argument<'a>>) -> Result<Node, RegistryError>;

struct Builtin(BuiltinFn);

impl Callable for Builtin {
    fn call(&self, args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
        (self.0)(args)
    }
}

/// The default registry: a fixed name table of the standard library.
pub struct Builtins {
    table: HashMap<&'static str, Builtin>,
}

impl Builtins {
    pub fn new() -> Self {
        let mut table: HashMap<&'static str, Builtin> = HashMap::new();
        let mut add = |name: &'static str, f: BuiltinFn| {
            table.insert(name, Builtin(f));
        };

        add("map", builtin_map);
        add("filter", builtin_filter);
        add("reduce", builtin_reduce);
        add("count", builtin_count);
        add("sum", builtin_sum);
        add("min", builtin_min);
        add("max", builtin_max);
        add("avg", builtin_avg);
        add("first", builtin_first);
        add("last", builtin_last);
        add("flatten", builtin_flatten);
        add("reverse", builtin_reverse);
        add("sort", builtin_sort);
        add("unique", builtin_unique);
        add("join", builtin_join);
        add("upper", builtin_upper);
        add("lower", builtin_lower);
        add("trim", builtin_trim);
        add("split", builtin_split);
        add("contains", builtin_contains);
        add("startsWith", builtin_starts_with);
        add("endsWith", builtin_ends_with);
        add("matches", builtin_matches);
        add("keys", builtin_keys);
        add("values", builtin_values);
        add("typeOf", builtin_type_of);

        Builtins { table }
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Builtins::new()
    }
}

impl FunctionRegistry for Builtins {
    fn lookup(&self, name: &str) -> Option<&dyn Callable> {
        self.table.get(name).map(|b| b as &dyn Callable)
    }
}

fn take<'a, const N: usize>(args: Vec<Argument<'a>>) -> Result<[Argument<'a>; N], RegistryError> {
    let got = args.len();
    args.try_into().map_err(|_| RegistryError::Arity { expected: N, got })
}

fn into_array(arg: Argument<'_>, what: &str) -> Result<Vec<Node>, RegistryError> {
    match arg.into_value(what)? {
        Node::Array(elements) => Ok(elements),
        other => Err(RegistryError::Type(format!(
            "{} must be an array, got {}",
            what,
            other.type_name()
        ))),
    }
}

fn into_string(arg: Argument<'_>, what: &str) -> Result<String, RegistryError> {
    match arg.into_value(what)? {
        Node::String(s) => Ok(s),
        other => Err(RegistryError::Type(format!(
            "{} must be a string, got {}",
            what,
            other.type_name()
        ))),
    }
}

fn as_number(node: &Node, what: &str) -> Result<f64, RegistryError> {
    node.as_float().ok_or_else(|| {
        RegistryError::Type(format!("{} must be a number, got {}", what, node.type_name()))
    })
}

fn builtin_map(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [array, f] = take::<2>(args)?;
    let elements = into_array(array, "first argument")?;
    let f = f.as_function("second argument")?;
    let mut out = Vec::with_capacity(elements.len());
    for element in elements {
        out.push(f(&[element])?);
    }
    Ok(Node::Array(out))
}

fn builtin_filter(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [array, f] = take::<2>(args)?;
    let elements = into_array(array, "first argument")?;
    let f = f.as_function("second argument")?;
    let mut out = Vec::new();
    for element in elements {
        match f(std::slice::from_ref(&element))? {
            Node::Boolean(true) => out.push(element),
            Node::Boolean(false) => {}
            other => {
                return Err(RegistryError::Type(format!(
                    "predicate must return a boolean, got {}",
                    other.type_name()
                )))
            }
        }
    }
    Ok(Node::Array(out))
}

fn builtin_reduce(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [array, f, init] = take::<3>(args)?;
    let elements = into_array(array, "first argument")?;
    let f = f.as_function("second argument")?;
    let mut accumulator = init.into_value("third argument")?;
    for element in elements {
        accumulator = f(&[accumulator, element])?;
    }
    Ok(accumulator)
}

fn builtin_count(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [array] = take::<1>(args)?;
    let elements = into_array(array, "argument")?;
    Ok(Node::Integer(elements.len() as i64))
}

fn builtin_sum(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [array] = take::<1>(args)?;
    let elements = into_array(array, "argument")?;
    let mut int_sum: Option<i64> = Some(0);
    let mut float_sum = 0.0;
    let mut all_integers = true;
    for element in &elements {
        match element {
            Node::Integer(n) => {
                int_sum = int_sum.and_then(|sum| sum.checked_add(*n));
                float_sum += *n as f64;
            }
            Node::Float(n) => {
                all_integers = false;
                float_sum += n;
            }
            other => {
                return Err(RegistryError::Type(format!(
                    "elements must be numbers, got {}",
                    other.type_name()
                )))
            }
        }
    }
    if all_integers {
        int_sum
            .map(Node::Integer)
            .ok_or_else(|| RegistryError::Type("integer overflow in 'sum'".to_string()))
    } else {
        Ok(Node::Float(float_sum))
    }
}

fn numeric_extreme(elements: Vec<Node>, want_max: bool) -> Result<Node, RegistryError> {
    let mut best: Option<(f64, Node)> = None;
    for element in elements {
        let value = as_number(&element, "elements")?;
        let better = match &best {
            None => true,
            Some((b, _)) => {
                if want_max {
                    value > *b
                } else {
                    value < *b
                }
            }
        };
        if better {
            best = Some((value, element));
        }
    }
    Ok(best.map(|(_, node)| node).unwrap_or(Node::Null))
}

fn builtin_min(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [array] = take::<1>(args)?;
    numeric_extreme(into_array(array, "argument")?, false)
}

fn builtin_max(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [array] = take::<1>(args)?;
    numeric_extreme(into_array(array, "argument")?, true)
}

fn builtin_avg(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [array] = take::<1>(args)?;
    let elements = into_array(array, "argument")?;
    if elements.is_empty() {
        return Ok(Node::Null);
    }
    let mut sum = 0.0;
    for element in &elements {
        sum += as_number(element, "elements")?;
    }
    Ok(Node::Float(sum / elements.len() as f64))
}

fn builtin_first(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [array] = take::<1>(args)?;
    let mut elements = into_array(array, "argument")?;
    if elements.is_empty() {
        Ok(Node::Null)
    } else {
        Ok(elements.swap_remove(0))
    }
}

fn builtin_last(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [array] = take::<1>(args)?;
    let mut elements = into_array(array, "argument")?;
    Ok(elements.pop().unwrap_or(Node::Null))
}

// One level only; nested arrays below the first level are kept as-is.
fn builtin_flatten(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [array] = take::<1>(args)?;
    let elements = into_array(array, "argument")?;
    let mut out = Vec::new();
    for element in elements {
        match element {
            Node::Array(inner) => out.extend(inner),
            other => out.push(other),
        }
    }
    Ok(Node::Array(out))
}

fn builtin_reverse(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [array] = take::<1>(args)?;
    let mut elements = into_array(array, "argument")?;
    elements.reverse();
    Ok(Node::Array(elements))
}

fn builtin_sort(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [array] = take::<1>(args)?;
    let mut elements = into_array(array, "argument")?;
    if elements.is_empty() {
        return Ok(Node::Array(elements));
    }
    if elements.iter().all(|e| matches!(e, Node::String(_))) {
        elements.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
        return Ok(Node::Array(elements));
    }
    if elements.iter().all(|e| e.as_float().is_some()) {
        elements.sort_by(|a, b| {
            let (a, b) = (a.as_float(), b.as_float());
            a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
        });
        return Ok(Node::Array(elements));
    }
    Err(RegistryError::Type(
        "elements must be all numbers or all strings".to_string(),
    ))
}

fn builtin_unique(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [array] = take::<1>(args)?;
    let elements = into_array(array, "argument")?;
    let mut out: Vec<Node> = Vec::new();
    for element in elements {
        if !out.contains(&element) {
            out.push(element);
        }
    }
    Ok(Node::Array(out))
}

fn builtin_join(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [array, separator] = take::<2>(args)?;
    let elements = into_array(array, "first argument")?;
    let separator = into_string(separator, "second argument")?;
    let mut parts = Vec::with_capacity(elements.len());
    for element in &elements {
        let part = element.coerce_string().ok_or_else(|| {
            RegistryError::Type(format!(
                "elements must be scalars, got {}",
                element.type_name()
            ))
        })?;
        parts.push(part);
    }
    Ok(Node::String(parts.join(&separator)))
}

fn builtin_upper(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [s] = take::<1>(args)?;
    Ok(Node::String(into_string(s, "argument")?.to_uppercase()))
}

fn builtin_lower(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [s] = take::<1>(args)?;
    Ok(Node::String(into_string(s, "argument")?.to_lowercase()))
}

fn builtin_trim(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [s] = take::<1>(args)?;
    Ok(Node::String(into_string(s, "argument")?.trim().to_string()))
}

fn builtin_split(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [s, separator] = take::<2>(args)?;
    let s = into_string(s, "first argument")?;
    let separator = into_string(separator, "second argument")?;
    let parts = s
        .split(&separator)
        .map(|part| Node::String(part.to_string()))
        .collect();
    Ok(Node::Array(parts))
}

/// Substring test on strings, membership test on arrays.
fn builtin_contains(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [haystack, needle] = take::<2>(args)?;
    match haystack.into_value("first argument")? {
        Node::String(s) => {
            let needle = into_string(needle, "second argument")?;
            Ok(Node::Boolean(s.contains(&needle)))
        }
        Node::Array(elements) => {
            let needle = needle.into_value("second argument")?;
            Ok(Node::Boolean(elements.contains(&needle)))
        }
        other => Err(RegistryError::Type(format!(
            "first argument must be a string or array, got {}",
            other.type_name()
        ))),
    }
}

fn builtin_starts_with(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [s, prefix] = take::<2>(args)?;
    let s = into_string(s, "first argument")?;
    let prefix = into_string(prefix, "second argument")?;
    Ok(Node::Boolean(s.starts_with(&prefix)))
}

fn builtin_ends_with(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [s, suffix] = take::<2>(args)?;
    let s = into_string(s, "first argument")?;
    let suffix = into_string(suffix, "second argument")?;
    Ok(Node::Boolean(s.ends_with(&suffix)))
}

fn builtin_matches(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [s, pattern] = take::<2>(args)?;
    let s = into_string(s, "first argument")?;
    let pattern = into_string(pattern, "second argument")?;
    let regex = Regex::new(&pattern)
        .map_err(|e| RegistryError::Type(format!("invalid pattern: {}", e)))?;
    Ok(Node::Boolean(regex.is_match(&s)))
}

fn builtin_keys(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [object] = take::<1>(args)?;
    match object.into_value("argument")? {
        Node::Object(obj) => Ok(Node::Array(
            obj.entries
                .iter()
                .map(|(key, _)| Node::String(key.clone()))
                .collect(),
        )),
        other => Err(RegistryError::Type(format!(
            "argument must be an object, got {}",
            other.type_name()
        ))),
    }
}

fn builtin_values(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [object] = take::<1>(args)?;
    match object.into_value("argument")? {
        Node::Object(obj) => Ok(Node::Array(
            obj.entries.into_iter().map(|(_, value)| value).collect(),
        )),
        other => Err(RegistryError::Type(format!(
            "argument must be an object, got {}",
            other.type_name()
        ))),
    }
}

fn builtin_type_of(args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
    let [value] = take::<1>(args)?;
    let value = value.into_value("argument")?;
    Ok(Node::String(value.type_name().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Argument<'_>>) -> Result<Node, RegistryError> {
        let registry = Builtins::new();
        registry.lookup(name).unwrap().call(args)
    }

    fn values(nodes: Vec<Node>) -> Argument<'static> {
        Argument::Value(Node::Array(nodes))
    }

    #[test]
    fn sum_stays_integer_for_integer_input() {
        let result = call(
            "sum",
            vec![values(vec![Node::Integer(1), Node::Integer(2), Node::Integer(3)])],
        )
        .unwrap();
        assert_eq!(result, Node::Integer(6));
    }

    #[test]
    fn sum_goes_float_when_any_element_is_float() {
        let result = call(
            "sum",
            vec![values(vec![Node::Integer(1), Node::Float(0.5)])],
        )
        .unwrap();
        assert_eq!(result, Node::Float(1.5));
    }

    #[test]
    fn sum_reports_integer_overflow() {
        let result = call(
            "sum",
            vec![values(vec![Node::Integer(i64::MAX), Node::Integer(1)])],
        );
        assert!(matches!(result, Err(RegistryError::Type(_))));
    }

    #[test]
    fn sum_with_a_float_ignores_integer_overflow() {
        let result = call(
            "sum",
            vec![values(vec![
                Node::Integer(i64::MAX),
                Node::Integer(1),
                Node::Float(0.5),
            ])],
        )
        .unwrap();
        assert!(matches!(result, Node::Float(_)));
    }

    #[test]
    fn map_applies_the_callable() {
        let double = Argument::Function(Box::new(|args: &[Node]| match &args[0] {
            Node::Integer(n) => Ok(Node::Integer(n * 2)),
            other => Err(RegistryError::Type(format!("got {}", other.type_name()))),
        }));
        let result = call(
            "map",
            vec![values(vec![Node::Integer(1), Node::Integer(2)]), double],
        )
        .unwrap();
        assert_eq!(
            result,
            Node::Array(vec![Node::Integer(2), Node::Integer(4)])
        );
    }

    #[test]
    fn filter_rejects_non_boolean_predicate_results() {
        let bad = Argument::Function(Box::new(|_: &[Node]| Ok(Node::Integer(1))));
        let result = call("filter", vec![values(vec![Node::Integer(1)]), bad]);
        assert!(matches!(result, Err(RegistryError::Type(_))));
    }

    #[test]
    fn flatten_is_one_level_deep() {
        let nested = vec![
            Node::Array(vec![Node::Integer(1), Node::Array(vec![Node::Integer(2)])]),
            Node::Integer(3),
        ];
        let result = call("flatten", vec![values(nested)]).unwrap();
        assert_eq!(
            result,
            Node::Array(vec![
                Node::Integer(1),
                Node::Array(vec![Node::Integer(2)]),
                Node::Integer(3),
            ])
        );
    }

    #[test]
    fn unique_keeps_first_occurrences() {
        let result = call(
            "unique",
            vec![values(vec![
                Node::Integer(1),
                Node::Integer(2),
                Node::Integer(1),
            ])],
        )
        .unwrap();
        assert_eq!(result, Node::Array(vec![Node::Integer(1), Node::Integer(2)]));
    }

    #[test]
    fn wrong_arity_is_reported() {
        let result = call("count", vec![]);
        assert!(matches!(
            result,
            Err(RegistryError::Arity { expected: 1, got: 0 })
        ));
    }

    #[test]
    fn matches_uses_real_regex_syntax() {
        let result = call(
            "matches",
            vec![
                Argument::Value(Node::String("abc123".to_string())),
                Argument::Value(Node::String(r"^[a-z]+\d+$".to_string())),
            ],
        )
        .unwrap();
        assert_eq!(result, Node::Boolean(true));
    }

    #[test]
    fn min_of_empty_array_is_null() {
        let result = call("min", vec![values(vec![])]).unwrap();
        assert_eq!(result, Node::Null);
    }
}
