//! Lifting decorator call arguments into JSON values.
//!
//! Literal arguments keep their structure so collectors can store them as
//! data. Anything that only has meaning at runtime (identifiers, calls,
//! arrow functions) is kept as its source text.

use serde_json::{Map, Number, Value};
use tree_sitter::Node;

/// Converts an argument expression node into a JSON value.
pub fn lift_value(node: Node<'_>, source: &[u8]) -> Value {
    match node.kind() {
        "string" => Value::String(string_literal(node, source)),
        "template_string" => template_literal(node, source),
        "number" => number_literal(node_text(node, source)),
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" | "undefined" => Value::Null,
        "array" => Value::Array(
            named_children(node)
                .map(|child| lift_value(child, source))
                .collect(),
        ),
        "object" => object_literal(node, source),
        "unary_expression" => unary_literal(node, source),
        "parenthesized_expression" => match named_children(node).next() {
            Some(inner) => lift_value(inner, source),
            None => raw(node, source),
        },
        _ => raw(node, source),
    }
}

/// Returns the node's source text, or an empty string on invalid UTF-8.
pub fn node_text<'a>(node: Node<'_>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or_default()
}

/// Iterates over named, non-comment children.
pub fn named_children<'tree>(node: Node<'tree>) -> impl Iterator<Item = Node<'tree>> {
    (0..node.named_child_count())
        .filter_map(move |i| node.named_child(i))
        .filter(|child| child.kind() != "comment")
}

/// Decodes a quoted string literal.
pub fn string_literal(node: Node<'_>, source: &[u8]) -> String {
    let mut out = String::new();
    for child in named_children(node) {
        match child.kind() {
            "escape_sequence" => push_escape(&mut out, node_text(child, source)),
            _ => out.push_str(node_text(child, source)),
        }
    }
    out
}

fn push_escape(out: &mut String, escape: &str) {
    let mut chars = escape.chars().skip(1);
    match chars.next() {
        Some('n') => out.push('\n'),
        Some('t') => out.push('\t'),
        Some('r') => out.push('\r'),
        Some('0') => out.push('\0'),
        Some('u') => {
            let hex: String = chars.filter(char::is_ascii_hexdigit).collect();
            match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                Some(c) => out.push(c),
                None => out.push_str(escape),
            }
        }
        Some(other) => out.push(other),
        None => {}
    }
}

fn template_literal(node: Node<'_>, source: &[u8]) -> Value {
    if named_children(node).any(|child| child.kind() == "template_substitution") {
        return raw(node, source);
    }
    let text = node_text(node, source);
    let inner = text
        .strip_prefix('`')
        .and_then(|t| t.strip_suffix('`'))
        .unwrap_or(text);
    Value::String(inner.to_owned())
}

fn number_literal(text: &str) -> Value {
    let cleaned = text.replace('_', "");
    if let Ok(int) = cleaned.parse::<i64>() {
        return Value::Number(int.into());
    }
    cleaned
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(text.to_owned()), Value::Number)
}

fn unary_literal(node: Node<'_>, source: &[u8]) -> Value {
    let operator = node
        .child_by_field_name("operator")
        .map(|op| node_text(op, source));
    let argument = node.child_by_field_name("argument");

    match (operator, argument) {
        (Some("-"), Some(arg)) if arg.kind() == "number" => {
            number_literal(&format!("-{}", node_text(arg, source)))
        }
        (Some("!"), Some(arg)) => match lift_value(arg, source) {
            Value::Bool(b) => Value::Bool(!b),
            _ => raw(node, source),
        },
        _ => raw(node, source),
    }
}

fn object_literal(node: Node<'_>, source: &[u8]) -> Value {
    let mut map = Map::new();
    for child in named_children(node) {
        match child.kind() {
            "pair" => {
                let Some(key) = child.child_by_field_name("key") else {
                    continue;
                };
                let value = child
                    .child_by_field_name("value")
                    .map_or(Value::Null, |v| lift_value(v, source));
                map.insert(property_key(key, source), value);
            }
            "shorthand_property_identifier" => {
                let name = node_text(child, source).to_owned();
                map.insert(name.clone(), Value::String(name));
            }
            _ => {}
        }
    }
    Value::Object(map)
}

/// Reads an object key or member name, unquoting string keys.
pub fn property_key(node: Node<'_>, source: &[u8]) -> String {
    match node.kind() {
        "string" => string_literal(node, source),
        _ => node_text(node, source).to_owned(),
    }
}

fn raw(node: Node<'_>, source: &[u8]) -> Value {
    Value::String(node_text(node, source).to_owned())
}
