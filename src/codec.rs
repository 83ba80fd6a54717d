//! Write side of the settings file format.
//!
//! Renders values into assignment statements of the form
//! `group['k1']['k2'] = <literal>;`. Mappings recurse per key; flat lists of
//! scalars render as one inline `array(...)` literal; booleans (and the
//! stored strings `"TRUE"`/`"FALSE"`) render as bare tokens.

use serde_json::{Map, Value};

/// Render `value` under `prefix`, appending one line per assignment.
///
/// Returns the number of assignment statements emitted. An empty mapping or
/// empty list emits nothing.
pub fn render_assignment(lines: &mut Vec<String>, prefix: &str, value: &Value) -> usize {
    match value {
        Value::Object(map) => {
            if is_flat_list_map(map) {
                lines.push(format!("{} = {};", prefix, inline_array(map.values())));
                1
            } else {
                let mut emitted = 0;
                for (key, child) in map {
                    let child_prefix = format!("{}['{}']", prefix, key);
                    emitted += render_assignment(lines, &child_prefix, child);
                }
                emitted
            }
        }
        Value::Array(items) => {
            if is_flat_list(items) {
                lines.push(format!("{} = {};", prefix, inline_array(items.iter())));
                1
            } else {
                let mut emitted = 0;
                for (index, child) in items.iter().enumerate() {
                    let child_prefix = format!("{}['{}']", prefix, index);
                    emitted += render_assignment(lines, &child_prefix, child);
                }
                emitted
            }
        }
        Value::Bool(flag) => {
            lines.push(format!("{} = {};", prefix, bool_token(*flag)));
            1
        }
        Value::String(text) if text == "TRUE" || text == "FALSE" => {
            lines.push(format!("{} = {};", prefix, text));
            1
        }
        Value::Number(number) => {
            lines.push(format!("{} = {};", prefix, number));
            1
        }
        Value::String(text) => {
            lines.push(format!("{} = {};", prefix, quoted(text)));
            1
        }
        Value::Null => {
            lines.push(format!("{} = '';", prefix));
            1
        }
    }
}

/// A mapping renders as a flat list only when it has an entry at key `"0"`
/// and that entry is itself a scalar; otherwise it is associative.
fn is_flat_list_map(map: &Map<String, Value>) -> bool {
    match map.get("0") {
        Some(first) => !first.is_object() && !first.is_array(),
        None => false,
    }
}

/// Same rule for a sequence: the element at index 0 must exist and be a
/// scalar. An empty list is associative (and renders nothing).
fn is_flat_list(items: &[Value]) -> bool {
    match items.first() {
        Some(first) => !first.is_object() && !first.is_array(),
        None => false,
    }
}

fn inline_array<'a>(items: impl Iterator<Item = &'a Value>) -> String {
    let rendered: Vec<String> = items
        .map(|item| format!("'{}'", escape_single_quoted(&raw_scalar(item))))
        .collect();
    format!("array({})", rendered.join(", "))
}

/// Scalar as stored, before quoting. Mirrors loose string conversion:
/// booleans collapse to `"1"`/`""` and null to `""`.
fn raw_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null => String::new(),
        Value::Object(_) | Value::Array(_) => String::new(),
    }
}

fn bool_token(flag: bool) -> &'static str {
    if flag {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Quote a stored string. Values containing a single quote switch to
/// double-quoted form with embedded double quotes escaped.
fn quoted(text: &str) -> String {
    if text.contains('\'') {
        format!("\"{}\"", escape_double_quoted(text))
    } else {
        format!("'{}'", escape_single_quoted(text))
    }
}

/// Escape a value for a single-quoted literal: backslashes and single quotes.
pub fn escape_single_quoted(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Escape a value for a double-quoted literal: backslashes and double quotes.
pub fn escape_double_quoted(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}
