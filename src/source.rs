//! Read side of the settings file format.
//!
//! Parses statements of the form `root['k1']['k2'] = <literal>;` into nested
//! mappings keyed by root identifier. The parser returns structured data
//! directly; no dynamic variable binding is involved.
//!
//! Parsing is fail-soft: blank lines, `//` comments, and anything that does
//! not scan as an assignment are skipped, so "file defines nothing" is an
//! empty result, not an error.

use serde_json::{Map, Value};

/// Parse settings source text.
///
/// Returns a mapping from root identifier (e.g. `Configuration`) to the
/// nested mapping built from that root's assignments. Later assignments to
/// the same path overwrite earlier ones.
pub fn parse(text: &str) -> Map<String, Value> {
    let mut roots = Map::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        if let Some(statement) = parse_statement(trimmed) {
            insert(&mut roots, statement);
        }
    }
    roots
}

/// One parsed assignment: `root['k1']['k2'] = value;`.
struct Statement {
    root: String,
    keys: Vec<String>,
    value: Value,
}

fn parse_statement(line: &str) -> Option<Statement> {
    let mut scanner = Scanner::new(line);

    scanner.skip_ws();
    // Legacy sources prefix the root identifier with `$`.
    scanner.eat('$');
    let root = scanner.ident()?;

    let mut keys = Vec::new();
    while scanner.eat('[') {
        let key = scanner.quoted()?;
        if !scanner.eat(']') {
            return None;
        }
        keys.push(key);
    }
    if keys.is_empty() {
        return None;
    }

    scanner.skip_ws();
    if !scanner.eat('=') {
        return None;
    }
    scanner.skip_ws();
    let value = scanner.literal()?;
    scanner.skip_ws();
    if !scanner.eat(';') {
        return None;
    }

    Some(Statement { root, keys, value })
}

fn insert(roots: &mut Map<String, Value>, statement: Statement) {
    let slot = roots
        .entry(statement.root)
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    let mut current = match slot {
        Value::Object(map) => map,
        _ => unreachable!("root slot was just made a mapping"),
    };

    let mut keys = statement.keys;
    let last = keys.pop().unwrap_or_default();
    for key in keys {
        let child = current
            .entry(key)
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        current = match child {
            Value::Object(map) => map,
            _ => unreachable!("intermediate was just made a mapping"),
        };
    }
    current.insert(last, statement.value);
}

/// Character scanner over a single statement line.
struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(line: &str) -> Self {
        Self {
            chars: line.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// `[A-Za-z_][A-Za-z0-9_]*`
    fn ident(&mut self) -> Option<String> {
        let first = self.peek()?;
        if !first.is_ascii_alphabetic() && first != '_' {
            return None;
        }
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                out.push(ch);
                self.pos += 1;
            } else {
                break;
            }
        }
        Some(out)
    }

    /// A single- or double-quoted string with `\\`, `\'`, `\"` escapes.
    fn quoted(&mut self) -> Option<String> {
        let quote = self.peek()?;
        if quote != '\'' && quote != '"' {
            return None;
        }
        self.pos += 1;

        let mut out = String::new();
        loop {
            let ch = self.bump()?;
            if ch == quote {
                return Some(out);
            }
            if ch == '\\' {
                match self.bump()? {
                    escaped @ ('\\' | '\'' | '"') => out.push(escaped),
                    other => {
                        // Unknown escape: keep both characters.
                        out.push('\\');
                        out.push(other);
                    }
                }
            } else {
                out.push(ch);
            }
        }
    }

    /// `TRUE` / `FALSE`, a bare number, a quoted string, or `array(...)`.
    fn literal(&mut self) -> Option<Value> {
        match self.peek()? {
            '\'' | '"' => self.quoted().map(Value::String),
            'T' | 'F' | 'a' => match self.ident()?.as_str() {
                "TRUE" => Some(Value::Bool(true)),
                "FALSE" => Some(Value::Bool(false)),
                "array" => self.array_literal(),
                _ => None,
            },
            '-' | '0'..='9' => self.number(),
            _ => None,
        }
    }

    fn array_literal(&mut self) -> Option<Value> {
        if !self.eat('(') {
            return None;
        }
        let mut items = Vec::new();
        self.skip_ws();
        if self.eat(')') {
            return Some(Value::Array(items));
        }
        loop {
            self.skip_ws();
            items.push(self.literal()?);
            self.skip_ws();
            if self.eat(')') {
                return Some(Value::Array(items));
            }
            if !self.eat(',') {
                return None;
            }
        }
    }

    fn number(&mut self) -> Option<Value> {
        let mut out = String::new();
        if self.eat('-') {
            out.push('-');
        }
        let mut saw_dot = false;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                out.push(ch);
                self.pos += 1;
            } else if ch == '.' && !saw_dot {
                saw_dot = true;
                out.push(ch);
                self.pos += 1;
            } else {
                break;
            }
        }
        if saw_dot {
            let parsed: f64 = out.parse().ok()?;
            serde_json::Number::from_f64(parsed).map(Value::Number)
        } else {
            let parsed: i64 = out.parse().ok()?;
            Some(Value::Number(parsed.into()))
        }
    }
}
