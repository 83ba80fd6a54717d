//! Dot-path resolution over nested mapping trees.
//!
//! A path like `Database.Host` addresses successive keys in nested mappings.
//! Resolution returns an explicit [`Slot`] handle rather than a shared
//! reference chain, and absence is `None` rather than a sentinel value, so
//! callers can always tell "absent" from "present but null".

use serde_json::{Map, Value};

/// A mutable handle to a resolved position in the tree.
///
/// The empty path resolves to the root mapping itself; every non-empty path
/// resolves to a single value slot.
pub enum Slot<'a> {
    /// The tree root (always a mapping).
    Root(&'a mut Map<String, Value>),
    /// A value at the final key of the path.
    Leaf(&'a mut Value),
}

/// Split a path on `.` into its key sequence.
///
/// Matches `explode` semantics: the empty string yields a single empty key,
/// and `"a..b"` yields an empty middle key. Empty keys simply never match.
pub fn split(path: &str) -> Vec<&str> {
    path.split('.').collect()
}

/// Resolve `path` against `root`, optionally creating missing nodes.
///
/// With `create = true` every missing intermediate key is inserted as an
/// empty mapping and the final key as `Null`, so resolution always succeeds.
/// Intermediate nodes that exist but are not mappings are replaced by empty
/// mappings in create mode; in read mode they stop resolution.
///
/// Returns `None` when the path cannot be resolved without creating.
pub fn resolve<'a>(
    root: &'a mut Map<String, Value>,
    path: &str,
    create: bool,
) -> Option<Slot<'a>> {
    if path.is_empty() {
        return Some(Slot::Root(root));
    }

    let keys = split(path);
    let (last, parents) = keys.split_last()?;

    let mut current = root;
    for key in parents {
        if !current.contains_key(*key) {
            if !create {
                return None;
            }
            current.insert((*key).to_string(), Value::Object(Map::new()));
        }
        let next = current.get_mut(*key)?;
        if !next.is_object() {
            if !create {
                return None;
            }
            *next = Value::Object(Map::new());
        }
        current = match next {
            Value::Object(map) => map,
            _ => unreachable!("intermediate node was just made a mapping"),
        };
    }

    if !current.contains_key(*last) {
        if !create {
            return None;
        }
        current.insert((*last).to_string(), Value::Null);
    }
    current.get_mut(*last).map(Slot::Leaf)
}

/// Read-only walk of `path` through `root`.
///
/// Every key must index into a mapping; a missing key or a non-mapping
/// intermediate yields `None`. A present `Null` yields `Some(&Null)`.
pub fn lookup<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut current: Option<&Value> = None;
    for key in path.split('.') {
        let map = match current {
            None => root,
            Some(Value::Object(map)) => map,
            Some(_) => return None,
        };
        current = Some(map.get(key)?);
    }
    current
}
