//! Leaf-overwrite recursive merge.
//!
//! Only mapping/mapping conflicts recurse; every other conflict takes the
//! incoming value. Lists are replaced, never concatenated, and a scalar
//! clash never turns into a two-element list.

use serde_json::map::Entry;
use serde_json::{Map, Value};

/// Merge `incoming` into `base` in place.
///
/// Keys absent from `base` are copied in; keys whose values are mappings on
/// both sides recurse; everything else is overwritten by `incoming`.
/// Existing keys keep their position in `base`.
pub fn merge_into(base: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, incoming_value) in incoming {
        match base.entry(key) {
            Entry::Occupied(mut entry) => match (entry.get_mut(), incoming_value) {
                (Value::Object(base_child), Value::Object(incoming_child)) => {
                    merge_into(base_child, incoming_child);
                }
                (slot, incoming_value) => *slot = incoming_value,
            },
            Entry::Vacant(entry) => {
                entry.insert(incoming_value);
            }
        }
    }
}

/// Merge two values, with `incoming` winning at the leaves.
///
/// Standalone two-argument form of [`merge_into`] for use outside the tree:
/// when both sides are mappings the merge recurses, otherwise `incoming`
/// replaces `base` wholesale.
pub fn merge(base: Value, incoming: Value) -> Value {
    match (base, incoming) {
        (Value::Object(mut base_map), Value::Object(incoming_map)) => {
            merge_into(&mut base_map, incoming_map);
            Value::Object(base_map)
        }
        (_, incoming) => incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_conflict_takes_incoming() {
        let merged = merge(json!({"key": "old"}), json!({"key": "new"}));
        assert_eq!(merged, json!({"key": "new"}));
    }

    #[test]
    fn test_mapping_conflict_recurses() {
        let merged = merge(json!({"x": {"y": 1, "z": 2}}), json!({"x": {"y": 9}}));
        assert_eq!(merged, json!({"x": {"y": 9, "z": 2}}));
    }

    #[test]
    fn test_shape_mismatch_takes_incoming() {
        let merged = merge(json!({"x": 1}), json!({"x": {"y": 1}}));
        assert_eq!(merged, json!({"x": {"y": 1}}));

        let merged = merge(json!({"x": {"y": 1}}), json!({"x": 1}));
        assert_eq!(merged, json!({"x": 1}));
    }

    #[test]
    fn test_lists_replace_not_combine() {
        let merged = merge(json!({"s": ["a", "b", "c"]}), json!({"s": ["x"]}));
        assert_eq!(merged, json!({"s": ["x"]}));
    }

    #[test]
    fn test_new_keys_copied_in() {
        let merged = merge(json!({"a": 1}), json!({"b": 2}));
        assert_eq!(merged, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_non_mapping_incoming_wins_wholesale() {
        let merged = merge(json!({"a": 1}), json!("flat"));
        assert_eq!(merged, json!("flat"));
    }

    #[test]
    fn test_existing_keys_keep_position() {
        let base = json!({"b": 1, "a": 2});
        let merged = merge(base, json!({"b": 9}));
        let keys: Vec<&String> = merged.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["b", "a"]);
    }
}
