//! The configuration store.
//!
//! Holds two mapping trees: `live` is the full current state accumulated
//! across loads and sets; `pending` is the sparse subtree of paths
//! explicitly written since the last save. Saving renders `pending` into the
//! declarative settings format and resets it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::codec;
use crate::error::ConfigError;
use crate::identity::{Anonymous, Identity};
use crate::merge;
use crate::normalize::{PrefixNormalizer, ValueNormalizer};
use crate::path::{self, Slot};
use crate::source;

/// Root name under which settings merge at the top of the tree instead of
/// being nested one level down.
pub const ROOT_NAME: &str = "Configuration";

/// Which tree a load feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadTarget {
    /// Merge into the live tree; the file is only being read.
    Use,
    /// Merge into the pending tree and remember the file as the implicit
    /// save destination.
    Save,
}

/// Hierarchical dot-addressed settings store.
pub struct Config {
    live: Map<String, Value>,
    pending: Map<String, Value>,
    /// Implicit save destination, remembered by the most recent save-target
    /// load and cleared by use-target loads and successful saves.
    source_file: Option<PathBuf>,
    /// Group name the next save renders under when none is given.
    current_group: String,
    identity: Box<dyn Identity>,
    normalizer: Box<dyn ValueNormalizer>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Create an empty store with the default collaborators.
    pub fn new() -> Self {
        Self {
            live: Map::new(),
            pending: Map::new(),
            source_file: None,
            current_group: String::new(),
            identity: Box::new(Anonymous),
            normalizer: Box::new(PrefixNormalizer),
        }
    }

    /// Replace the identity provider used for save footers.
    pub fn with_identity(mut self, identity: impl Identity + 'static) -> Self {
        self.identity = Box::new(identity);
        self
    }

    /// Replace the normalizer applied to scalar reads.
    pub fn with_normalizer(mut self, normalizer: impl ValueNormalizer + 'static) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    /// The full current configuration state.
    pub fn live(&self) -> &Map<String, Value> {
        &self.live
    }

    /// The sparse subtree of paths written since the last save.
    pub fn pending(&self) -> &Map<String, Value> {
        &self.pending
    }

    /// Drop all unsaved changes.
    pub fn clear_pending(&mut self) {
        self.pending = Map::new();
    }

    /// Get the value at `path`, or `default` when the path is absent or
    /// traverses through a non-mapping node.
    ///
    /// Scalar strings pass through the normalizer; every other kind is
    /// returned as stored.
    pub fn get(&self, path: &str, default: Value) -> Value {
        match path::lookup(&self.live, path) {
            Some(Value::String(raw)) => self.normalizer.unserialize(raw),
            Some(value) => value.clone(),
            None => default,
        }
    }

    /// Raw view of the value at `path`, without normalization.
    pub fn get_raw(&self, path: &str) -> Option<&Value> {
        path::lookup(&self.live, path)
    }

    /// Get a value as a string slice.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get_raw(path).and_then(|v| v.as_str())
    }

    /// Get a value as a bool.
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get_raw(path).and_then(|v| v.as_bool())
    }

    /// Get a value as a u64.
    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get_raw(path).and_then(|v| v.as_u64())
    }

    /// Assign `value` at `path`, creating intermediate mappings as needed.
    ///
    /// Writes both the live and the pending tree.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        self.set_overwrite(path, value.into(), true);
    }

    /// Assign `value` at `path`, optionally refusing to overwrite.
    ///
    /// With `overwrite = false` an existing leaf in the live tree is left
    /// untouched and the pending tree records no change either. Intermediate
    /// mappings are still created in both trees.
    pub fn set_overwrite(&mut self, path: &str, value: Value, overwrite: bool) {
        let keys = path::split(path);
        let Some((last, parents)) = keys.split_last() else {
            return;
        };

        let mut live = &mut self.live;
        let mut pending = &mut self.pending;
        for key in parents {
            live = descend(live, key);
            pending = descend(pending, key);
        }

        if overwrite || !live.contains_key(*last) {
            live.insert((*last).to_string(), value.clone());
            pending.insert((*last).to_string(), value);
        }
    }

    /// Delete the leaf at `path` from both trees.
    ///
    /// Returns `true` only when the full path existed in the live tree.
    /// Now-empty ancestor mappings are left in place.
    pub fn remove(&mut self, path: &str) -> bool {
        let keys = path::split(path);
        let Some((last, parents)) = keys.split_last() else {
            return false;
        };

        let mut live = &mut self.live;
        let mut pending: Option<&mut Map<String, Value>> = Some(&mut self.pending);
        for key in parents {
            // The pending side is followed only while the same key still
            // exists there as a mapping.
            pending = pending.and_then(|map| match map.get_mut(*key) {
                Some(Value::Object(child)) => Some(child),
                _ => None,
            });
            live = match live.get_mut(*key) {
                Some(Value::Object(child)) => child,
                _ => return false,
            };
        }

        if live.shift_remove(*last).is_some() {
            if let Some(map) = pending {
                map.shift_remove(*last);
            }
            true
        } else {
            false
        }
    }

    /// Load a settings file and merge it into the selected tree.
    ///
    /// Returns `false` when the file does not exist or cannot be read; the
    /// trees are untouched in that case. A file that parses but defines
    /// nothing under `root_name` still returns `true` without merging.
    ///
    /// Assignments rooted at `root_name` become the data to merge; unless
    /// `root_name` is [`ROOT_NAME`], they are nested one level under that
    /// name first. Leaves from the file win conflicts against whatever the
    /// selected tree already holds.
    ///
    /// A [`LoadTarget::Save`] load remembers the file as the implicit save
    /// destination and `root_name` as the current group, even when the file
    /// is missing; a [`LoadTarget::Use`] load clears the remembered
    /// destination so a later save cannot clobber a file loaded only for
    /// reading.
    pub fn load(&mut self, file: &Path, target: LoadTarget, root_name: &str) -> bool {
        match target {
            LoadTarget::Save => {
                self.source_file = Some(file.to_path_buf());
                self.current_group = root_name.to_string();
            }
            LoadTarget::Use => self.source_file = None,
        }

        let text = match fs::read_to_string(file) {
            Ok(text) => text,
            Err(err) => {
                debug!(file = %file.display(), %err, "settings source not readable");
                return false;
            }
        };

        let mut parsed = source::parse(&text);
        let data = match parsed.remove(root_name) {
            Some(Value::Object(map)) => map,
            // File exists but defines nothing usable: fail-soft.
            _ => {
                debug!(file = %file.display(), root_name, "settings source defines no mapping");
                return true;
            }
        };

        let incoming = if root_name == ROOT_NAME {
            data
        } else {
            // Assignments rooted at the shared root ride along; the named
            // group nests beside them.
            let mut wrapper = match parsed.remove(ROOT_NAME) {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            };
            wrapper.insert(root_name.to_string(), Value::Object(data));
            wrapper
        };

        let tree = match target {
            LoadTarget::Use => &mut self.live,
            LoadTarget::Save => &mut self.pending,
        };
        debug!(file = %file.display(), ?target, keys = incoming.len(), "merging settings source");
        merge::merge_into(tree, incoming);
        true
    }

    /// Replace the subtree at `path` in the live tree with `data`.
    ///
    /// Unlike [`Config::load`] this does not merge: the slot is replaced
    /// wholesale, but only when it currently holds `Null` (a fresh slot) or
    /// `overwrite` is set. The path [`ROOT_NAME`] addresses the tree root,
    /// which is only replaced when `overwrite` is set and `data` is a
    /// mapping. Returns whether the replacement was applied. The pending
    /// tree is untouched.
    pub fn load_array(&mut self, path: &str, data: Value, overwrite: bool) -> bool {
        let path = if path == ROOT_NAME { "" } else { path };
        match path::resolve(&mut self.live, path, true) {
            Some(Slot::Root(root)) => match (overwrite, data) {
                (true, Value::Object(map)) => {
                    *root = map;
                    true
                }
                _ => false,
            },
            Some(Slot::Leaf(slot)) => {
                if slot.is_null() || overwrite {
                    *slot = data;
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Save the pending tree to the remembered destination.
    pub fn save(&mut self) -> Result<(), ConfigError> {
        self.save_as(None, None, true)
    }

    /// Save the pending tree.
    ///
    /// `destination` falls back to the file remembered by the most recent
    /// save-target load; `group` falls back to the remembered group, then to
    /// [`ROOT_NAME`]. With `require_source_file` set and an existing
    /// destination, the file's current content becomes the base and pending
    /// leaves win conflicts over it, so keys already in the file survive a
    /// partial save; otherwise the rendered pending tree replaces the file
    /// wholesale.
    ///
    /// Top-level keys are sorted ascending before rendering; nested levels
    /// keep their existing order. When the sorted tree has exactly one
    /// top-level key equal to `group` and that key holds a mapping, the tree
    /// collapses to that mapping, avoiding a redundant nesting level.
    ///
    /// On success the pending tree, the remembered destination, and the
    /// remembered group are all cleared.
    pub fn save_as(
        &mut self,
        destination: Option<&Path>,
        group: Option<&str>,
        require_source_file: bool,
    ) -> Result<(), ConfigError> {
        let destination = destination
            .map(Path::to_path_buf)
            .or_else(|| self.source_file.clone())
            .ok_or(ConfigError::MissingDestination)?;

        let group = group
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| {
                if self.current_group.is_empty() {
                    None
                } else {
                    Some(self.current_group.clone())
                }
            })
            .unwrap_or_else(|| ROOT_NAME.to_string());

        let mut data = self.pending.clone();
        if require_source_file {
            if let Ok(text) = fs::read_to_string(&destination) {
                let mut base = existing_file_tree(&text, &group);
                merge::merge_into(&mut base, data);
                data = base;
            }
        }

        // Shallow sort: top-level keys only, nested order is part of the
        // on-disk contract.
        let mut entries: Vec<(String, Value)> = data.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let mut data: Map<String, Value> = entries.into_iter().collect();

        // Collapse the redundant nesting level when the whole file is about
        // one group. The collapsed keys are deliberately not re-sorted.
        let collapse = data.len() == 1 && matches!(data.get(&group), Some(Value::Object(_)));
        if collapse {
            if let Some(Value::Object(inner)) = data.remove(&group) {
                data = inner;
            }
        }

        let mut lines: Vec<String> = Vec::new();
        let mut statements = 0;
        for (name, value) in &data {
            if value.is_object() {
                lines.push(String::new());
                lines.push(format!("// {}", name));
            }
            let prefix = format!("{}['{}']", group, name);
            statements += codec::render_assignment(&mut lines, &prefix, value);
        }
        if statements == 0 {
            return Err(ConfigError::EmptySave);
        }

        let editor = self
            .identity
            .display_name()
            .unwrap_or_else(|| "Unknown".to_string());
        lines.push(String::new());
        lines.push(format!(
            "// Last edited by {} {}",
            editor,
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        ));

        if lines.first().is_some_and(String::is_empty) {
            lines.remove(0);
        }
        let contents = lines.join("\n") + "\n";

        debug!(file = %destination.display(), %group, statements, "writing settings file");
        fs::write(&destination, contents).map_err(|source| ConfigError::WriteFailed {
            path: destination.display().to_string(),
            source,
        })?;

        self.pending = Map::new();
        self.source_file = None;
        self.current_group.clear();
        Ok(())
    }
}

/// Descend into `key`, creating or repairing it as a mapping.
fn descend<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(child) => child,
        _ => unreachable!("slot was just made a mapping"),
    }
}

/// Reconstruct the tree a previously written file denotes, using the same
/// convention the loader applies: a file written under `group` holds the
/// subtree for `group` unless the group is the shared root.
fn existing_file_tree(text: &str, group: &str) -> Map<String, Value> {
    let mut parsed = source::parse(text);
    let data = match parsed.remove(group) {
        Some(Value::Object(map)) => map,
        _ => return Map::new(),
    };
    if group == ROOT_NAME {
        data
    } else {
        let mut wrapper = Map::new();
        wrapper.insert(group.to_string(), Value::Object(data));
        wrapper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_then_get_round_trips() {
        let mut config = Config::new();
        config.set("Database.Host", json!("local"));
        assert_eq!(config.get("Database.Host", json!(false)), json!("local"));
    }

    #[test]
    fn test_get_missing_returns_default() {
        let config = Config::new();
        assert_eq!(config.get("Nope", json!("fallback")), json!("fallback"));
        assert_eq!(config.get("Nope.Deeper", json!(42)), json!(42));
    }

    #[test]
    fn test_get_through_scalar_returns_default() {
        let mut config = Config::new();
        config.set("A", json!("scalar"));
        assert_eq!(config.get("A.B", json!("fallback")), json!("fallback"));
    }

    #[test]
    fn test_get_present_null_is_not_default() {
        let mut config = Config::new();
        config.set("A", json!(null));
        assert_eq!(config.get("A", json!("fallback")), json!(null));
    }

    #[test]
    fn test_set_creates_intermediate_mappings() {
        let mut config = Config::new();
        config.set("a.b.c", json!(1));
        assert_eq!(config.get("a.b", json!(false)), json!({"c": 1}));
        assert_eq!(config.live().get("a"), Some(&json!({"b": {"c": 1}})));
    }

    #[test]
    fn test_set_writes_both_trees() {
        let mut config = Config::new();
        config.set("a.b", json!(1));
        assert_eq!(config.live().get("a"), Some(&json!({"b": 1})));
        assert_eq!(config.pending().get("a"), Some(&json!({"b": 1})));
    }

    #[test]
    fn test_set_without_overwrite_keeps_existing() {
        let mut config = Config::new();
        config.set("a", json!("first"));
        config.clear_pending();
        config.set_overwrite("a", json!("second"), false);
        assert_eq!(config.get("a", json!(false)), json!("first"));
        // No-op means no pending change.
        assert!(config.pending().is_empty());
    }

    #[test]
    fn test_set_without_overwrite_still_creates_intermediates() {
        let mut config = Config::new();
        config.set("a.b", json!(1));
        config.clear_pending();
        config.set_overwrite("a.b", json!(2), false);
        assert_eq!(config.pending().get("a"), Some(&json!({})));
    }

    #[test]
    fn test_remove_existing_leaf() {
        let mut config = Config::new();
        config.set("a.b.c", json!(1));
        assert!(config.remove("a.b.c"));
        assert_eq!(config.get("a.b.c", json!("gone")), json!("gone"));
        // Ancestors are not pruned.
        assert_eq!(config.get("a.b", json!(false)), json!({}));
    }

    #[test]
    fn test_remove_missing_path() {
        let mut config = Config::new();
        config.set("a.b", json!(1));
        assert!(!config.remove("a.x.c"));
        assert!(!config.remove("z"));
    }

    #[test]
    fn test_remove_clears_pending_side_too() {
        let mut config = Config::new();
        config.set("a.b", json!(1));
        assert!(config.remove("a.b"));
        assert_eq!(config.pending().get("a"), Some(&json!({})));
    }

    #[test]
    fn test_remove_when_pending_side_absent() {
        let mut config = Config::new();
        config.set("a.b", json!(1));
        config.clear_pending();
        assert!(config.remove("a.b"));
        assert_eq!(config.get("a.b", json!("gone")), json!("gone"));
    }

    #[test]
    fn test_typed_getters() {
        let mut config = Config::new();
        config.set("Database.Host", json!("local"));
        config.set("Database.Port", json!(5432));
        config.set("Database.Ssl", json!(true));
        assert_eq!(config.get_str("Database.Host"), Some("local"));
        assert_eq!(config.get_u64("Database.Port"), Some(5432));
        assert_eq!(config.get_bool("Database.Ssl"), Some(true));
        assert_eq!(config.get_str("Database.Port"), None);
    }

    #[test]
    fn test_get_normalizes_prefixed_scalars() {
        let mut config = Config::new();
        config.set("Stored", json!(r#"Arr:["a","b"]"#));
        assert_eq!(config.get("Stored", json!(false)), json!(["a", "b"]));
    }

    #[test]
    fn test_load_array_replaces_fresh_slot() {
        let mut config = Config::new();
        assert!(config.load_array("Routes", json!({"home": "/"}), false));
        assert_eq!(config.get("Routes.home", json!(false)), json!("/"));
    }

    #[test]
    fn test_load_array_refuses_occupied_slot_without_overwrite() {
        let mut config = Config::new();
        config.set("Routes", json!({"home": "/"}));
        assert!(!config.load_array("Routes", json!({"home": "/new"}), false));
        assert_eq!(config.get("Routes.home", json!(false)), json!("/"));
    }

    #[test]
    fn test_load_array_overwrite_replaces_wholesale() {
        let mut config = Config::new();
        config.set("Routes", json!({"home": "/", "about": "/about"}));
        assert!(config.load_array("Routes", json!({"home": "/new"}), true));
        // Replaced, not merged.
        assert_eq!(config.get("Routes", json!(false)), json!({"home": "/new"}));
    }

    #[test]
    fn test_load_array_root_requires_overwrite_and_mapping() {
        let mut config = Config::new();
        config.set("a", json!(1));
        assert!(!config.load_array(ROOT_NAME, json!({"b": 2}), false));
        assert!(!config.load_array(ROOT_NAME, json!("scalar"), true));
        assert!(config.load_array(ROOT_NAME, json!({"b": 2}), true));
        assert_eq!(config.get("b", json!(false)), json!(2));
        assert_eq!(config.get("a", json!("gone")), json!("gone"));
    }

    #[test]
    fn test_load_array_does_not_touch_pending() {
        let mut config = Config::new();
        assert!(config.load_array("Routes", json!({"home": "/"}), false));
        assert!(config.pending().is_empty());
    }

    #[test]
    fn test_save_without_destination_fails() {
        let mut config = Config::new();
        config.set("a", json!(1));
        let result = config.save();
        assert!(matches!(result, Err(ConfigError::MissingDestination)));
    }

    #[test]
    fn test_save_with_empty_pending_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("conf.settings");
        let mut config = Config::new();
        let result = config.save_as(Some(&file), None, false);
        assert!(matches!(result, Err(ConfigError::EmptySave)));
    }
}
