//! Value normalizer collaborator.
//!
//! Scalars read out of the tree pass through a normalization step before
//! being returned. The step is a pure function on the raw string; the
//! default implementation understands the legacy `Obj:`/`Arr:` prefixed
//! JSON encoding for structured values stored as scalars.

use serde_json::Value;

/// Normalizes a raw scalar string read from the tree.
pub trait ValueNormalizer {
    /// Turn the stored string into the value it denotes.
    ///
    /// Must be total: a string that cannot be decoded is returned as itself.
    fn unserialize(&self, raw: &str) -> Value;
}

/// Default normalizer.
///
/// Strings beginning with `Obj:` or `Arr:` are decoded as JSON payloads;
/// everything else passes through unchanged. A prefixed string whose payload
/// fails to decode is returned as-is.
pub struct PrefixNormalizer;

impl ValueNormalizer for PrefixNormalizer {
    fn unserialize(&self, raw: &str) -> Value {
        let payload = raw
            .strip_prefix("Obj:")
            .or_else(|| raw.strip_prefix("Arr:"));
        match payload {
            Some(json) => {
                serde_json::from_str(json).unwrap_or_else(|_| Value::String(raw.to_string()))
            }
            None => Value::String(raw.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_string_passes_through() {
        let normalized = PrefixNormalizer.unserialize("hello");
        assert_eq!(normalized, json!("hello"));
    }

    #[test]
    fn test_arr_prefix_decodes() {
        let normalized = PrefixNormalizer.unserialize(r#"Arr:["a","b"]"#);
        assert_eq!(normalized, json!(["a", "b"]));
    }

    #[test]
    fn test_obj_prefix_decodes() {
        let normalized = PrefixNormalizer.unserialize(r#"Obj:{"x":1}"#);
        assert_eq!(normalized, json!({"x": 1}));
    }

    #[test]
    fn test_bad_payload_returned_as_is() {
        let normalized = PrefixNormalizer.unserialize("Arr:not json");
        assert_eq!(normalized, json!("Arr:not json"));
    }
}
