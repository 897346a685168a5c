//! Flatten nested JSON into key paths
//!
//! Object keys are joined with `.`, array elements are addressed as
//! `[index]`. Only scalar leaves produce entries, so empty nested objects and
//! arrays disappear.

use indexmap::IndexMap;
use serde_json::Value;

/// Key used when the whole answer is a single scalar
pub const SCALAR_KEY: &str = "value";

/// Flatten `value` into an ordered map of key path to scalar
///
/// ```
/// use estima_extractor::flatten::flatten;
/// use serde_json::json;
///
/// let flat = flatten(&json!({"a": {"b": 1}, "c": [1, 2]}));
/// assert_eq!(flat.keys().collect::<Vec<_>>(), vec!["a.b", "c[0]", "c[1]"]);
/// ```
pub fn flatten(value: &Value) -> IndexMap<String, Value> {
    let mut out = IndexMap::new();
    match value {
        Value::Object(_) | Value::Array(_) => flatten_into(value, "", &mut out),
        scalar => {
            out.insert(SCALAR_KEY.to_string(), scalar.clone());
        }
    }
    out
}

fn flatten_into(value: &Value, prefix: &str, out: &mut IndexMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(child, &path, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, &format!("{}[{}]", prefix, index), out);
            }
        }
        scalar => {
            out.insert(prefix.to_string(), scalar.clone());
        }
    }
}
