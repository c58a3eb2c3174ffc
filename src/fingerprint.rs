//! Canonical fingerprinting — order-insensitive SHA-256 over structured data
//!
//! Values are flattened to a compact JSON byte string with object keys
//! emitted in sorted order, then hashed. Two structurally identical values
//! fingerprint identically no matter how their fields were inserted.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Fingerprint a structured value
pub fn fingerprint(value: &Value) -> String {
    let mut buf = String::new();
    write_canonical(value, &mut buf);
    let mut hasher = Sha256::new();
    hasher.update(buf.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint anything serializable, going through its JSON value form
pub fn fingerprint_of<T: Serialize>(value: &T) -> Result<String> {
    Ok(fingerprint(&serde_json::to_value(value)?))
}

/// Write `value` as compact JSON with sorted object keys.
///
/// Arrays keep their order; only object keys are normalized. Scalars are
/// rendered by serde_json so numeric formatting stays consistent with the
/// serialized record forms.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, k) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // object keys are plain strings, serde_json escapes them
                out.push_str(&Value::String((*k).clone()).to_string());
                out.push(':');
                write_canonical(&map[*k], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
