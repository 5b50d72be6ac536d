//! Request payload cleanup applied before create/update calls.

use serde_json::Value;

/// Trim every string in a JSON payload; blank strings become `null`.
/// Objects and arrays are walked recursively, other values are kept.
pub fn trim_payload(value: Value) -> Value {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Null
            } else if trimmed.len() == s.len() {
                Value::String(s)
            } else {
                Value::String(trimmed.to_string())
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(trim_payload).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, trim_payload(v)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trim_payload() {
        let payload = json!({
            "name": "  Acme Ltd ",
            "email": "   ",
            "notes": "",
            "phone": null,
            "active": true,
            "tags": [" vip ", ""],
            "address": {"city": " Leeds", "zip": 12}
        });

        assert_eq!(
            trim_payload(payload),
            json!({
                "name": "Acme Ltd",
                "email": null,
                "notes": null,
                "phone": null,
                "active": true,
                "tags": ["vip", null],
                "address": {"city": "Leeds", "zip": 12}
            })
        );
    }
}
