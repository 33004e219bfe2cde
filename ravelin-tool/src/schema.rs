//! Minimal JSON-schema-subset validator.
//!
//! Tool arguments are validated against an object's declared `type`,
//! `properties`, and `required` fields. This deliberately does not
//! implement the full JSON Schema specification (no `$ref`, no
//! combinators, no format validators) — it covers the structural checks
//! a tool call's arguments realistically need, which is the only thing
//! the resolver contract (reject malformed arguments, let the model
//! self-correct) actually requires.

use serde_json::Value;

/// Check `value` against `schema`. Returns `Ok(())` or a human-readable
/// description of the first mismatch found.
pub fn validate(schema: &Value, value: &Value) -> Result<(), String> {
    let Some(expected_type) = schema.get("type").and_then(Value::as_str) else {
        // No type constraint declared: anything passes.
        return Ok(());
    };

    match expected_type {
        "object" => {
            let Value::Object(map) = value else {
                return Err(format!("expected object, got {}", type_name(value)));
            };
            if let Some(required) = schema.get("required").and_then(Value::as_array) {
                for field in required {
                    let Some(name) = field.as_str() else { continue };
                    if !map.contains_key(name) {
                        return Err(format!("missing required field `{name}`"));
                    }
                }
            }
            if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
                for (key, sub_schema) in properties {
                    if let Some(sub_value) = map.get(key) {
                        validate(sub_schema, sub_value)
                            .map_err(|e| format!("field `{key}`: {e}"))?;
                    }
                }
            }
            Ok(())
        }
        "array" => {
            let Value::Array(items) = value else {
                return Err(format!("expected array, got {}", type_name(value)));
            };
            if let Some(item_schema) = schema.get("items") {
                for (i, item) in items.iter().enumerate() {
                    validate(item_schema, item).map_err(|e| format!("item[{i}]: {e}"))?;
                }
            }
            Ok(())
        }
        "string" => match value {
            Value::String(_) => Ok(()),
            other => Err(format!("expected string, got {}", type_name(other))),
        },
        "number" => match value {
            Value::Number(_) => Ok(()),
            other => Err(format!("expected number, got {}", type_name(other))),
        },
        "integer" => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(()),
            other => Err(format!("expected integer, got {}", type_name(other))),
        },
        "boolean" => match value {
            Value::Bool(_) => Ok(()),
            other => Err(format!("expected boolean, got {}", type_name(other))),
        },
        "null" => match value {
            Value::Null => Ok(()),
            other => Err(format!("expected null, got {}", type_name(other))),
        },
        _ => Ok(()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_with_required_fields_passes() {
        let schema = json!({
            "type": "object",
            "properties": { "a": {"type": "integer"}, "b": {"type": "integer"} },
            "required": ["a", "b"],
        });
        assert!(validate(&schema, &json!({"a": 2, "b": 3})).is_ok());
    }

    #[test]
    fn missing_required_field_fails() {
        let schema = json!({
            "type": "object",
            "required": ["a"],
        });
        let err = validate(&schema, &json!({})).unwrap_err();
        assert!(err.contains("a"));
    }

    #[test]
    fn wrong_field_type_fails() {
        let schema = json!({
            "type": "object",
            "properties": { "a": {"type": "integer"} },
            "required": ["a"],
        });
        let err = validate(&schema, &json!({"a": "two"})).unwrap_err();
        assert!(err.contains('a'));
    }

    #[test]
    fn no_type_constraint_always_passes() {
        assert!(validate(&json!({}), &json!(null)).is_ok());
    }
}
