//! Read-only view over untyped payloads arriving at the ingestion boundary
//!
//! Producers send traces of unknown or legacy shape. Every probe the
//! detector, adapter and validator perform goes through these helpers so
//! "present" means the same thing everywhere: the key exists and holds a
//! truthy value (not null, false, 0, NaN or the empty string).

use serde_json::{Map, Value};

/// Whether a JSON value counts as present
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a value for inclusion in a diagnostic message
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Borrowed view over one raw JSON record
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    value: &'a Value,
}

impl<'a> RawRecord<'a> {
    /// Wrap a JSON value
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    /// The underlying value
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Top-level object, if the record is one
    pub fn as_object(&self) -> Option<&'a Map<String, Value>> {
        self.value.as_object()
    }

    /// Top-level keys, in document order
    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.as_object()
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }

    /// A present (truthy) field
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.value.get(key).filter(|v| is_truthy(v))
    }

    /// Whether `key` is present
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// A present string field
    pub fn str(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(Value::as_str)
    }

    /// A present string or number field, as text
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// A present object field
    pub fn object(&self, key: &str) -> Option<&'a Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    /// A present object field viewed as a record
    pub fn nested(&self, key: &str) -> Option<RawRecord<'a>> {
        self.get(key).filter(|v| v.is_object()).map(RawRecord::new)
    }

    /// A present array field
    pub fn array(&self, key: &str) -> Option<&'a Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    /// A field holding a number, including zero, truncated to whole units.
    ///
    /// Non-finite values and values outside the `i64` range yield `None`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn integer(&self, key: &str) -> Option<i64> {
        let Value::Number(number) = self.value.get(key)? else {
            return None;
        };
        if let Some(i) = number.as_i64() {
            return Some(i);
        }
        let f = number.as_f64()?.trunc();
        (f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
    }

    /// The first of `keys` that is present
    pub fn first_of(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter().find_map(|k| self.get(k))
    }

    /// The record id for diagnostics, or `unknown`
    pub fn id_label(&self) -> String {
        self.text("id").unwrap_or_else(|| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!(-1)));
    }

    #[test]
    fn test_field_access() {
        let value = json!({
            "id": 42,
            "name": "",
            "duration": 12.9,
            "metadata": {"framework": "langchain"},
            "tags": ["a"]
        });
        let raw = RawRecord::new(&value);

        assert_eq!(raw.text("id").as_deref(), Some("42"));
        assert_eq!(raw.id_label(), "42");
        assert!(raw.str("name").is_none());
        assert_eq!(raw.integer("duration"), Some(12));
        assert_eq!(raw.nested("metadata").and_then(|m| m.str("framework")), Some("langchain"));
        assert_eq!(raw.array("tags").map(Vec::len), Some(1));
        assert_eq!(raw.keys().count(), 5);
    }

    #[test]
    fn test_non_object_record() {
        let value = json!("just a string");
        let raw = RawRecord::new(&value);

        assert_eq!(raw.keys().count(), 0);
        assert!(raw.get("id").is_none());
        assert_eq!(raw.id_label(), "unknown");
    }
}
