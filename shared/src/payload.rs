//! Dynamically typed command payloads

use serde_json::{Map, Value};

/// A string-keyed document carried in a request body or a serial line
pub type Payload = Map<String, Value>;

/// Typed accessors over a [`Payload`]
///
/// Each accessor returns `None` both when the key is absent and when the
/// value has a different runtime type.
pub trait PayloadExt {
    fn get_str(&self, key: &str) -> Option<&str>;
    fn get_i64(&self, key: &str) -> Option<i64>;
    fn get_bool(&self, key: &str) -> Option<bool>;
}

impl PayloadExt for Payload {
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }
}

/// Parse raw bytes into a payload
///
/// Empty or whitespace-only input is an empty payload.
pub fn parse(raw: &[u8]) -> Result<Payload, serde_json::Error> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Payload::new());
    }
    serde_json::from_slice(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_body_is_empty_payload() {
        assert!(parse(b"").unwrap().is_empty());
        assert!(parse(b"  \r\n").unwrap().is_empty());
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(parse(b"[1, 2]").is_err());
        assert!(parse(b"42").is_err());
        assert!(parse(b"{\"mode\":").is_err());
    }

    #[test]
    fn test_typed_accessors() {
        let payload = parse(br#"{"mode": 1, "name": "main", "pause": true, "ratio": 1.5}"#).unwrap();
        assert_eq!(payload.get_i64("mode"), Some(1));
        assert_eq!(payload.get_str("name"), Some("main"));
        assert_eq!(payload.get_bool("pause"), Some(true));
        assert_eq!(payload.get_i64("ratio"), None);
        assert_eq!(payload.get_str("mode"), None);
        assert_eq!(payload.get("missing"), None);
        assert_eq!(payload.get("ratio"), Some(&json!(1.5)));
    }
}
