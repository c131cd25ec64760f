//! Record endpoint payloads

use chrono::Utc;
use serde::Deserialize;

use crate::domain::RecordValue;

/// Body accepted by `POST /insert`
#[derive(Debug, Clone, Deserialize)]
pub struct InsertRecordRequest {
    pub value: RecordValue,
}

impl InsertRecordRequest {
    /// Parses an optional JSON body. An empty body yields a timestamped entry.
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::timestamped());
        }
        serde_json::from_slice(body)
    }

    fn timestamped() -> Self {
        Self {
            value: RecordValue::String(format!("Entry Created At: {}", Utc::now().to_rfc3339())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_body_is_timestamped() {
        let request = InsertRecordRequest::from_body(b"").unwrap();
        let text = request.value.as_str().unwrap();
        assert!(text.starts_with("Entry Created At: "));
    }

    #[test]
    fn test_json_body() {
        let request = InsertRecordRequest::from_body(br#"{"value": {"n": 1}}"#).unwrap();
        assert_eq!(request.value, json!({ "n": 1 }));
    }

    #[test]
    fn test_invalid_body() {
        assert!(InsertRecordRequest::from_body(b"not json").is_err());
        assert!(InsertRecordRequest::from_body(br#"{"other": 1}"#).is_err());
    }
}
