//! JSON result envelope written to standard output

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// Exactly one of `text` or `message`, selected by `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope {
    Success { text: String },
    Error { message: String },
}

impl Envelope {
    pub fn success(text: impl Into<String>) -> Self {
        Self::Success { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Pretty-printed with 4-space indentation
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_layout() {
        let json = Envelope::error("No file path provided").to_json().unwrap();
        assert_eq!(
            json,
            "{\n    \"status\": \"error\",\n    \"message\": \"No file path provided\"\n}"
        );
    }

    #[test]
    fn test_success_layout() {
        let json = Envelope::success("Hello\nWorld").to_json().unwrap();
        assert_eq!(
            json,
            "{\n    \"status\": \"success\",\n    \"text\": \"Hello\\nWorld\"\n}"
        );
    }

    #[test]
    fn test_non_ascii_text_stays_utf8() {
        let json = Envelope::success("Straße café").to_json().unwrap();
        assert!(json.contains("\"text\": \"Straße café\""));
    }

    #[test]
    fn test_only_one_payload_field() {
        let value: serde_json::Value =
            serde_json::from_str(&Envelope::success("x").to_json().unwrap()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert!(object.contains_key("text"));
        assert!(!object.contains_key("message"));
    }
}
