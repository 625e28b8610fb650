//! Secrets handling and redaction for configuration
//!
//! Credentials are wrapped in [`SecretString`] so they never show up in
//! `Debug`/`Display` output, and [`SafeLogging`] gives loggable summaries of
//! values that carry secrets.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const REDACTED: &str = "[REDACTED]";

/// Field-name fragments that mark a value as sensitive
const SENSITIVE_PATTERNS: [&str; 9] = [
    "api_key",
    "secret",
    "token",
    "password",
    "credential",
    "auth",
    "private",
    "passphrase",
    "pem",
];

/// A wrapper type for sensitive strings like API keys
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new secret string
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Get the actual value (use with caution)
    pub fn expose_secret(&self) -> &str {
        &self.value
    }

    /// Check if the secret is empty
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Get a partially redacted version for debugging
    pub fn partial_redact(&self) -> String {
        if self.value.is_empty() {
            return "[EMPTY]".to_string();
        }

        let len = self.value.len();
        if len <= 8 || !self.value.is_ascii() {
            REDACTED.to_string()
        } else if self.value.starts_with("sk-") || self.value.starts_with("pk-") {
            format!("{}...{}", &self.value[..3], &self.value[len - 4..])
        } else {
            format!("{}...{}", &self.value[..2], &self.value[len - 2..])
        }
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A trait for types that can be logged safely
pub trait SafeLogging {
    /// Returns a safe version for logging
    fn safe_for_logging(&self) -> String;
}

/// Whether a field name looks like it holds a secret
pub fn is_sensitive_field(field_name: &str) -> bool {
    let field_lower = field_name.to_lowercase();
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| field_lower.contains(pattern))
}

/// Redact `value` when `field_name` looks sensitive
pub fn redact_by_field_name(field_name: &str, value: &Value) -> String {
    if is_sensitive_field(field_name) {
        REDACTED.to_string()
    } else {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_secret_string_redaction() {
        let secret = SecretString::new("sk-1234567890abcdef");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(secret.partial_redact(), "sk-...cdef");
    }

    #[test]
    fn test_partial_redact_short_and_empty() {
        assert_eq!(SecretString::new("short").partial_redact(), "[REDACTED]");
        assert_eq!(SecretString::default().partial_redact(), "[EMPTY]");
        assert_eq!(SecretString::new("abcdefghijkl").partial_redact(), "ab...kl");
    }

    #[test]
    fn test_secret_string_expose() {
        let secret = SecretString::new("my-secret-value");
        assert_eq!(secret.expose_secret(), "my-secret-value");
        assert!(SecretString::default().is_empty());
    }

    #[test]
    fn test_secret_string_deserializes_transparently() {
        let secret: SecretString = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(secret.expose_secret(), "abc");
    }

    #[test]
    fn test_redact_by_field_name() {
        assert_eq!(redact_by_field_name("api_key", &json!("sk-123")), "[REDACTED]");
        assert_eq!(redact_by_field_name("base_url", &json!("https://x")), "https://x");
        assert_eq!(redact_by_field_name("credentials_json", &json!({"a": 1})), "[REDACTED]");
        assert_eq!(redact_by_field_name("openai_root_ca_pem", &json!("---")), "[REDACTED]");
        assert_eq!(redact_by_field_name("retries", &json!(3)), "3");
    }

    #[test]
    fn test_sensitive_field_detection() {
        assert!(is_sensitive_field("API_KEY"));
        assert!(is_sensitive_field("auth_credential"));
        assert!(!is_sensitive_field("model"));
        assert!(!is_sensitive_field("region"));
    }
}
