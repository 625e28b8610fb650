//! Errors raised while loading and querying provider profiles

use super::schema::SUPPORTED_VERSION;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Result of loading or querying a profiles file
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read profiles file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Syntax or shape error; `line` and `column` are 1-based when known
    #[error("cannot parse {}{}: {message}", .path.display(), location(.line, .column))]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("environment variable ${{{var}}} is not set")]
    MissingEnvVar { var: String },

    #[error("{} is not a .yaml, .yml or .json file", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("no profile named '{name}'")]
    UnknownProfile { name: String },

    #[error("profile '{name}' is disabled")]
    DisabledProfile { name: String },
}

fn location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" at {line}:{column}"),
        (Some(line), None) => format!(" at line {line}"),
        _ => String::new(),
    }
}

/// A rule broken by a profiles file, located by its field path
#[derive(Debug, Error)]
#[error("invalid profiles file at '{field_path}': {kind}")]
pub struct ValidationError {
    /// Path such as `profiles[1].name` or `defaults.temperature`
    pub field_path: String,
    pub kind: ValidationErrorKind,
}

#[derive(Debug, Error)]
pub enum ValidationErrorKind {
    #[error("value is required")]
    Missing,

    #[error("required by the {provider} provider")]
    RequiredByProvider { provider: String },

    #[error("version {found} is not supported (expected {expected})", expected = SUPPORTED_VERSION)]
    UnsupportedVersion { found: String },

    #[error("profile name '{name}' is used more than once")]
    DuplicateProfile { name: String },

    #[error("every profile is disabled")]
    NoEnabledProfile,

    #[error("'{provider}' is not a built-in provider")]
    UnknownProvider { provider: String },

    #[error("{value} is outside {min}..={max}")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("invalid URL: {message}")]
    InvalidUrl { message: String },

    #[error("expected a string, found {found}")]
    NotAString { found: &'static str },
}

impl ValidationErrorKind {
    /// Kind for a non-string JSON value where a string was required
    pub fn not_a_string(value: &Value) -> Self {
        let found = match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        };
        ValidationErrorKind::NotAString { found }
    }
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
        }
    }

    pub fn missing(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_error_mentions_location() {
        let err = ConfigError::Parse {
            path: PathBuf::from("profiles.yaml"),
            line: Some(3),
            column: Some(7),
            message: "unexpected key".to_string(),
        };
        assert_eq!(err.to_string(), "cannot parse profiles.yaml at 3:7: unexpected key");

        let err = ConfigError::Parse {
            path: PathBuf::from("profiles.yaml"),
            line: None,
            column: None,
            message: "eof".to_string(),
        };
        assert_eq!(err.to_string(), "cannot parse profiles.yaml: eof");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::from(ValidationError::new(
            "profiles[0].temperature",
            ValidationErrorKind::OutOfRange {
                value: 2.5,
                min: 0.0,
                max: 2.0,
            },
        ));
        assert_eq!(
            err.to_string(),
            "invalid profiles file at 'profiles[0].temperature': 2.5 is outside 0..=2"
        );
    }

    #[test]
    fn test_missing_env_var_display() {
        let err = ConfigError::MissingEnvVar {
            var: "OPENAI_API_KEY".to_string(),
        };
        assert_eq!(err.to_string(), "environment variable ${OPENAI_API_KEY} is not set");
    }

    #[test]
    fn test_not_a_string_names_json_kind() {
        assert!(matches!(
            ValidationErrorKind::not_a_string(&json!([1])),
            ValidationErrorKind::NotAString { found: "array" }
        ));
    }
}
