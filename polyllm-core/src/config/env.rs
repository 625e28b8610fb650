//! Environment variable interpolation for configuration

use super::error::ConfigError;
use crate::transport::{process_env, EnvLookup};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
});

/// Interpolate `${VAR}` references using the process environment
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    interpolate_env_vars_with(content, &process_env)
}

/// Interpolate `${VAR}` references using `lookup`
///
/// Every reference must resolve; the first missing variable is reported.
pub fn interpolate_env_vars_with(content: &str, lookup: EnvLookup<'_>) -> Result<String, ConfigError> {
    let mut missing: Option<String> = None;

    let result = ENV_VAR_PATTERN.replace_all(content, |cap: &Captures<'_>| {
        let var_name = &cap[1];
        match lookup(var_name) {
            Some(value) => value,
            None => {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var) => Err(ConfigError::MissingEnvVar { var }),
        None => Ok(result.into_owned()),
    }
}

/// Names of all `${VAR}` references in `text`, in order of appearance
pub fn referenced_env_vars(text: &str) -> Vec<String> {
    ENV_VAR_PATTERN
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect()
}
