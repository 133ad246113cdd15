//! Option validation helpers used while a joint is being configured.
//!
//! Joint definitions frequently arrive from declarative config files, so the
//! checks favor descriptive messages over early panics: every failure names
//! the offending option.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ConfigError;

/// Pattern for well-formed entity identifiers.
const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Lazily-compiled identifier regex, shared process-wide.
fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern compiles"))
}

/// True when `value` is a well-formed entity identifier.
#[must_use]
pub fn is_identifier(value: &str) -> bool {
    identifier_regex().is_match(value)
}

/// Require a non-empty, well-formed identifier for the named option.
pub fn require_identifier(option: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::new(option, "must not be empty"));
    }
    if !is_identifier(value) {
        return Err(ConfigError::new(
            option,
            format!("`{value}` is not a valid identifier"),
        ));
    }
    Ok(())
}

/// Require a non-empty value for the named option.
pub fn require_non_empty(option: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::new(option, "must not be empty"));
    }
    Ok(())
}
