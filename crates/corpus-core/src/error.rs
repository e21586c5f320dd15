//! Configuration error types.

/// Errors detected while validating a [`crate::GenerationRequest`].
///
/// Every variant names the offending option so the CLI can report it before
/// any output is produced.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error reading a profile file
    #[error("Failed to read profile file: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing a YAML profile
    #[error("Failed to parse YAML profile: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An option holds a value outside its accepted range
    #[error("Invalid value for '{option}': {reason}")]
    InvalidValue { option: &'static str, reason: String },

    /// Two options cannot be used together
    #[error("Conflicting options: {0}")]
    Conflict(String),
}

impl ConfigError {
    pub fn invalid(option: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            option,
            reason: reason.into(),
        }
    }
}
