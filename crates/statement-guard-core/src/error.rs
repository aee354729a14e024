use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatementGuardError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rule configuration error: {0}")]
    RuleConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for StatementGuardError {
    fn from(e: serde_json::Error) -> Self {
        StatementGuardError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for StatementGuardError {
    fn from(e: toml::de::Error) -> Self {
        StatementGuardError::RuleConfig(e.to_string())
    }
}
