use crate::rules::RuleError;
use thiserror::Error;

/// Main error type for ks-nids
#[derive(Error, Debug)]
pub enum NidsError {
    #[error("Invalid rule on line {line} ({rule}): {source}")]
    Rule {
        line: usize,
        rule: String,
        #[source]
        source: RuleError,
    },

    #[error("Packet decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Thread error: {0}")]
    Thread(String),
}

/// Result type alias for ks-nids operations
pub type Result<T> = std::result::Result<T, NidsError>;
