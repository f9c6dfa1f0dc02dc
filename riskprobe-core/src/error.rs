use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskProbeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Invalid rule set: {0}")]
    InvalidRuleSet(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Failure of a single environment reading.
///
/// The collector never surfaces these; each one is logged and coerced to the
/// sub-check's sentinel value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("API unavailable: {0}")]
    Unavailable(String),

    #[error("Access denied: {0}")]
    Denied(String),

    #[error("Probe failed: {0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, RiskProbeError>;
