//! Error types shared by every analysis module
//!
//! All validation happens at the call site that receives the malformed input.
//! Nothing is retried or recovered; errors propagate to the caller unchanged.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by the statistics engine and its data loaders
#[derive(Debug, Error, Diagnostic)]
pub enum StatsError {
    /// Malformed or contradictory input (bad limits, exclusive parameters, missing inputs)
    #[error("Configuration error: {0}")]
    #[diagnostic(code(tolstack::configuration))]
    Configuration(String),

    /// A distribution family or law that exists but has no implementation
    #[error("Not implemented: {0}")]
    #[diagnostic(
        code(tolstack::not_implemented),
        help("supported laws are 'normal' and 'lognormal' for normality tests, 'normal', 'uniform' and 'gennorm' for dimensions")
    )]
    NotImplemented(String),

    /// Empty or degenerate sample
    #[error("Insufficient data: {0}")]
    #[diagnostic(code(tolstack::insufficient_data))]
    InsufficientData(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(tolstack::io))]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    #[diagnostic(code(tolstack::csv))]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    #[diagnostic(code(tolstack::yaml))]
    Yaml(#[from] serde_yml::Error),
}

impl StatsError {
    /// Shorthand for a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        StatsError::Configuration(msg.into())
    }

    /// Shorthand for an insufficient-data error
    pub fn data(msg: impl Into<String>) -> Self {
        StatsError::InsufficientData(msg.into())
    }

    /// True for configuration-class failures
    pub fn is_configuration(&self) -> bool {
        matches!(self, StatsError::Configuration(_))
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, StatsError>;
