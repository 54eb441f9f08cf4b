//! Error taxonomy for the evaluation engine.
//!
//! Both variants reject the whole evaluation; no partial result is ever
//! returned. Numerical edge cases (factorial overflow, zero lambda) are not
//! errors and degenerate inside the distribution code instead.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed rate model or settings table (non-positive match length,
    /// gapped segment schedule, bad dispersion).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Out-of-domain match state, line or stake input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl EngineError {
    pub fn config(msg: impl Into<String>) -> Self {
        EngineError::InvalidConfiguration(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        EngineError::InvalidInput(msg.into())
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
