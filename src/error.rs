//! Error types for Ocusense

use thiserror::Error;

/// Errors that can occur in the detection engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("face tracking capability is not available on this device")]
    CapabilityUnavailable,

    #[error("unsupported exercise duration: {0} seconds")]
    InvalidDuration(u32),

    #[error("failed to parse frame sample: {0}")]
    ParseError(String),

    #[error("invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
