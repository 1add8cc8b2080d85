//! Error types for the transport layer
use thiserror::Error;

/// Transport errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// DMX device or packet error
    #[error("DMX error: {0}")]
    DmxError(String),

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, ControlError>;

impl From<ControlError> for lightrig_core::CoreError {
    fn from(err: ControlError) -> Self {
        lightrig_core::CoreError::Transport(err.to_string())
    }
}
