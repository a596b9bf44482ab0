//! Error types for the PWVD engine and its surrounding layers

use thiserror::Error;

/// Errors that can occur while preparing or computing a distribution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PwvdError {
    /// Output or scratch buffer could not be obtained
    #[error("Memory allocation failed for a {rows}x{cols} buffer")]
    Allocation { rows: usize, cols: usize },

    /// Internal invariant violated; the caller broke the core contract
    #[error("Function failed: {0}")]
    Computation(String),

    /// Parameter rejected by the validation layer
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// File system failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Input file could not be decoded into samples
    #[error("Decode error: {0}")]
    Decode(String),

    /// FFT backend rejected its buffers
    #[error("FFT error: {0}")]
    Fft(String),
}

impl PwvdError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        PwvdError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for PwvdError {
    fn from(err: std::io::Error) -> Self {
        PwvdError::Io(err.to_string())
    }
}
