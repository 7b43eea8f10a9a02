//! Error types for the signal chain.

use fdmux_spec::CodedError;
use thiserror::Error;

/// Result type for signal chain operations.
pub type DspResult<T> = Result<T, DspError>;

/// Errors that can occur while building, combining or filtering signals.
#[derive(Debug, Error)]
pub enum DspError {
    /// Non-positive or out-of-range numeric parameter.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// Signals combined without matching lengths.
    #[error("length mismatch: expected {expected} samples, found {found}")]
    LengthMismatch {
        /// Expected length.
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// Signals combined without matching sample rates.
    #[error("sample rate mismatch: expected {expected} Hz, found {found} Hz")]
    SampleRateMismatch {
        /// Expected sample rate.
        expected: u32,
        /// Found sample rate.
        found: u32,
    },

    /// Malformed filter coefficients.
    #[error("invalid filter state: {message}")]
    InvalidState {
        /// Error message.
        message: String,
    },

    /// An input resource could not be loaded.
    #[error("failed to load '{resource}': {message}")]
    Load {
        /// Resource identifier.
        resource: String,
        /// Error message.
        message: String,
    },

    /// A signal could not be encoded for output.
    #[error("encoding error: {message}")]
    Encode {
        /// Error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DspError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Creates a load error.
    pub fn load(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            resource: resource.into(),
            message: message.into(),
        }
    }
}

impl CodedError for DspError {
    fn code(&self) -> &'static str {
        match self {
            DspError::InvalidParameter { .. } => "DSP_001",
            DspError::LengthMismatch { .. } => "DSP_002",
            DspError::SampleRateMismatch { .. } => "DSP_003",
            DspError::InvalidState { .. } => "DSP_004",
            DspError::Load { .. } => "DSP_005",
            DspError::Encode { .. } => "DSP_006",
            DspError::Io(_) => "DSP_007",
        }
    }

    fn category(&self) -> &'static str {
        "dsp"
    }
}
