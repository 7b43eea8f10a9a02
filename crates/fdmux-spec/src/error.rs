//! Error types for configuration loading and validation.

use thiserror::Error;

/// Error codes for configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// F001: No input resources listed
    NoInputs,
    /// F002: Sample rate is zero
    InvalidSampleRate,
    /// F003: Maximum duration is not a positive, finite number
    InvalidDuration,
    /// F004: Number of carriers does not match number of inputs
    CarrierCountMismatch,
    /// F005: Carrier frequency is non-positive or at/above Nyquist
    InvalidCarrierFrequency,
    /// F006: Normalized filter cutoff is outside (0, 1)
    InvalidFilterCutoff,
    /// F007: Filter order outside the supported range
    InvalidFilterOrder,
    /// F008: Two channels share a carrier frequency
    DuplicateCarrier,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "F001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::NoInputs => "F001",
            ErrorCode::InvalidSampleRate => "F002",
            ErrorCode::InvalidDuration => "F003",
            ErrorCode::CarrierCountMismatch => "F004",
            ErrorCode::InvalidCarrierFrequency => "F005",
            ErrorCode::InvalidFilterCutoff => "F006",
            ErrorCode::InvalidFilterOrder => "F007",
            ErrorCode::DuplicateCarrier => "F008",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes for configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: Adjacent carriers are closer than twice the filter cutoff
    CarrierSpacingOverlap,
    /// W002: Carrier sits below the filter cutoff
    CarrierBelowCutoff,
    /// W003: Upper sideband exceeds Nyquist
    SidebandAboveNyquist,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::CarrierSpacingOverlap => "W001",
            WarningCode::CarrierBelowCutoff => "W002",
            WarningCode::SidebandAboveNyquist => "W003",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and optional JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// JSON path to the problematic field (e.g., "carrier_frequencies\[1\]").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with a JSON path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validation warning with code, message, and optional JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The warning code.
    pub code: WarningCode,
    /// Human-readable warning message.
    pub message: String,
    /// JSON path to the problematic field.
    pub path: Option<String>,
}

impl ValidationWarning {
    /// Creates a new validation warning with a JSON path.
    pub fn with_path(
        code: WarningCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Top-level error type for configuration operations.
#[derive(Debug, Error)]
pub enum SpecError {
    /// Configuration validation failed with one or more errors.
    #[error("configuration validation failed with {} error(s)", .0.len())]
    ValidationFailed(Vec<ValidationError>),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of configuration validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of validation warnings.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if any error carries the given code.
    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// Returns true if any warning carries the given code.
    pub fn has_warning(&self, code: WarningCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }

    /// Converts to a Result, returning Err if there are errors.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, SpecError> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(SpecError::ValidationFailed(self.errors))
        }
    }
}

/// Common trait for errors that carry a stable code.
///
/// Every error type in the workspace implements this so the CLI can emit
/// consistent diagnostics regardless of which crate raised the error.
pub trait CodedError: std::error::Error {
    /// Stable error code for reporting.
    fn code(&self) -> &'static str;

    /// Error category (e.g., "config", "dsp").
    fn category(&self) -> &'static str;
}

impl CodedError for SpecError {
    fn code(&self) -> &'static str {
        match self {
            SpecError::ValidationFailed(_) => "CONFIG_001",
            SpecError::JsonParse(_) => "CONFIG_002",
            SpecError::Io(_) => "CONFIG_003",
        }
    }

    fn category(&self) -> &'static str {
        "config"
    }
}
