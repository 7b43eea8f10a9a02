//! JSON output types for machine-readable CLI output.
//!
//! This module provides structured output types for the `--json` flag on
//! `run`, `validate`, and `design`. Scripts can parse these instead of the
//! colored human output.

use fdmux_dsp::PipelineError;
use fdmux_spec::CodedError;
use serde::{Deserialize, Serialize};

/// Error codes for CLI operations.
///
/// These codes are stable and can be used for programmatic error handling.
/// Format: CLI_XXX for CLI-level errors; pipeline and validation errors pass
/// through their own codes.
pub mod error_codes {
    /// File could not be read
    pub const FILE_READ: &str = "CLI_001";
    /// JSON parse error
    pub const JSON_PARSE: &str = "CLI_002";
    /// Output could not be written
    pub const OUTPUT_WRITE: &str = "CLI_003";
    /// Filter design error
    pub const FILTER_DESIGN: &str = "CLI_004";
}

/// Warning codes for CLI operations.
pub mod warning_codes {
    /// A diagnostic plot could not be rendered
    pub const PLOT_SKIPPED: &str = "CLI_W001";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "F004", "DSP_005")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// JSON path to the problematic field (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Source file path (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Pipeline stage that failed (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// One-based channel number that failed (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<usize>,
}

impl JsonError {
    /// Creates a new error with code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
            file: None,
            stage: None,
            channel: None,
        }
    }

    /// Sets the JSON path for this error.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the file path for this error.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// A structured warning in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonWarning {
    /// Stable warning code (e.g., "CLI_W001", "W001")
    pub code: String,
    /// Human-readable warning message
    pub message: String,
    /// JSON path to the problematic field (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl JsonWarning {
    /// Creates a new warning with code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
        }
    }

    /// Sets the JSON path for this warning.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// JSON output for the `validate` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateOutput {
    /// Whether validation succeeded (no errors)
    pub success: bool,
    /// Validation errors
    pub errors: Vec<JsonError>,
    /// Validation warnings
    pub warnings: Vec<JsonWarning>,
    /// Number of channels in the configuration (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<usize>,
    /// BLAKE3 hash of the source file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
}

impl ValidateOutput {
    /// Creates a successful validate output.
    pub fn success(channels: usize, source_hash: Option<String>, warnings: Vec<JsonWarning>) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings,
            channels: Some(channels),
            source_hash,
        }
    }

    /// Creates a failed validate output.
    pub fn failure(
        errors: Vec<JsonError>,
        warnings: Vec<JsonWarning>,
        source_hash: Option<String>,
    ) -> Self {
        Self {
            success: false,
            errors,
            warnings,
            channels: None,
            source_hash,
        }
    }
}

/// A written output file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Output kind (composite, recovered, plot)
    pub kind: String,
    /// Output format (wav, png)
    pub format: String,
    /// Output path relative to the output directory
    pub path: String,
    /// BLAKE3 hash of the file content
    pub hash: String,
}

/// JSON output for the `run` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    /// Whether the run succeeded
    pub success: bool,
    /// Errors encountered during the run
    pub errors: Vec<JsonError>,
    /// Warnings from validation and plotting
    pub warnings: Vec<JsonWarning>,
    /// Run result details (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RunResult>,
}

/// Run result details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Output directory
    pub out_dir: String,
    /// Number of recovered channels
    pub channels: usize,
    /// Samples per channel
    pub num_samples: usize,
    /// Written files, excluding the report
    pub outputs: Vec<GeneratedFile>,
    /// Path to the run report
    pub report_path: String,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunOutput {
    /// Creates a successful run output.
    pub fn success(result: RunResult, warnings: Vec<JsonWarning>) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings,
            result: Some(result),
        }
    }

    /// Creates a failed run output.
    pub fn failure(errors: Vec<JsonError>, warnings: Vec<JsonWarning>) -> Self {
        Self {
            success: false,
            errors,
            warnings,
            result: None,
        }
    }
}

/// Filter gain at the reference frequencies, in dB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GainReport {
    /// Gain at 0 Hz
    pub dc_db: f64,
    /// Gain at the cutoff frequency
    pub cutoff_db: f64,
    /// Gain at twice the cutoff frequency (if below Nyquist)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub double_cutoff_db: Option<f64>,
}

/// Filter design details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignResult {
    pub order: usize,
    pub cutoff_hz: f64,
    pub sample_rate: u32,
    /// Cutoff normalized to Nyquist
    pub normalized_cutoff: f64,
    /// Feedforward coefficients
    pub b: Vec<f64>,
    /// Feedback coefficients (`a[0] == 1`)
    pub a: Vec<f64>,
    pub gain: GainReport,
    /// Whether every pole lies inside the unit circle
    pub stable: bool,
}

/// JSON output for the `design` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignOutput {
    /// Whether the design succeeded
    pub success: bool,
    /// Errors encountered during design
    pub errors: Vec<JsonError>,
    /// Design result (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DesignResult>,
}

/// Converts an InputError to a JsonError.
pub fn input_error_to_json(err: &crate::input::InputError, file: Option<&str>) -> JsonError {
    use crate::input::InputError;

    let code = match err {
        InputError::FileRead { .. } => error_codes::FILE_READ,
        InputError::JsonParse { .. } => error_codes::JSON_PARSE,
    };

    let mut error = JsonError::new(code, err.to_string());
    if let Some(f) = file {
        error = error.with_file(f);
    }
    error
}

/// Converts a ValidationError to a JsonError.
pub fn validation_error_to_json(err: &fdmux_spec::ValidationError) -> JsonError {
    let mut error = JsonError::new(err.code.to_string(), &err.message);
    if let Some(ref path) = err.path {
        error = error.with_path(path);
    }
    error
}

/// Converts a ValidationWarning to a JsonWarning.
pub fn validation_warning_to_json(warn: &fdmux_spec::ValidationWarning) -> JsonWarning {
    let mut warning = JsonWarning::new(warn.code.to_string(), &warn.message);
    if let Some(ref path) = warn.path {
        warning = warning.with_path(path);
    }
    warning
}

/// Converts a PipelineError to JsonErrors.
///
/// Validation failures expand to one entry per validation error; stage
/// failures carry the stage name and one-based channel number.
pub fn pipeline_error_to_json(err: &PipelineError) -> Vec<JsonError> {
    match err {
        PipelineError::Config(fdmux_spec::SpecError::ValidationFailed(errors)) => {
            errors.iter().map(validation_error_to_json).collect()
        }
        PipelineError::Config(other) => vec![JsonError::new(other.code(), other.to_string())],
        PipelineError::Stage { stage, channel, .. } => {
            let mut error = JsonError::new(err.code(), err.to_string());
            error.stage = Some(stage.as_str().to_string());
            error.channel = channel.map(|c| c + 1);
            vec![error]
        }
    }
}

/// Serializes a JSON output value and prints it to stdout.
pub fn print_json<T: Serialize>(output: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(output)?;
    println!("{}", json);
    Ok(())
}
