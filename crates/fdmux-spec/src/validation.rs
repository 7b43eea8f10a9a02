//! Run configuration validation.

use crate::config::{RunConfig, MAX_FILTER_ORDER};
use crate::error::{ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode};

/// Validates a run configuration and returns every problem found.
///
/// Errors make the configuration unusable. Warnings flag setups that will run
/// but produce audible cross-talk or aliasing.
///
/// # Example
/// ```
/// use fdmux_spec::{validate_config, RunConfig};
///
/// let result = validate_config(&RunConfig::default());
/// assert!(result.is_ok());
/// ```
pub fn validate_config(config: &RunConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    validate_inputs(config, &mut result);
    validate_sample_rate(config, &mut result);
    validate_duration(config, &mut result);
    validate_carriers(config, &mut result);
    validate_filter(config, &mut result);

    // Spectral layout checks only make sense on an otherwise sound config.
    if result.is_ok() {
        check_spectral_layout(config, &mut result);
    }

    result
}

fn validate_inputs(config: &RunConfig, result: &mut ValidationResult) {
    if config.inputs.is_empty() {
        result.add_error(ValidationError::with_path(
            ErrorCode::NoInputs,
            "at least one input is required",
            "inputs",
        ));
    }
}

fn validate_sample_rate(config: &RunConfig, result: &mut ValidationResult) {
    if config.sample_rate == 0 {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidSampleRate,
            "sample_rate must be positive",
            "sample_rate",
        ));
    }
}

fn validate_duration(config: &RunConfig, result: &mut ValidationResult) {
    let duration = config.max_duration_seconds;
    if !duration.is_finite() || duration <= 0.0 {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidDuration,
            format!("max_duration_seconds must be positive, got {}", duration),
            "max_duration_seconds",
        ));
    } else if config.sample_rate > 0 && config.max_samples() == 0 {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidDuration,
            format!(
                "max_duration_seconds {} keeps no samples at {} Hz",
                duration, config.sample_rate
            ),
            "max_duration_seconds",
        ));
    }
}

fn validate_carriers(config: &RunConfig, result: &mut ValidationResult) {
    if config.carrier_frequencies.len() != config.inputs.len() {
        result.add_error(ValidationError::with_path(
            ErrorCode::CarrierCountMismatch,
            format!(
                "{} carrier(s) configured for {} input(s)",
                config.carrier_frequencies.len(),
                config.inputs.len()
            ),
            "carrier_frequencies",
        ));
    }

    let nyquist = config.nyquist();
    for (i, &freq) in config.carrier_frequencies.iter().enumerate() {
        let path = format!("carrier_frequencies[{}]", i);
        if !freq.is_finite() || freq <= 0.0 {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidCarrierFrequency,
                format!("carrier frequency must be positive, got {}", freq),
                path,
            ));
        } else if config.sample_rate > 0 && freq >= nyquist {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidCarrierFrequency,
                format!(
                    "carrier frequency {} Hz is at or above Nyquist ({} Hz)",
                    freq, nyquist
                ),
                path,
            ));
        } else if config.carrier_frequencies[..i].contains(&freq) {
            result.add_error(ValidationError::with_path(
                ErrorCode::DuplicateCarrier,
                format!("carrier frequency {} Hz is used by an earlier channel", freq),
                path,
            ));
        }
    }
}

fn validate_filter(config: &RunConfig, result: &mut ValidationResult) {
    let order = config.filter.order;
    if order == 0 || order > MAX_FILTER_ORDER {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidFilterOrder,
            format!(
                "filter order must be between 1 and {}, got {}",
                MAX_FILTER_ORDER, order
            ),
            "filter.order",
        ));
    }

    if config.sample_rate == 0 {
        // Already reported; the normalized cutoff is undefined.
        return;
    }

    let wn = config.filter_spec().normalized_cutoff();
    if !(wn > 0.0 && wn < 1.0) {
        result.add_error(ValidationError::with_path(
            ErrorCode::InvalidFilterCutoff,
            format!(
                "filter cutoff {} Hz must lie strictly between 0 and Nyquist ({} Hz)",
                config.filter.cutoff_hz,
                config.nyquist()
            ),
            "filter.cutoff_hz",
        ));
    }
}

fn check_spectral_layout(config: &RunConfig, result: &mut ValidationResult) {
    let cutoff = config.filter.cutoff_hz;
    let nyquist = config.nyquist();

    let mut sorted: Vec<(usize, f64)> = config
        .carrier_frequencies
        .iter()
        .copied()
        .enumerate()
        .collect();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

    for pair in sorted.windows(2) {
        let (_, low) = pair[0];
        let (idx, high) = pair[1];
        if high - low < 2.0 * cutoff {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::CarrierSpacingOverlap,
                format!(
                    "carriers {} Hz and {} Hz are closer than 2 x cutoff ({} Hz); channels will overlap",
                    low,
                    high,
                    2.0 * cutoff
                ),
                format!("carrier_frequencies[{}]", idx),
            ));
        }
    }

    for (i, &freq) in config.carrier_frequencies.iter().enumerate() {
        let path = format!("carrier_frequencies[{}]", i);
        if freq < cutoff {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::CarrierBelowCutoff,
                format!(
                    "carrier {} Hz is below the filter cutoff ({} Hz)",
                    freq, cutoff
                ),
                path.clone(),
            ));
        }
        if freq + cutoff > nyquist {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::SidebandAboveNyquist,
                format!(
                    "upper sideband of {} Hz carrier reaches {} Hz, above Nyquist ({} Hz)",
                    freq,
                    freq + cutoff,
                    nyquist
                ),
                path,
            ));
        }
    }
}
