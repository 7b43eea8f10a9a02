//! Cosine carrier generation.

use std::f64::consts::PI;

use crate::error::{DspError, DspResult};
use crate::signal::Signal;

/// Generates a cosine carrier.
///
/// `samples[n] = cos(2π · frequency · n / sample_rate)`. The phase is computed
/// from the sample index directly rather than accumulated, so identical
/// arguments always yield bit-identical output.
///
/// # Arguments
/// * `frequency` - Carrier frequency in Hz
/// * `sample_rate` - Sample rate in Hz
/// * `num_samples` - Number of samples to generate
pub fn generate(frequency: f64, sample_rate: u32, num_samples: usize) -> DspResult<Signal> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(DspError::invalid_param(
            "frequency",
            format!("must be positive, got {}", frequency),
        ));
    }
    if sample_rate == 0 {
        return Err(DspError::invalid_param("sample_rate", "must be positive"));
    }
    if num_samples == 0 {
        return Err(DspError::invalid_param("num_samples", "must be positive"));
    }

    let omega = 2.0 * PI * frequency / sample_rate as f64;
    Signal::from_fn(num_samples, sample_rate, |n| (omega * n as f64).cos())
}
