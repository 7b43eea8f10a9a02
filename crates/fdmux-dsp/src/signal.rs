//! Sample buffer type shared by every stage of the chain.

use crate::error::{DspError, DspResult};

/// A finite mono sample buffer at a known sample rate.
///
/// Transforms return new signals; inputs are never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl Signal {
    /// Creates a signal from samples.
    ///
    /// Fails with `InvalidParameter` if the sample rate is zero or any sample
    /// is NaN or infinite.
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> DspResult<Self> {
        if sample_rate == 0 {
            return Err(DspError::invalid_param(
                "sample_rate",
                "must be positive",
            ));
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(DspError::invalid_param(
                "samples",
                format!("non-finite value {} at index {}", samples[index], index),
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Creates a silent signal of the given length.
    pub fn zeros(len: usize, sample_rate: u32) -> DspResult<Self> {
        Self::new(vec![0.0; len], sample_rate)
    }

    /// Builds a signal by evaluating `f` at each sample index.
    pub fn from_fn(len: usize, sample_rate: u32, f: impl Fn(usize) -> f64) -> DspResult<Self> {
        Self::new((0..len).map(f).collect(), sample_rate)
    }

    /// Returns the samples.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Consumes the signal and returns its samples.
    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the signal holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Returns a copy keeping at most the first `max_samples` samples.
    pub fn truncate(&self, max_samples: usize) -> Signal {
        let end = max_samples.min(self.samples.len());
        Self {
            samples: self.samples[..end].to_vec(),
            sample_rate: self.sample_rate,
        }
    }

    /// Peak absolute amplitude (0.0 for an empty signal).
    pub fn peak(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.abs())
            .fold(0.0_f64, |a, b| a.max(b))
    }

    /// Scales the signal so its peak absolute value is 1.0.
    ///
    /// A silent signal is returned unchanged.
    pub fn normalize(&self) -> Signal {
        let peak = self.peak();
        if peak > 0.0 {
            // Divide rather than multiply by 1/peak so the peak lands on exactly 1.0.
            Self {
                samples: self.samples.iter().map(|s| s / peak).collect(),
                sample_rate: self.sample_rate,
            }
        } else {
            self.clone()
        }
    }

    /// Elementwise sum of two signals of identical shape.
    pub fn add(&self, other: &Signal) -> DspResult<Signal> {
        self.ensure_same_shape(other)?;
        Ok(Self {
            samples: self
                .samples
                .iter()
                .zip(other.samples.iter())
                .map(|(a, b)| a + b)
                .collect(),
            sample_rate: self.sample_rate,
        })
    }

    /// Checks that `other` has the same length and sample rate.
    pub fn ensure_same_shape(&self, other: &Signal) -> DspResult<()> {
        if self.samples.len() != other.samples.len() {
            return Err(DspError::LengthMismatch {
                expected: self.samples.len(),
                found: other.samples.len(),
            });
        }
        if self.sample_rate != other.sample_rate {
            return Err(DspError::SampleRateMismatch {
                expected: self.sample_rate,
                found: other.sample_rate,
            });
        }
        Ok(())
    }
}

/// Truncates every signal to the length of the shortest one.
pub fn equalize_lengths(signals: &[Signal]) -> Vec<Signal> {
    let shortest = signals.iter().map(Signal::len).min().unwrap_or(0);
    signals.iter().map(|s| s.truncate(shortest)).collect()
}
