//! Spectral analysis for inspecting signals.
//!
//! Nothing in the recovery path reads these results; they exist for plots,
//! reports and tests.

use std::f64::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::{DspError, DspResult};
use crate::signal::Signal;

/// Default spectrogram frame length.
pub const DEFAULT_NFFT: usize = 256;

/// Default spectrogram frame overlap.
pub const DEFAULT_OVERLAP: usize = 128;

/// One-sided magnitude spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Bin centre frequencies in Hz.
    pub frequencies: Vec<f64>,
    /// Magnitudes, scaled `2/n · |X[k]|`.
    pub magnitudes: Vec<f64>,
}

impl Spectrum {
    /// Sum of squared magnitudes for bins with `low_hz <= f < high_hz`.
    pub fn band_energy(&self, low_hz: f64, high_hz: f64) -> f64 {
        self.frequencies
            .iter()
            .zip(&self.magnitudes)
            .filter(|&(&f, _)| f >= low_hz && f < high_hz)
            .map(|(_, m)| m * m)
            .sum()
    }

    /// Sum of squared magnitudes over all bins.
    pub fn total_energy(&self) -> f64 {
        self.magnitudes.iter().map(|m| m * m).sum()
    }

    /// Fraction of the total energy below `hz` (0.0 for a silent signal).
    pub fn energy_fraction_below(&self, hz: f64) -> f64 {
        let total = self.total_energy();
        if total > 0.0 {
            self.band_energy(f64::NEG_INFINITY, hz) / total
        } else {
            0.0
        }
    }

    /// Frequency of the strongest non-DC bin (0.0 if there is none).
    pub fn dominant_frequency(&self) -> f64 {
        self.frequencies
            .iter()
            .zip(&self.magnitudes)
            .skip(1)
            .fold((0.0, 0.0), |(best_f, best_m), (&f, &m)| {
                if m > best_m {
                    (f, m)
                } else {
                    (best_f, best_m)
                }
            })
            .0
    }

    /// Largest magnitude in the spectrum.
    pub fn peak_magnitude(&self) -> f64 {
        self.magnitudes.iter().fold(0.0_f64, |a, &b| a.max(b))
    }
}

/// Computes the one-sided magnitude spectrum of the whole signal.
///
/// Uses a single FFT over all samples (no window), keeping bins `0..n/2`.
pub fn magnitude_spectrum(signal: &Signal) -> DspResult<Spectrum> {
    let n = signal.len();
    if n < 2 {
        return Err(DspError::invalid_param(
            "signal",
            "at least two samples are required for a spectrum",
        ));
    }

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let mut buffer: Vec<Complex<f64>> = signal
        .samples()
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .collect();
    fft.process(&mut buffer);

    let half = n / 2;
    let bin_hz = signal.sample_rate() as f64 / n as f64;
    let scale = 2.0 / n as f64;

    Ok(Spectrum {
        frequencies: (0..half).map(|k| k as f64 * bin_hz).collect(),
        magnitudes: buffer[..half].iter().map(|c| c.norm() * scale).collect(),
    })
}

/// Short-time power spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    /// Frame length in samples.
    pub nfft: usize,
    /// Hop between frames in samples.
    pub hop: usize,
    /// Frame centre times in seconds.
    pub times: Vec<f64>,
    /// Bin frequencies in Hz (`nfft / 2 + 1` bins).
    pub frequencies: Vec<f64>,
    /// Power per frame, `power[frame][bin]`.
    pub power: Vec<Vec<f64>>,
}

impl Spectrogram {
    /// Number of frames.
    pub fn num_frames(&self) -> usize {
        self.power.len()
    }

    /// Largest power value across all frames.
    pub fn max_power(&self) -> f64 {
        self.power
            .iter()
            .flat_map(|frame| frame.iter())
            .fold(0.0_f64, |a, &b| a.max(b))
    }
}

/// Computes a Hann-windowed spectrogram.
///
/// # Arguments
/// * `signal` - Signal to analyze
/// * `nfft` - Frame length in samples
/// * `overlap` - Samples shared by consecutive frames (must be below `nfft`)
pub fn spectrogram(signal: &Signal, nfft: usize, overlap: usize) -> DspResult<Spectrogram> {
    if nfft < 2 {
        return Err(DspError::invalid_param("nfft", "must be at least 2"));
    }
    if overlap >= nfft {
        return Err(DspError::invalid_param(
            "overlap",
            format!("must be smaller than nfft ({}), got {}", nfft, overlap),
        ));
    }
    if signal.len() < nfft {
        return Err(DspError::invalid_param(
            "signal",
            format!(
                "needs at least {} samples for one frame, got {}",
                nfft,
                signal.len()
            ),
        ));
    }

    let hop = nfft - overlap;
    let sample_rate = signal.sample_rate() as f64;
    let window: Vec<f64> = (0..nfft)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / nfft as f64).cos()))
        .collect();
    let window_power: f64 = window.iter().map(|w| w * w).sum();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nfft);
    let bins = nfft / 2 + 1;

    let num_frames = (signal.len() - nfft) / hop + 1;
    let mut times = Vec::with_capacity(num_frames);
    let mut power = Vec::with_capacity(num_frames);
    let mut buffer = vec![Complex::new(0.0, 0.0); nfft];

    for frame in 0..num_frames {
        let start = frame * hop;
        let samples = &signal.samples()[start..start + nfft];
        for ((slot, &s), &w) in buffer.iter_mut().zip(samples).zip(&window) {
            *slot = Complex::new(s * w, 0.0);
        }
        fft.process(&mut buffer);

        let frame_power: Vec<f64> = buffer[..bins]
            .iter()
            .map(|c| c.norm_sqr() / (window_power * sample_rate))
            .collect();
        power.push(frame_power);
        times.push((start as f64 + nfft as f64 / 2.0) / sample_rate);
    }

    Ok(Spectrogram {
        nfft,
        hop,
        times,
        frequencies: (0..bins).map(|k| k as f64 * sample_rate / nfft as f64).collect(),
        power,
    })
}
