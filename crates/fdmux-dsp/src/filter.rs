//! Butterworth low-pass design and recursive filtering.
//!
//! Design follows the classic analog-prototype route: Butterworth poles are
//! placed evenly on the unit circle in the left half of the s-plane, scaled to
//! the pre-warped cutoff, and mapped to the z-plane with the bilinear
//! transform. All `order` zeros land at z = -1. The resulting zeros, poles and
//! gain are expanded into transfer-function coefficients `b` (feedforward) and
//! `a` (feedback) with `a[0] == 1`.
//!
//! Filtering uses the transposed direct form II with zero initial state, so
//! every call is independent of every other call.

use std::f64::consts::PI;

use fdmux_spec::{FilterSpec, MAX_FILTER_ORDER};
use rustfft::num_complex::Complex;

use crate::error::{DspError, DspResult};
use crate::signal::Signal;

/// Transfer-function coefficients of a digital IIR filter.
///
/// `y[n] = sum_k b[k]·x[n-k] - sum_{k>=1} a[k]·y[n-k]`, with `a[0]` normalized
/// to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoeffs {
    b: Vec<f64>,
    a: Vec<f64>,
}

impl FilterCoeffs {
    /// Creates coefficients from raw tap arrays.
    ///
    /// Both arrays are divided by `a[0]`. Fails with `InvalidState` when either
    /// array is empty, `a[0]` is zero, or any tap is not finite.
    pub fn new(b: Vec<f64>, a: Vec<f64>) -> DspResult<Self> {
        check_taps(&b, &a)?;
        let a0 = a[0];
        Ok(Self {
            b: b.iter().map(|x| x / a0).collect(),
            a: a.iter().map(|x| x / a0).collect(),
        })
    }

    /// Designs a Butterworth low-pass filter.
    ///
    /// # Arguments
    /// * `order` - Filter order (number of poles)
    /// * `cutoff_hz` - -3 dB cutoff frequency in Hz
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// Fails with `InvalidParameter` when the order is outside
    /// `1..=MAX_FILTER_ORDER` or the normalized cutoff
    /// `cutoff_hz / (sample_rate / 2)` is not strictly inside (0, 1).
    pub fn butterworth_lowpass(order: usize, cutoff_hz: f64, sample_rate: u32) -> DspResult<Self> {
        if order == 0 || order > MAX_FILTER_ORDER {
            return Err(DspError::invalid_param(
                "order",
                format!("must be between 1 and {}, got {}", MAX_FILTER_ORDER, order),
            ));
        }
        if sample_rate == 0 {
            return Err(DspError::invalid_param("sample_rate", "must be positive"));
        }
        let wn = cutoff_hz / (sample_rate as f64 / 2.0);
        if !(wn > 0.0 && wn < 1.0) {
            return Err(DspError::invalid_param(
                "cutoff_hz",
                format!(
                    "normalized cutoff {} must be strictly between 0 and 1",
                    wn
                ),
            ));
        }

        // Work at a nominal fs of 2 so that Nyquist == 1, then pre-warp.
        let fs = 2.0;
        let warped = 2.0 * fs * (PI * wn / fs).tan();

        let n = order as f64;
        let analog_poles: Vec<Complex<f64>> = (0..order)
            .map(|k| {
                let m = -n + 1.0 + 2.0 * k as f64;
                -Complex::from_polar(1.0, PI * m / (2.0 * n)) * warped
            })
            .collect();
        let analog_gain = warped.powi(order as i32);

        // Bilinear transform
        let fs2 = Complex::new(2.0 * fs, 0.0);
        let digital_poles: Vec<Complex<f64>> =
            analog_poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();
        let denom = analog_poles
            .iter()
            .fold(Complex::new(1.0, 0.0), |acc, &p| acc * (fs2 - p));
        let gain = analog_gain * (Complex::new(1.0, 0.0) / denom).re;

        let zeros = vec![Complex::new(-1.0, 0.0); order];
        let b = poly(&zeros).into_iter().map(|c| c.re * gain).collect();
        let a = poly(&digital_poles).into_iter().map(|c| c.re).collect();

        Self::new(b, a)
    }

    /// Designs the Butterworth low-pass filter described by `spec`.
    pub fn from_spec(spec: &FilterSpec) -> DspResult<Self> {
        Self::butterworth_lowpass(spec.order, spec.cutoff_hz, spec.sample_rate)
    }

    /// Feedforward coefficients.
    pub fn b(&self) -> &[f64] {
        &self.b
    }

    /// Feedback coefficients (`a[0] == 1`).
    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// Filter order (longest tap array minus one).
    pub fn order(&self) -> usize {
        self.b.len().max(self.a.len()) - 1
    }

    /// Filters a signal with zero initial state.
    pub fn apply(&self, input: &Signal) -> DspResult<Signal> {
        let output = lfilter(&self.b, &self.a, input.samples())?;
        Signal::new(output, input.sample_rate())
    }

    /// Magnitude of the frequency response at `frequency_hz`.
    pub fn gain_at(&self, frequency_hz: f64, sample_rate: u32) -> f64 {
        let omega = 2.0 * PI * frequency_hz / sample_rate as f64;
        let eval = |taps: &[f64]| {
            taps.iter()
                .enumerate()
                .fold(Complex::new(0.0, 0.0), |acc, (k, &t)| {
                    acc + Complex::from_polar(t, -omega * k as f64)
                })
        };
        (eval(&self.b) / eval(&self.a)).norm()
    }

    /// Returns true if every pole lies strictly inside the unit circle.
    ///
    /// Checked through the Jury/Schur-Cohn step-down recursion on `a`.
    pub fn is_stable(&self) -> bool {
        let mut coeffs: Vec<f64> = self.a.clone();
        while coeffs.len() > 1 {
            let m = coeffs.len() - 1;
            let k = coeffs[m] / coeffs[0];
            if k.abs() >= 1.0 {
                return false;
            }
            let next: Vec<f64> = (0..m)
                .map(|i| (coeffs[i] - k * coeffs[m - i]) / (1.0 - k * k))
                .collect();
            coeffs = next;
        }
        true
    }
}

/// Designs the recovery filter for `spec`.
pub fn design(spec: &FilterSpec) -> DspResult<FilterCoeffs> {
    FilterCoeffs::from_spec(spec)
}

/// Applies `coeffs` to `input` with zero initial state.
pub fn apply(coeffs: &FilterCoeffs, input: &Signal) -> DspResult<Signal> {
    coeffs.apply(input)
}

/// Recursive filtering of a raw sample slice (transposed direct form II).
///
/// `a` need not be normalized; both tap arrays are divided by `a[0]`. Arrays
/// of different lengths are zero-padded to the same length. Fails with
/// `InvalidState` for malformed tap arrays.
pub fn lfilter(b: &[f64], a: &[f64], x: &[f64]) -> DspResult<Vec<f64>> {
    check_taps(b, a)?;

    let len = b.len().max(a.len());
    let a0 = a[0];
    let mut bn = vec![0.0; len];
    let mut an = vec![0.0; len];
    for (dst, &src) in bn.iter_mut().zip(b) {
        *dst = src / a0;
    }
    for (dst, &src) in an.iter_mut().zip(a) {
        *dst = src / a0;
    }

    let mut state = vec![0.0; len - 1];
    let mut y = Vec::with_capacity(x.len());

    for &xn in x {
        let yn = bn[0] * xn + state.first().copied().unwrap_or(0.0);
        for i in 0..state.len() {
            let next = state.get(i + 1).copied().unwrap_or(0.0);
            state[i] = bn[i + 1] * xn + next - an[i + 1] * yn;
        }
        y.push(yn);
    }

    Ok(y)
}

fn check_taps(b: &[f64], a: &[f64]) -> DspResult<()> {
    if b.is_empty() {
        return Err(DspError::invalid_state("feedforward coefficients are empty"));
    }
    if a.is_empty() {
        return Err(DspError::invalid_state("feedback coefficients are empty"));
    }
    if a[0] == 0.0 {
        return Err(DspError::invalid_state("leading feedback coefficient is zero"));
    }
    if b.iter().chain(a).any(|c| !c.is_finite()) {
        return Err(DspError::invalid_state("coefficients must be finite"));
    }
    Ok(())
}

/// Expands roots into monic polynomial coefficients, highest power first.
fn poly(roots: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let mut coeffs = vec![Complex::new(1.0, 0.0)];
    for &root in roots {
        coeffs.push(Complex::new(0.0, 0.0));
        for i in (1..coeffs.len()).rev() {
            let prev = coeffs[i - 1];
            coeffs[i] -= root * prev;
        }
    }
    coeffs
}
