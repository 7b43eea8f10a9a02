//! fdmux signal chain
//!
//! This crate implements the transmit and receive sides of a
//! frequency-division multiplexing (FDM) link over finite audio buffers.
//!
//! # Overview
//!
//! Each input signal is amplitude-modulated onto its own carrier and the
//! modulated channels are summed into one composite signal. Each channel is
//! then recovered by coherent detection (multiplying the composite by the
//! channel's carrier again) followed by a Butterworth low-pass filter, and
//! finally normalized to a peak of 1.0.
//!
//! - **Carrier** - `cos(2π·f·n/fs)` sample sequences
//! - **Modulation** - elementwise product of baseband and carrier
//! - **Multiplex** - elementwise sum of modulated channels
//! - **Filter** - Butterworth design by bilinear transform, applied in
//!   transposed direct form II
//! - **Spectrum** - magnitude spectra and spectrograms for inspection only
//!
//! # Determinism
//!
//! Every stage is a pure function of its inputs. Filter state starts at zero
//! for every call, so a channel's recovery can be reproduced in isolation.
//!
//! # Example
//!
//! ```
//! use fdmux_dsp::{pipeline, Signal};
//! use fdmux_spec::RunConfig;
//!
//! let config = RunConfig {
//!     inputs: vec!["a.wav".into(), "b.wav".into()],
//!     carrier_frequencies: vec![5_000.0, 15_000.0],
//!     max_duration_seconds: 0.05,
//!     ..RunConfig::default()
//! };
//! let tone = |f: f64| {
//!     Signal::from_fn(2_205, 44_100, |n| {
//!         (2.0 * std::f64::consts::PI * f * n as f64 / 44_100.0).sin()
//!     })
//! };
//!
//! let output = pipeline::run(&[tone(300.0)?, tone(800.0)?], &config)?;
//! assert_eq!(output.recovered.len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Crate Structure
//!
//! - [`signal`] - Sample buffer type and shape helpers
//! - [`carrier`] - Carrier generation
//! - [`modulation`] - Amplitude modulation
//! - [`multiplex`] - Channel summation
//! - [`filter`] - Butterworth design and recursive filtering
//! - [`demux`] - Coherent demodulation
//! - [`spectrum`] - Spectral analysis
//! - [`wav`] - WAV loading and encoding
//! - [`pipeline`] - Run orchestration with stage-tagged errors

pub mod carrier;
pub mod demux;
pub mod error;
pub mod filter;
pub mod modulation;
pub mod multiplex;
pub mod pipeline;
pub mod signal;
pub mod spectrum;
pub mod wav;

// Re-export main types at crate root
pub use demux::{demodulate, Demodulator};
pub use error::{DspError, DspResult};
pub use filter::FilterCoeffs;
pub use modulation::modulate;
pub use multiplex::multiplex;
pub use pipeline::{
    PipelineError, PipelineOutput, PipelineResult, RecoveredChannel, Stage, Transmission,
};
pub use signal::Signal;
pub use spectrum::{magnitude_spectrum, spectrogram, Spectrogram, Spectrum};
pub use wav::{encode_wav, pcm_hash, AudioSource, WavFileSource};
