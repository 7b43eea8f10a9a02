//! Run orchestration: load, prepare, transmit and receive.
//!
//! Every stage fails fast. A failure in any channel aborts the whole run and is
//! reported with the stage and channel that caused it; there is no partial
//! recovery.

use std::fmt;

use fdmux_spec::{
    validate_config, ChannelConfig, CodedError, FilterSpec, RunConfig, SpecError,
    ValidationWarning,
};
use thiserror::Error;

use crate::carrier;
use crate::demux::Demodulator;
use crate::error::DspError;
use crate::modulation::modulate;
use crate::multiplex::multiplex;
use crate::signal::{equalize_lengths, Signal};
use crate::wav::AudioSource;

/// Pipeline stage, used to tag failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Load,
    Prepare,
    Carrier,
    Modulate,
    Multiplex,
    FilterDesign,
    Demodulate,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Prepare => "prepare",
            Stage::Carrier => "carrier",
            Stage::Modulate => "modulate",
            Stage::Multiplex => "multiplex",
            Stage::FilterDesign => "filter-design",
            Stage::Demodulate => "demodulate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration was rejected before any processing started.
    #[error(transparent)]
    Config(#[from] SpecError),

    /// A processing stage failed.
    #[error("{stage} stage failed{}: {source}", channel_label(.channel))]
    Stage {
        stage: Stage,
        /// Zero-based channel index, if the failure belongs to one channel.
        channel: Option<usize>,
        source: DspError,
    },
}

fn channel_label(channel: &Option<usize>) -> String {
    match channel {
        Some(index) => format!(" for channel {}", index + 1),
        None => String::new(),
    }
}

impl PipelineError {
    fn at(stage: Stage, channel: Option<usize>) -> impl FnOnce(DspError) -> Self {
        move |source| PipelineError::Stage {
            stage,
            channel,
            source,
        }
    }

    /// The failing stage, if this is a stage failure.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            PipelineError::Config(_) => None,
        }
    }

    /// The failing channel, if the failure belongs to one channel.
    pub fn channel(&self) -> Option<usize> {
        match self {
            PipelineError::Stage { channel, .. } => *channel,
            PipelineError::Config(_) => None,
        }
    }
}

impl CodedError for PipelineError {
    fn code(&self) -> &'static str {
        match self {
            PipelineError::Config(e) => e.code(),
            PipelineError::Stage { source, .. } => source.code(),
        }
    }

    fn category(&self) -> &'static str {
        match self {
            PipelineError::Config(e) => e.category(),
            PipelineError::Stage { source, .. } => source.category(),
        }
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Transmit side of a run.
#[derive(Debug, Clone)]
pub struct Transmission {
    /// Modulated signal per channel, in channel order.
    pub modulated: Vec<Signal>,
    /// Sum of all modulated channels.
    pub composite: Signal,
}

/// One channel's receiver output.
#[derive(Debug, Clone)]
pub struct RecoveredChannel {
    pub channel_index: usize,
    pub carrier_frequency: f64,
    /// Filter output before normalization.
    pub raw: Signal,
    /// `raw` scaled to a peak of 1.0 (unchanged if silent).
    pub normalized: Signal,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Prepared inputs (truncated and equalized).
    pub originals: Vec<Signal>,
    pub transmission: Transmission,
    pub recovered: Vec<RecoveredChannel>,
    /// Non-fatal findings from configuration validation.
    pub warnings: Vec<ValidationWarning>,
}

/// Loads every configured input at the run's sample rate.
///
/// Stops at the first input that cannot be loaded.
pub fn load_all(source: &dyn AudioSource, config: &RunConfig) -> PipelineResult<Vec<Signal>> {
    config
        .inputs
        .iter()
        .enumerate()
        .map(|(index, resource)| {
            log::debug!("loading channel {} from '{}'", index + 1, resource);
            source
                .load(resource, config.sample_rate)
                .map_err(PipelineError::at(Stage::Load, Some(index)))
        })
        .collect()
}

/// Brings loaded signals to a common shape.
///
/// Every signal must share the first signal's sample rate. Each one is cut to
/// `max_samples`, then all are cut to the shortest remaining length.
pub fn prepare_channels(signals: &[Signal], max_samples: usize) -> PipelineResult<Vec<Signal>> {
    let first = signals.first().ok_or_else(|| {
        PipelineError::at(Stage::Prepare, None)(DspError::invalid_param(
            "signals",
            "at least one input signal is required",
        ))
    })?;

    let mut truncated = Vec::with_capacity(signals.len());
    for (index, signal) in signals.iter().enumerate() {
        if signal.sample_rate() != first.sample_rate() {
            return Err(PipelineError::at(Stage::Prepare, Some(index))(
                DspError::SampleRateMismatch {
                    expected: first.sample_rate(),
                    found: signal.sample_rate(),
                },
            ));
        }
        let cut = signal.truncate(max_samples);
        if cut.is_empty() {
            return Err(PipelineError::at(Stage::Prepare, Some(index))(
                DspError::invalid_param("signal", "input has no samples"),
            ));
        }
        truncated.push(cut);
    }

    let prepared = equalize_lengths(&truncated);
    log::debug!(
        "prepared {} channel(s) of {} samples",
        prepared.len(),
        prepared[0].len()
    );
    Ok(prepared)
}

/// Modulates each signal onto its channel's carrier and sums the results.
///
/// `signals[i]` is transmitted on `channels[i]`.
pub fn transmit(signals: &[Signal], channels: &[ChannelConfig]) -> PipelineResult<Transmission> {
    if signals.len() != channels.len() {
        return Err(PipelineError::at(Stage::Modulate, None)(
            DspError::invalid_param(
                "channels",
                format!(
                    "{} signal(s) but {} channel(s) configured",
                    signals.len(),
                    channels.len()
                ),
            ),
        ));
    }

    let mut modulated = Vec::with_capacity(signals.len());
    for (signal, channel) in signals.iter().zip(channels) {
        let index = Some(channel.channel_index);
        let c = carrier::generate(channel.carrier_frequency, signal.sample_rate(), signal.len())
            .map_err(PipelineError::at(Stage::Carrier, index))?;
        modulated.push(modulate(signal, &c).map_err(PipelineError::at(Stage::Modulate, index))?);
    }

    let composite = multiplex(&modulated).map_err(PipelineError::at(Stage::Multiplex, None))?;
    Ok(Transmission {
        modulated,
        composite,
    })
}

/// Recovers every channel from the composite signal.
///
/// Each channel is demodulated with its own carrier and filtered from a zero
/// initial state, so channels never influence each other's processing.
pub fn receive(
    composite: &Signal,
    channels: &[ChannelConfig],
    filter_spec: &FilterSpec,
) -> PipelineResult<Vec<RecoveredChannel>> {
    channels
        .iter()
        .map(|&channel| {
            let index = Some(channel.channel_index);
            let receiver = Demodulator::new(channel, filter_spec)
                .map_err(PipelineError::at(Stage::FilterDesign, index))?;
            let raw = receiver
                .recover(composite)
                .map_err(PipelineError::at(Stage::Demodulate, index))?;
            let normalized = raw.normalize();
            log::debug!(
                "channel {} recovered, raw peak {:.4}",
                channel.channel_index + 1,
                raw.peak()
            );
            Ok(RecoveredChannel {
                channel_index: channel.channel_index,
                carrier_frequency: channel.carrier_frequency,
                raw,
                normalized,
            })
        })
        .collect()
}

/// Runs the whole chain on already loaded signals.
///
/// The configuration is validated first. Signals must be at the configured
/// sample rate and there must be one per configured carrier.
pub fn run(signals: &[Signal], config: &RunConfig) -> PipelineResult<PipelineOutput> {
    let warnings = validate_config(config).into_result()?;
    for warning in &warnings {
        log::warn!("{}", warning);
    }

    for (index, signal) in signals.iter().enumerate() {
        if signal.sample_rate() != config.sample_rate {
            return Err(PipelineError::at(Stage::Prepare, Some(index))(
                DspError::SampleRateMismatch {
                    expected: config.sample_rate,
                    found: signal.sample_rate(),
                },
            ));
        }
    }

    let channels = config.channels();
    let originals = prepare_channels(signals, config.max_samples())?;
    let transmission = transmit(&originals, &channels)?;
    let recovered = receive(&transmission.composite, &channels, &config.filter_spec())?;

    log::info!(
        "recovered {} channel(s), {} samples @ {} Hz",
        recovered.len(),
        transmission.composite.len(),
        config.sample_rate
    );

    Ok(PipelineOutput {
        originals,
        transmission,
        recovered,
        warnings,
    })
}
