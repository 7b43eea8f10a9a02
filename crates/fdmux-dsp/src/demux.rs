//! Coherent demodulation and channel recovery.

use fdmux_spec::{ChannelConfig, FilterSpec};

use crate::carrier;
use crate::error::DspResult;
use crate::filter::FilterCoeffs;
use crate::modulation::modulate;
use crate::signal::Signal;

/// Recovers one channel from a composite signal.
///
/// The composite is multiplied by the channel's own carrier, which shifts the
/// channel back to baseband at half amplitude, and the result is low-pass
/// filtered with a Butterworth filter designed from `filter_spec`. Filter
/// state starts at zero on every call.
pub fn demodulate(composite: &Signal, carrier: &Signal, filter_spec: &FilterSpec) -> DspResult<Signal> {
    let coeffs = FilterCoeffs::from_spec(filter_spec)?;
    demodulate_with(composite, carrier, &coeffs)
}

/// Like [`demodulate`], reusing already designed coefficients.
pub fn demodulate_with(composite: &Signal, carrier: &Signal, coeffs: &FilterCoeffs) -> DspResult<Signal> {
    let detected = modulate(composite, carrier)?;
    coeffs.apply(&detected)
}

/// Per-channel receiver: owns the channel's carrier and the recovery filter.
#[derive(Debug, Clone)]
pub struct Demodulator {
    channel: ChannelConfig,
    coeffs: FilterCoeffs,
}

impl Demodulator {
    /// Creates a receiver for `channel`.
    pub fn new(channel: ChannelConfig, filter_spec: &FilterSpec) -> DspResult<Self> {
        Ok(Self {
            channel,
            coeffs: FilterCoeffs::from_spec(filter_spec)?,
        })
    }

    /// The channel this receiver recovers.
    pub fn channel(&self) -> &ChannelConfig {
        &self.channel
    }

    /// Recovers the channel's baseband estimate from `composite`.
    ///
    /// The carrier is generated fresh for the composite's length and rate.
    pub fn recover(&self, composite: &Signal) -> DspResult<Signal> {
        let carrier = carrier::generate(
            self.channel.carrier_frequency,
            composite.sample_rate(),
            composite.len(),
        )?;
        log::debug!(
            "demodulating channel {} at {} Hz",
            self.channel.channel_index,
            self.channel.carrier_frequency
        );
        demodulate_with(composite, &carrier, &self.coeffs)
    }
}
