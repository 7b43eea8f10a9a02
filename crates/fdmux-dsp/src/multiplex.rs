//! Frequency-division multiplexing by summation.

use crate::error::{DspError, DspResult};
use crate::signal::Signal;

/// Sums modulated channel signals into one composite signal.
///
/// Every channel must share the first channel's length and sample rate.
/// Output sample `n` is the sum over channels of sample `n`.
pub fn multiplex(channels: &[Signal]) -> DspResult<Signal> {
    let first = channels
        .first()
        .ok_or_else(|| DspError::invalid_param("channels", "at least one channel is required"))?;

    for channel in &channels[1..] {
        first.ensure_same_shape(channel)?;
    }

    let mut composite = vec![0.0; first.len()];
    for channel in channels {
        for (out, &sample) in composite.iter_mut().zip(channel.samples()) {
            *out += sample;
        }
    }

    log::debug!(
        "multiplexed {} channel(s) of {} samples",
        channels.len(),
        first.len()
    );

    Signal::new(composite, first.sample_rate())
}
