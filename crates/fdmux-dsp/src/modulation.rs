//! Amplitude modulation by carrier multiplication.

use crate::error::DspResult;
use crate::signal::Signal;

/// Multiplies a baseband signal by a carrier, sample by sample.
///
/// Fails with `LengthMismatch` when the two signals differ in length and with
/// `SampleRateMismatch` when their sample rates differ.
pub fn modulate(baseband: &Signal, carrier: &Signal) -> DspResult<Signal> {
    baseband.ensure_same_shape(carrier)?;

    let product = baseband
        .samples()
        .iter()
        .zip(carrier.samples())
        .map(|(b, c)| b * c)
        .collect();
    Signal::new(product, baseband.sample_rate())
}
