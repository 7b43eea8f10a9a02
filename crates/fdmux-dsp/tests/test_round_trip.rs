//! Multiplex/demultiplex round trip and cross-talk tests.

use std::f64::consts::PI;

use fdmux_dsp::pipeline::{receive, transmit};
use fdmux_dsp::{magnitude_spectrum, Signal};
use fdmux_spec::{ChannelConfig, FilterSpec};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

const SAMPLE_RATE: u32 = 44_100;
const LEN: usize = 22_050;
/// Samples skipped at the start to let the filter settle.
const SETTLE: usize = 2_000;

fn tone(freq: f64) -> Signal {
    Signal::from_fn(LEN, SAMPLE_RATE, |n| {
        (2.0 * PI * freq * n as f64 / SAMPLE_RATE as f64).sin()
    })
    .unwrap()
}

fn channels(carriers: &[f64]) -> Vec<ChannelConfig> {
    carriers
        .iter()
        .enumerate()
        .map(|(channel_index, &carrier_frequency)| ChannelConfig {
            carrier_frequency,
            channel_index,
        })
        .collect()
}

fn filter_spec() -> FilterSpec {
    FilterSpec {
        cutoff_hz: 4_000.0,
        order: 6,
        sample_rate: SAMPLE_RATE,
    }
}

/// Best normalized cross-correlation of `recovered` against `original` over
/// small causal lags (the filter delays its output by a few samples).
fn best_correlation(original: &[f64], recovered: &[f64]) -> f64 {
    (0..32)
        .map(|lag| {
            let end = original.len() - lag;
            let x = &original[SETTLE..end];
            let y = &recovered[SETTLE + lag..end + lag];
            let xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
            let xx: f64 = x.iter().map(|a| a * a).sum();
            let yy: f64 = y.iter().map(|b| b * b).sum();
            xy / (xx * yy).sqrt()
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

fn steady_peak(signal: &Signal) -> f64 {
    signal.samples()[SETTLE..]
        .iter()
        .fold(0.0_f64, |a, b| a.max(b.abs()))
}

#[test]
fn test_two_channel_round_trip() {
    let originals = vec![tone(220.0), tone(1_000.0)];
    let channels = channels(&[5_000.0, 15_000.0]);

    let transmission = transmit(&originals, &channels).unwrap();
    assert_eq!(transmission.composite.len(), LEN);

    let recovered = receive(&transmission.composite, &channels, &filter_spec()).unwrap();
    assert_eq!(recovered.len(), 2);

    for (original, channel) in originals.iter().zip(&recovered) {
        assert_eq!(channel.raw.len(), LEN);

        let correlation = best_correlation(original.samples(), channel.raw.samples());
        assert!(
            correlation > 0.9,
            "channel {} correlation {}",
            channel.channel_index,
            correlation
        );

        // Coherent detection halves the amplitude.
        let peak = steady_peak(&channel.raw);
        assert!((peak - 0.5).abs() < 0.05, "channel {} peak {}", channel.channel_index, peak);
    }
}

#[test]
fn test_noise_baseband_round_trip() {
    // Band-limited noise: white noise through the same low-pass filter.
    let mut rng = Pcg32::seed_from_u64(7);
    let white: Vec<f64> = (0..LEN).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let white = Signal::new(white, SAMPLE_RATE).unwrap();
    let shaped = fdmux_dsp::filter::design(&FilterSpec {
        cutoff_hz: 2_000.0,
        ..filter_spec()
    })
    .unwrap()
    .apply(&white)
    .unwrap();

    let originals = vec![shaped, tone(500.0)];
    let channels = channels(&[5_000.0, 15_000.0]);
    let transmission = transmit(&originals, &channels).unwrap();
    let recovered = receive(&transmission.composite, &channels, &filter_spec()).unwrap();

    let correlation = best_correlation(originals[0].samples(), recovered[0].raw.samples());
    assert!(correlation > 0.9, "noise channel correlation {}", correlation);
}

#[test]
fn test_cross_talk_is_suppressed() {
    // Only channel B carries signal; whatever channel A recovers is leakage.
    let silent = Signal::zeros(LEN, SAMPLE_RATE).unwrap();
    let originals = vec![silent, tone(1_000.0)];
    let channels = channels(&[5_000.0, 15_000.0]);

    let transmission = transmit(&originals, &channels).unwrap();
    let recovered = receive(&transmission.composite, &channels, &filter_spec()).unwrap();

    let wanted = steady_peak(&recovered[1].raw);
    let leaked = steady_peak(&recovered[0].raw);
    let rejection_db = 20.0 * (wanted / leaked).log10();
    // Leakage lands at 9 kHz and above; an order 6 filter is ~48 dB down there.
    assert!(rejection_db > 40.0, "cross-talk rejection {} dB", rejection_db);
}

#[test]
fn test_recovered_energy_stays_in_passband() {
    // Carriers 10 kHz apart, more than twice the 4 kHz cutoff, so the
    // neighbour's image lands at 8 kHz and above.
    let originals = vec![tone(880.0), tone(2_000.0)];
    let channels = channels(&[5_000.0, 15_000.0]);

    let transmission = transmit(&originals, &channels).unwrap();
    let recovered = receive(&transmission.composite, &channels, &filter_spec()).unwrap();
    assert_eq!(recovered.len(), 2);

    for channel in &recovered {
        let spectrum = magnitude_spectrum(&channel.normalized).unwrap();
        let fraction = spectrum.energy_fraction_below(4_000.0);
        assert!(
            fraction > 0.95,
            "channel {} passband fraction {}",
            channel.channel_index,
            fraction
        );
    }
}

#[test]
fn test_channels_are_independent() {
    let originals = vec![tone(300.0), tone(700.0)];
    let all = channels(&[5_000.0, 15_000.0]);
    let transmission = transmit(&originals, &all).unwrap();

    let together = receive(&transmission.composite, &all, &filter_spec()).unwrap();
    let alone = receive(&transmission.composite, &all[1..], &filter_spec()).unwrap();

    assert_eq!(alone[0].channel_index, 1);
    assert_eq!(together[1].raw, alone[0].raw);
}
