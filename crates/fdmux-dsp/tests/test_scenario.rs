//! Reference three-channel run, end to end from WAV files.

use std::f64::consts::PI;
use std::path::Path;

use fdmux_dsp::pipeline::{self, Stage};
use fdmux_dsp::{magnitude_spectrum, WavFileSource};
use fdmux_spec::{CodedError, RunConfig, WarningCode};

fn write_tone(path: &Path, freqs: &[f64], seconds: f64, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let len = (seconds * sample_rate as f64) as usize;
    let scale = 0.9 / freqs.len() as f64;
    for n in 0..len {
        let t = n as f64 / sample_rate as f64;
        let value: f64 = freqs.iter().map(|f| (2.0 * PI * f * t).sin()).sum();
        writer.write_sample((value * scale) as f32).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn test_reference_scenario() {
    let dir = tempfile::tempdir().unwrap();
    // The third input is longer than the configured maximum duration.
    write_tone(&dir.path().join("audio_01.wav"), &[440.0], 3.0, 44_100);
    write_tone(&dir.path().join("audio_02.wav"), &[660.0, 1_500.0], 3.0, 44_100);
    write_tone(&dir.path().join("audio_03.wav"), &[250.0, 2_000.0], 4.0, 44_100);

    let config = RunConfig::default();
    let source = WavFileSource::new(dir.path());
    let signals = pipeline::load_all(&source, &config).unwrap();
    assert_eq!(signals[2].len(), 4 * 44_100);

    let output = pipeline::run(&signals, &config).unwrap();

    assert_eq!(output.transmission.composite.len(), 3 * 44_100);
    assert_eq!(output.transmission.composite.sample_rate(), 44_100);
    assert!(output.originals.iter().all(|s| s.len() == 3 * 44_100));

    assert_eq!(output.recovered.len(), 3);
    for channel in &output.recovered {
        assert_eq!(channel.normalized.len(), 3 * 44_100);
        assert!((channel.normalized.peak() - 1.0).abs() < 1e-12);
    }

    let spectrum = magnitude_spectrum(&output.recovered[0].normalized).unwrap();
    assert!(spectrum.energy_fraction_below(4_000.0) > 0.95);
    assert!((spectrum.dominant_frequency() - 440.0).abs() < 1.0);

    // 12 kHz and 18 kHz are closer than twice the cutoff.
    assert!(output
        .warnings
        .iter()
        .any(|w| w.code == WarningCode::CarrierSpacingOverlap));
}

#[test]
fn test_missing_input_aborts_with_channel() {
    let dir = tempfile::tempdir().unwrap();
    write_tone(&dir.path().join("audio_01.wav"), &[440.0], 0.1, 44_100);
    write_tone(&dir.path().join("audio_03.wav"), &[440.0], 0.1, 44_100);

    let source = WavFileSource::new(dir.path());
    let err = pipeline::load_all(&source, &RunConfig::default()).unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Load));
    assert_eq!(err.channel(), Some(1));
    assert_eq!(err.category(), "dsp");
    assert!(err.to_string().contains("audio_02.wav"));
}

#[test]
fn test_inputs_are_resampled_to_run_rate() {
    let dir = tempfile::tempdir().unwrap();
    write_tone(&dir.path().join("a.wav"), &[440.0], 0.5, 48_000);
    write_tone(&dir.path().join("b.wav"), &[440.0], 0.5, 22_050);

    let config = RunConfig {
        inputs: vec!["a.wav".into(), "b.wav".into()],
        carrier_frequencies: vec![5_000.0, 15_000.0],
        ..RunConfig::default()
    };
    let source = WavFileSource::new(dir.path());
    let signals = pipeline::load_all(&source, &config).unwrap();

    assert!(signals.iter().all(|s| s.sample_rate() == 44_100));
    assert_eq!(signals[0].len(), 22_050);
    assert_eq!(signals[1].len(), 22_050);

    let output = pipeline::run(&signals, &config).unwrap();
    assert_eq!(output.transmission.composite.len(), 22_050);
}
