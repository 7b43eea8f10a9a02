//! WAV loader integration tests across sample formats.

use std::io::Cursor;

use fdmux_dsp::wav::{decode_wav, read_wav};
use fdmux_dsp::{encode_wav, pcm_hash, AudioSource, DspError, Signal, WavFileSource};
use fdmux_spec::WavEncoding;

fn int_spec(bits: u16, channels: u16, sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: bits,
        sample_format: hound::SampleFormat::Int,
    }
}

#[test]
fn test_8_bit_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eight.wav");
    let mut writer = hound::WavWriter::create(&path, int_spec(8, 1, 8_000)).unwrap();
    for v in [64_i8, -64, 0, -128] {
        writer.write_sample(v).unwrap();
    }
    writer.finalize().unwrap();

    let signal = read_wav(&path, 8_000).unwrap();
    assert_eq!(signal.samples(), &[0.5, -0.5, 0.0, -1.0]);
}

#[test]
fn test_24_bit_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deep.wav");
    let mut writer = hound::WavWriter::create(&path, int_spec(24, 1, 8_000)).unwrap();
    for v in [4_194_304_i32, -8_388_608, 2_097_152] {
        writer.write_sample(v).unwrap();
    }
    writer.finalize().unwrap();

    let signal = read_wav(&path, 8_000).unwrap();
    assert_eq!(signal.samples(), &[0.5, -1.0, 0.25]);
}

#[test]
fn test_stereo_float_downmix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.wav");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 16_000,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for v in [1.0_f32, 0.0, -0.5, -1.5] {
        writer.write_sample(v).unwrap();
    }
    writer.finalize().unwrap();

    let signal = WavFileSource::new(dir.path()).load("stereo.wav", 16_000).unwrap();
    assert_eq!(signal.samples(), &[0.5, -1.0]);
}

#[test]
fn test_encoded_output_reloads() {
    let signal = Signal::from_fn(2_000, 44_100, |n| ((n % 64) as f64 - 32.0) / 32.0).unwrap();
    let bytes = encode_wav(&signal, WavEncoding::Float32).unwrap();

    let reader = hound::WavReader::new(Cursor::new(bytes.clone())).unwrap();
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.spec().sample_rate, 44_100);
    assert_eq!(reader.len(), 2_000);

    let reloaded = decode_wav(Cursor::new(bytes.clone()), "memory", 44_100).unwrap();
    assert_eq!(reloaded, signal);
    assert_ne!(
        pcm_hash(&bytes),
        pcm_hash(&encode_wav(&signal, WavEncoding::Pcm16).unwrap())
    );
}

#[test]
fn test_truncated_file_is_load_error() {
    let signal = Signal::zeros(1_000, 8_000).unwrap();
    let bytes = encode_wav(&signal, WavEncoding::Pcm16).unwrap();
    let cut = bytes[..bytes.len() / 2].to_vec();

    let err = decode_wav(Cursor::new(cut), "cut.wav", 8_000).unwrap_err();
    assert!(matches!(err, DspError::Load { .. }));
}

fn write_float_mono(path: &std::path::Path, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44_100,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &v in samples {
        writer.write_sample(v).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn test_non_finite_float_input_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = WavFileSource::new(dir.path());

    for (name, bad) in [
        ("inf.wav", f32::INFINITY),
        ("neg_inf.wav", f32::NEG_INFINITY),
        ("nan.wav", f32::NAN),
    ] {
        let mut samples = vec![0.25_f32; 4_410];
        samples[100] = bad;
        write_float_mono(&dir.path().join(name), &samples);

        let err = source.load(name, 44_100).unwrap_err();
        match err {
            DspError::Load {
                ref resource,
                ref message,
            } => {
                assert_eq!(resource, name);
                assert!(message.contains("index 100"), "message: {}", message);
            }
            other => panic!("expected load error for {}, got {}", name, other),
        }
    }
}

#[test]
fn test_non_finite_input_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut corrupt = vec![0.25_f32; 4_410];
    corrupt[100] = f32::INFINITY;
    write_float_mono(&dir.path().join("a.wav"), &corrupt);
    write_float_mono(&dir.path().join("b.wav"), &[0.25_f32; 4_410]);

    let config = fdmux_spec::RunConfig {
        inputs: vec!["a.wav".to_string(), "b.wav".to_string()],
        max_duration_seconds: 0.1,
        carrier_frequencies: vec![5_000.0, 15_000.0],
        ..Default::default()
    };
    let err = fdmux_dsp::pipeline::load_all(&WavFileSource::new(dir.path()), &config)
        .unwrap_err();
    assert_eq!(err.stage(), Some(fdmux_dsp::pipeline::Stage::Load));
    assert_eq!(err.channel(), Some(0));
}
