//! WAV input and output.
//!
//! Inputs are decoded with `hound`, mixed down to mono and brought to the run's
//! sample rate. Outputs are encoded fully in memory so that a run can produce
//! every artifact before anything touches the filesystem.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use fdmux_spec::WavEncoding;

use crate::error::{DspError, DspResult};
use crate::signal::Signal;

/// Something that can supply a mono signal for a named resource.
pub trait AudioSource {
    /// Loads `resource` as a mono signal at `target_rate`.
    ///
    /// Must fail with [`DspError::Load`] rather than return partial data.
    fn load(&self, resource: &str, target_rate: u32) -> DspResult<Signal>;
}

/// Loads WAV files, resolving relative resource names against a root directory.
#[derive(Debug, Clone)]
pub struct WavFileSource {
    root: PathBuf,
}

impl WavFileSource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves a resource identifier to a file path.
    pub fn resolve(&self, resource: &str) -> PathBuf {
        let path = Path::new(resource);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl AudioSource for WavFileSource {
    fn load(&self, resource: &str, target_rate: u32) -> DspResult<Signal> {
        let path = self.resolve(resource);
        let file = std::fs::File::open(&path)
            .map_err(|e| DspError::load(resource, format!("{}: {}", path.display(), e)))?;
        decode_wav(std::io::BufReader::new(file), resource, target_rate)
    }
}

/// Reads a WAV file as a mono signal at `target_rate`.
pub fn read_wav(path: &Path, target_rate: u32) -> DspResult<Signal> {
    let resource = path.display().to_string();
    let file =
        std::fs::File::open(path).map_err(|e| DspError::load(resource.as_str(), e.to_string()))?;
    decode_wav(std::io::BufReader::new(file), &resource, target_rate)
}

/// Decodes WAV data as a mono signal at `target_rate`.
///
/// Integer PCM (8 to 32 bit) and 32-bit float are supported. Multi-channel
/// data is averaged to mono; a differing sample rate is converted by linear
/// interpolation. Float data containing NaN or infinity fails with `Load`.
pub fn decode_wav<R: Read>(reader: R, resource: &str, target_rate: u32) -> DspResult<Signal> {
    if target_rate == 0 {
        return Err(DspError::invalid_param("target_rate", "must be positive"));
    }

    let reader = hound::WavReader::new(reader)
        .map_err(|e| DspError::load(resource, format!("not a readable WAV file: {}", e)))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(DspError::load(resource, "WAV header declares zero channels"));
    }

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(DspError::load(
                    resource,
                    format!("unsupported bit depth: {}", spec.bits_per_sample),
                ));
            }
            let full_scale = (1_i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(|e| DspError::load(resource, format!("failed to decode samples: {}", e)))?
        }
        hound::SampleFormat::Float => {
            let samples: Vec<f64> = reader
                .into_samples::<f32>()
                .map(|s| s.map(f64::from))
                .collect::<Result<_, _>>()
                .map_err(|e| {
                    DspError::load(resource, format!("failed to decode samples: {}", e))
                })?;
            if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
                return Err(DspError::load(
                    resource,
                    format!("non-finite sample {} at index {}", samples[index], index),
                ));
            }
            samples
        }
    };

    let mono = downmix(&interleaved, spec.channels);
    let samples = resample_linear(&mono, spec.sample_rate, target_rate);

    log::debug!(
        "loaded '{}': {} ch @ {} Hz -> {} mono samples @ {} Hz",
        resource,
        spec.channels,
        spec.sample_rate,
        samples.len(),
        target_rate
    );

    Signal::new(samples, target_rate)
}

/// Averages interleaved frames down to one channel.
fn downmix(interleaved: &[f64], channels: u16) -> Vec<f64> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    let channels = channels as usize;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f64>() / channels as f64)
        .collect()
}

/// Resamples audio using deterministic linear interpolation.
///
/// # Arguments
/// * `samples` - Input samples
/// * `from_rate` - Source sample rate
/// * `to_rate` - Target sample rate
pub fn resample_linear(samples: &[f64], from_rate: u32, to_rate: u32) -> Vec<f64> {
    if samples.is_empty() || from_rate == to_rate || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as u64 * to_rate as u64).div_ceil(from_rate as u64) as usize;
    let last = samples.len() - 1;

    (0..output_len)
        .map(|i| {
            let src_pos = i as f64 * ratio;
            let src_idx = (src_pos.floor() as usize).min(last);
            let frac = src_pos - src_idx as f64;
            if src_idx < last {
                let s0 = samples[src_idx];
                let s1 = samples[src_idx + 1];
                s0 + (s1 - s0) * frac
            } else {
                samples[last]
            }
        })
        .collect()
}

/// Encodes a signal as a complete mono WAV file in memory.
///
/// `Pcm16` clips samples to [-1, 1]; `Float32` stores them unchanged.
pub fn encode_wav(signal: &Signal, encoding: WavEncoding) -> DspResult<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: signal.sample_rate(),
        bits_per_sample: match encoding {
            WavEncoding::Pcm16 => 16,
            WavEncoding::Float32 => 32,
        },
        sample_format: match encoding {
            WavEncoding::Pcm16 => hound::SampleFormat::Int,
            WavEncoding::Float32 => hound::SampleFormat::Float,
        },
    };

    let mut bytes = Vec::with_capacity(44 + signal.len() * spec.bits_per_sample as usize / 8);
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).map_err(encode_err)?;
        for &sample in signal.samples() {
            match encoding {
                WavEncoding::Pcm16 => {
                    let value = (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16;
                    writer.write_sample(value).map_err(encode_err)?;
                }
                WavEncoding::Float32 => {
                    writer.write_sample(sample as f32).map_err(encode_err)?;
                }
            }
        }
        writer.finalize().map_err(encode_err)?;
    }
    Ok(bytes)
}

/// BLAKE3 hex digest of encoded output bytes.
pub fn pcm_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

fn encode_err(e: hound::Error) -> DspError {
    match e {
        hound::Error::IoError(io) => DspError::Io(io),
        other => DspError::Encode {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn write_fixture(path: &Path, spec: hound::WavSpec, frames: &[Vec<i16>]) {
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for &s in frame {
                writer.write_sample(s).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_encode_decode_pcm16() {
        let signal = Signal::from_fn(441, 44_100, |n| 0.5 * (2.0 * PI * n as f64 / 100.0).sin())
            .unwrap();
        let bytes = encode_wav(&signal, WavEncoding::Pcm16).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");

        let decoded = decode_wav(Cursor::new(bytes), "memory", 44_100).unwrap();
        assert_eq!(decoded.len(), 441);
        for (a, b) in decoded.samples().iter().zip(signal.samples()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_float32_keeps_out_of_range_values() {
        let signal = Signal::new(vec![2.5, -3.0, 0.25], 8_000).unwrap();
        let bytes = encode_wav(&signal, WavEncoding::Float32).unwrap();
        let decoded = decode_wav(Cursor::new(bytes), "memory", 8_000).unwrap();
        assert_eq!(decoded.samples(), &[2.5, -3.0, 0.25]);
    }

    #[test]
    fn test_pcm16_clips() {
        let signal = Signal::new(vec![2.0, -2.0], 8_000).unwrap();
        let bytes = encode_wav(&signal, WavEncoding::Pcm16).unwrap();
        let decoded = decode_wav(Cursor::new(bytes), "memory", 8_000).unwrap();
        assert!((decoded.samples()[0] - 32767.0 / 32768.0).abs() < 1e-12);
        assert!((decoded.samples()[1] + 32767.0 / 32768.0).abs() < 1e-12);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let signal = Signal::from_fn(1_000, 22_050, |n| (n as f64 * 0.01).sin()).unwrap();
        let a = encode_wav(&signal, WavEncoding::Pcm16).unwrap();
        let b = encode_wav(&signal, WavEncoding::Pcm16).unwrap();
        assert_eq!(pcm_hash(&a), pcm_hash(&b));
        assert_eq!(pcm_hash(&a).len(), 64);
    }

    #[test]
    fn test_stereo_downmix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_fixture(&path, spec, &[vec![16_384, 0], vec![-16_384, -16_384]]);

        let signal = read_wav(&path, 8_000).unwrap();
        assert_eq!(signal.samples(), &[0.25, -0.5]);
    }

    #[test]
    fn test_resampling_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("low_rate.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let frames: Vec<Vec<i16>> = (0..2_205).map(|_| vec![8_192]).collect();
        write_fixture(&path, spec, &frames);

        let signal = read_wav(&path, 44_100).unwrap();
        assert_eq!(signal.sample_rate(), 44_100);
        assert_eq!(signal.len(), 4_410);
        assert!(signal.samples().iter().all(|&s| (s - 0.25).abs() < 1e-12));
    }

    #[test]
    fn test_resample_linear_interpolates() {
        let out = resample_linear(&[0.0, 1.0, 2.0], 1, 2);
        assert_eq!(out, vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.0]);
        assert_eq!(resample_linear(&[1.0, 2.0], 8_000, 8_000), vec![1.0, 2.0]);
        assert!(resample_linear(&[], 8_000, 16_000).is_empty());
    }

    #[test]
    fn test_file_source_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let source = WavFileSource::new(dir.path());
        assert_eq!(source.resolve("a.wav"), dir.path().join("a.wav"));

        let absolute = dir.path().join("b.wav");
        assert_eq!(source.resolve(absolute.to_str().unwrap()), absolute);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = WavFileSource::new(dir.path());
        let err = source.load("missing.wav", 44_100).unwrap_err();
        assert!(matches!(err, DspError::Load { ref resource, .. } if resource == "missing.wav"));
    }

    #[test]
    fn test_garbage_is_load_error() {
        let err = decode_wav(Cursor::new(b"definitely not a wav".to_vec()), "junk", 44_100)
            .unwrap_err();
        assert!(matches!(err, DspError::Load { .. }));
    }
}
