//! Run configuration types.
//!
//! A [`RunConfig`] fully describes one multiplexing run: which inputs to load,
//! the common sample rate, how much audio to keep, one carrier per channel and
//! the recovery filter. It is immutable once loaded and is passed explicitly to
//! every stage that needs it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SpecError;

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default maximum duration kept from each input, in seconds.
pub const DEFAULT_MAX_DURATION_SECONDS: f64 = 3.0;

/// Default carrier frequencies in Hz, one per channel.
pub const DEFAULT_CARRIER_FREQUENCIES: [f64; 3] = [5_000.0, 12_000.0, 18_000.0];

/// Default recovery filter cutoff in Hz.
pub const DEFAULT_FILTER_CUTOFF_HZ: f64 = 4_000.0;

/// Default recovery filter order.
pub const DEFAULT_FILTER_ORDER: usize = 6;

/// Highest Butterworth order accepted by validation.
///
/// The filter is applied in transfer-function form, which loses precision
/// quickly above this order at low normalized cutoffs.
pub const MAX_FILTER_ORDER: usize = 12;

/// Complete configuration for one multiplexing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Ordered input resource identifiers (one per channel).
    pub inputs: Vec<String>,
    /// Target sample rate in Hz; every input is loaded at this rate.
    pub sample_rate: u32,
    /// Maximum duration kept from each input, applied before length equalization.
    pub max_duration_seconds: f64,
    /// Carrier frequency in Hz for each channel, matched to `inputs` by index.
    pub carrier_frequencies: Vec<f64>,
    /// Recovery low-pass filter settings.
    pub filter: FilterSettings,
    /// Output artifact settings.
    pub output: OutputSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            inputs: vec![
                "audio_01.wav".to_string(),
                "audio_02.wav".to_string(),
                "audio_03.wav".to_string(),
            ],
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_duration_seconds: DEFAULT_MAX_DURATION_SECONDS,
            carrier_frequencies: DEFAULT_CARRIER_FREQUENCIES.to_vec(),
            filter: FilterSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl RunConfig {
    /// Parses a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a configuration file.
    pub fn from_path(path: &Path) -> Result<Self, SpecError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, SpecError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns one channel configuration per carrier, in channel order.
    pub fn channels(&self) -> Vec<ChannelConfig> {
        self.carrier_frequencies
            .iter()
            .enumerate()
            .map(|(channel_index, &carrier_frequency)| ChannelConfig {
                channel_index,
                carrier_frequency,
            })
            .collect()
    }

    /// Returns the recovery filter specification at the run's sample rate.
    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec {
            cutoff_hz: self.filter.cutoff_hz,
            order: self.filter.order,
            sample_rate: self.sample_rate,
        }
    }

    /// Maximum number of samples kept from each input.
    pub fn max_samples(&self) -> usize {
        (self.max_duration_seconds * self.sample_rate as f64).floor() as usize
    }

    /// Nyquist frequency of the run in Hz.
    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }
}

/// Recovery filter settings as they appear in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSettings {
    /// Cutoff frequency in Hz.
    pub cutoff_hz: f64,
    /// Butterworth filter order.
    pub order: usize,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            cutoff_hz: DEFAULT_FILTER_CUTOFF_HZ,
            order: DEFAULT_FILTER_ORDER,
        }
    }
}

/// Output artifact settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    /// Whether spectrum and spectrogram plots are rendered.
    pub plots: bool,
    /// Sample encoding for recovered channel WAV files.
    pub recovered_encoding: WavEncoding,
    /// Sample encoding for the composite WAV file.
    pub composite_encoding: WavEncoding,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            plots: true,
            recovered_encoding: WavEncoding::Pcm16,
            // The composite is a sum of channels and is never normalized.
            composite_encoding: WavEncoding::Float32,
        }
    }
}

/// Sample encoding for written WAV files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavEncoding {
    /// 16-bit signed integer PCM, clipped to [-1, 1].
    Pcm16,
    /// 32-bit IEEE float, stored unchanged.
    Float32,
}

impl WavEncoding {
    /// Returns the string representation used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            WavEncoding::Pcm16 => "pcm16",
            WavEncoding::Float32 => "float32",
        }
    }
}

impl std::fmt::Display for WavEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One logical channel: its position and the carrier it rides on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelConfig {
    /// Carrier frequency in Hz.
    pub carrier_frequency: f64,
    /// Zero-based channel index.
    pub channel_index: usize,
}

/// Parameters that fully determine a Butterworth low-pass filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    /// Cutoff frequency in Hz.
    pub cutoff_hz: f64,
    /// Filter order.
    pub order: usize,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl FilterSpec {
    /// Cutoff normalized to the Nyquist frequency (`Wn`).
    pub fn normalized_cutoff(&self) -> f64 {
        self.cutoff_hz / (self.sample_rate as f64 / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_matches_reference_run() {
        let config = RunConfig::default();
        assert_eq!(config.inputs.len(), 3);
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.carrier_frequencies, vec![5_000.0, 12_000.0, 18_000.0]);
        assert_eq!(config.filter.order, 6);
        assert_eq!(config.max_samples(), 3 * 44_100);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RunConfig::from_json(
            r#"{
                "inputs": ["a.wav", "b.wav"],
                "carrier_frequencies": [6000, 15000],
                "filter": { "cutoff_hz": 3000 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.inputs, vec!["a.wav".to_string(), "b.wav".to_string()]);
        assert_eq!(config.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(config.filter.cutoff_hz, 3_000.0);
        assert_eq!(config.filter.order, DEFAULT_FILTER_ORDER);
        assert_eq!(config.output, OutputSettings::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = RunConfig::from_json(r#"{ "carriers": [1000] }"#).unwrap_err();
        assert!(matches!(err, SpecError::JsonParse(_)));
    }

    #[test]
    fn test_encoding_names() {
        let settings: OutputSettings = serde_json::from_str(
            r#"{ "plots": false, "recovered_encoding": "float32", "composite_encoding": "pcm16" }"#,
        )
        .unwrap();
        assert!(!settings.plots);
        assert_eq!(settings.recovered_encoding, WavEncoding::Float32);
        assert_eq!(settings.composite_encoding.to_string(), "pcm16");
    }

    #[test]
    fn test_json_round_trip() {
        let config = RunConfig::default();
        let json = config.to_json_pretty().unwrap();
        assert_eq!(RunConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_channels_follow_carrier_order() {
        let config = RunConfig::default();
        let channels = config.channels();
        assert_eq!(channels.len(), 3);
        assert_eq!(channels[1].channel_index, 1);
        assert_eq!(channels[1].carrier_frequency, 12_000.0);
    }

    #[test]
    fn test_filter_spec_normalized_cutoff() {
        let spec = RunConfig::default().filter_spec();
        assert_eq!(spec.sample_rate, 44_100);
        assert!((spec.normalized_cutoff() - 4_000.0 / 22_050.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{ "sample_rate": 22050 }"#).unwrap();

        let config = RunConfig::from_path(&path).unwrap();
        assert_eq!(config.sample_rate, 22_050);

        let missing = RunConfig::from_path(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, SpecError::Io(_)));
    }
}
