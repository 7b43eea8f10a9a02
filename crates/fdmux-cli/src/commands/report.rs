//! Run report written next to the outputs as `report.json`.

use fdmux_dsp::{magnitude_spectrum, PipelineOutput};
use fdmux_spec::RunConfig;
use serde::{Deserialize, Serialize};

use super::json_output::{GeneratedFile, JsonWarning};

/// File name of the run report inside the output directory.
pub const REPORT_FILE: &str = "report.json";

/// Summary of one recovered channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelReport {
    /// One-based channel number.
    pub channel: usize,
    /// Input resource the channel was loaded from.
    pub input: String,
    /// Carrier frequency in Hz.
    pub carrier_frequency: f64,
    /// Peak of the filter output before normalization.
    pub raw_peak: f64,
    /// Strongest non-DC frequency in the recovered signal.
    pub dominant_frequency_hz: f64,
    /// Share of recovered energy below the filter cutoff.
    pub passband_energy_fraction: f64,
    /// Recovered audio file name.
    pub output: String,
}

/// Machine-readable record of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Tool name and version.
    pub tool: String,
    /// The configuration the run used.
    pub config: RunConfig,
    /// Samples per channel after truncation and equalization.
    pub num_samples: usize,
    /// Duration of each channel in seconds.
    pub duration_seconds: f64,
    /// Per-channel summaries, in channel order.
    pub channels: Vec<ChannelReport>,
    /// Every file written alongside this report.
    pub outputs: Vec<GeneratedFile>,
    /// Validation and plotting warnings.
    pub warnings: Vec<JsonWarning>,
}

/// Name of the recovered audio file for a zero-based channel index.
pub fn recovered_file_name(channel_index: usize) -> String {
    format!("recovered_{}.wav", channel_index + 1)
}

/// Summarizes each recovered channel.
///
/// Spectral figures fall back to zero if the spectrum cannot be computed
/// (fewer than two samples).
pub fn channel_reports(config: &RunConfig, output: &PipelineOutput) -> Vec<ChannelReport> {
    output
        .recovered
        .iter()
        .map(|channel| {
            let (dominant, fraction) = match magnitude_spectrum(&channel.normalized) {
                Ok(spectrum) => (
                    spectrum.dominant_frequency(),
                    spectrum.energy_fraction_below(config.filter.cutoff_hz),
                ),
                Err(e) => {
                    log::warn!(
                        "no spectrum for channel {}: {}",
                        channel.channel_index + 1,
                        e
                    );
                    (0.0, 0.0)
                }
            };
            ChannelReport {
                channel: channel.channel_index + 1,
                input: config
                    .inputs
                    .get(channel.channel_index)
                    .cloned()
                    .unwrap_or_default(),
                carrier_frequency: channel.carrier_frequency,
                raw_peak: channel.raw.peak(),
                dominant_frequency_hz: dominant,
                passband_energy_fraction: fraction,
                output: recovered_file_name(channel.channel_index),
            }
        })
        .collect()
}

impl RunReport {
    /// Builds the report for a finished run.
    pub fn new(
        config: &RunConfig,
        output: &PipelineOutput,
        outputs: Vec<GeneratedFile>,
        warnings: Vec<JsonWarning>,
    ) -> Self {
        let composite = &output.transmission.composite;
        Self {
            tool: format!("fdmux v{}", env!("CARGO_PKG_VERSION")),
            config: config.clone(),
            num_samples: composite.len(),
            duration_seconds: composite.duration_seconds(),
            channels: channel_reports(config, output),
            outputs,
            warnings,
        }
    }

    /// Serializes the report as pretty-printed JSON bytes.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdmux_dsp::{pipeline, Signal};

    fn tone(freq: f64) -> Signal {
        Signal::from_fn(4_410, 44_100, |n| {
            (2.0 * std::f64::consts::PI * freq * n as f64 / 44_100.0).sin()
        })
        .unwrap()
    }

    #[test]
    fn test_report_summarizes_channels() {
        let config = RunConfig {
            inputs: vec!["low.wav".into(), "high.wav".into()],
            carrier_frequencies: vec![5_000.0, 15_000.0],
            ..RunConfig::default()
        };
        let output = pipeline::run(&[tone(500.0), tone(1_000.0)], &config).unwrap();
        let report = RunReport::new(&config, &output, vec![], vec![]);

        assert_eq!(report.num_samples, 4_410);
        assert!((report.duration_seconds - 0.1).abs() < 1e-9);
        assert_eq!(report.channels.len(), 2);

        let first = &report.channels[0];
        assert_eq!(first.channel, 1);
        assert_eq!(first.input, "low.wav");
        assert_eq!(first.output, "recovered_1.wav");
        assert!((first.dominant_frequency_hz - 500.0).abs() < 20.0);
        assert!(first.passband_energy_fraction > 0.95);
        assert!(first.raw_peak > 0.4 && first.raw_peak < 0.6);

        let json = String::from_utf8(report.to_json_bytes().unwrap()).unwrap();
        assert!(json.contains("\"carrier_frequency\": 15000.0"));
        assert!(json.ends_with('\n'));
    }
}
