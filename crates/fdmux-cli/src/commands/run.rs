//! Run command implementation
//!
//! Loads the inputs, runs the multiplexing chain, and writes the composite,
//! the recovered channels, diagnostic plots, and a run report.

use anyhow::{Context, Result};
use colored::Colorize;
use fdmux_dsp::spectrum::{DEFAULT_NFFT, DEFAULT_OVERLAP};
use fdmux_dsp::{
    encode_wav, magnitude_spectrum, pipeline, spectrogram, PipelineError,
    PipelineOutput, WavFileSource,
};
use fdmux_spec::{validate_config, RunConfig, ValidationWarning};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use super::json_output::{
    input_error_to_json, pipeline_error_to_json, print_json, validation_error_to_json,
    validation_warning_to_json, warning_codes, GeneratedFile, JsonError, JsonWarning, RunOutput,
    RunResult,
};
use super::report::{recovered_file_name, RunReport, REPORT_FILE};
use crate::input::{load_config, LoadedConfig};
use crate::plot::{render_spectrogram_comparison_png, render_spectrum_png};

/// Composite output file name.
pub const COMPOSITE_FILE: &str = "composite.wav";

/// An output file produced in memory.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Output kind (composite, recovered, plot, report)
    pub kind: &'static str,
    /// Output format (wav, png, json)
    pub format: &'static str,
    /// File name inside the output directory
    pub name: String,
    /// File content
    pub bytes: Vec<u8>,
}

impl Artifact {
    fn describe(&self) -> GeneratedFile {
        GeneratedFile {
            kind: self.kind.to_string(),
            format: self.format.to_string(),
            path: self.name.clone(),
            hash: blake3::hash(&self.bytes).to_hex().to_string(),
        }
    }
}

/// Why a run stopped after its configuration was accepted.
#[derive(Debug)]
pub enum RunFailure {
    /// Loading or processing failed.
    Pipeline(PipelineError),
    /// Outputs could not be encoded or written.
    Output(anyhow::Error),
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunFailure::Pipeline(e) => write!(f, "{}", e),
            RunFailure::Output(e) => write!(f, "{:#}", e),
        }
    }
}

/// A completed run.
#[derive(Debug)]
pub struct RunSummary {
    /// Files written, excluding the report
    pub outputs: Vec<GeneratedFile>,
    /// Path to the written report
    pub report_path: PathBuf,
    /// Number of recovered channels
    pub channels: usize,
    /// Samples per channel
    pub num_samples: usize,
    /// Validation and plotting warnings
    pub warnings: Vec<JsonWarning>,
}

/// Run the run command
///
/// # Arguments
/// * `config_path` - Optional path to a JSON run configuration
/// * `inputs` - Input files overriding the configured inputs
/// * `out_dir` - Output directory
/// * `no_plots` - Skip diagnostic plots
/// * `json_output` - Whether to output machine-readable JSON diagnostics
///
/// # Returns
/// Exit code: 0 success, 1 configuration error, 2 run failure
pub fn run(
    config_path: Option<&str>,
    inputs: &[String],
    out_dir: &str,
    no_plots: bool,
    json_output: bool,
) -> Result<ExitCode> {
    if json_output {
        run_json(config_path, inputs, out_dir, no_plots)
    } else {
        run_human(config_path, inputs, out_dir, no_plots)
    }
}

fn prepare_config(loaded: LoadedConfig, inputs: &[String], no_plots: bool) -> LoadedConfig {
    let loaded = loaded.with_inputs(inputs);
    if no_plots {
        loaded.without_plots()
    } else {
        loaded
    }
}

/// Run with human-readable (colored) output
fn run_human(
    config_path: Option<&str>,
    inputs: &[String],
    out_dir: &str,
    no_plots: bool,
) -> Result<ExitCode> {
    let start = Instant::now();

    let loaded = load_config(config_path.map(Path::new))
        .with_context(|| format!("Failed to load config file: {}", config_path.unwrap_or("")))?;
    let loaded = prepare_config(loaded, inputs, no_plots);

    println!("{} {}", "Running:".cyan().bold(), loaded.source);
    println!("{} {}", "Output dir:".cyan().bold(), out_dir);
    if let Some(hash) = &loaded.source_hash {
        println!("{} {}", "Source:".dimmed(), &hash[..16]);
    }

    let validation = validate_config(&loaded.config);
    print_warnings(&validation.warnings);
    if !validation.is_ok() {
        println!("\n{}", "Errors:".red().bold());
        for error in &validation.errors {
            let path_info = error
                .path
                .as_ref()
                .map(|p| format!(" at {}", p))
                .unwrap_or_default();
            println!(
                "  {} [{}]{}: {}",
                "x".red(),
                error.code.to_string().red(),
                path_info.dimmed(),
                error.message
            );
        }
        println!(
            "\n{} Configuration has {} error(s)",
            "FAILED".red().bold(),
            validation.errors.len()
        );
        return Ok(ExitCode::from(1));
    }

    for (i, (input, carrier)) in loaded
        .config
        .inputs
        .iter()
        .zip(&loaded.config.carrier_frequencies)
        .enumerate()
    {
        println!(
            "  {} channel {} {} {} Hz",
            "+".green(),
            i + 1,
            input,
            carrier
        );
    }

    match execute(&loaded, Path::new(out_dir), &validation.warnings) {
        Ok(summary) => {
            for warning in summary.warnings.iter().filter(|w| w.code == warning_codes::PLOT_SKIPPED)
            {
                println!("  {} [plot]: {}", "!".yellow(), warning.message);
            }
            println!("\n{}", "Outputs:".cyan().bold());
            for file in &summary.outputs {
                println!("  {} {} ({})", "->".dimmed(), file.path, &file.hash[..16]);
            }
            println!(
                "\n{} Recovered {} channel(s) of {} samples ({}ms)",
                "SUCCESS".green().bold(),
                summary.channels,
                summary.num_samples,
                start.elapsed().as_millis()
            );
            println!(
                "{} {}",
                "Report written to:".dimmed(),
                summary.report_path.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            println!("\n{} {}", "FAILED".red().bold(), failure);
            println!("{}", "No output files were written.".dimmed());
            Ok(ExitCode::from(2))
        }
    }
}

/// Run with machine-readable JSON output
fn run_json(
    config_path: Option<&str>,
    inputs: &[String],
    out_dir: &str,
    no_plots: bool,
) -> Result<ExitCode> {
    let start = Instant::now();

    let loaded = match load_config(config_path.map(Path::new)) {
        Ok(loaded) => prepare_config(loaded, inputs, no_plots),
        Err(e) => {
            let error = input_error_to_json(&e, config_path);
            print_json(&RunOutput::failure(vec![error], vec![]))?;
            return Ok(ExitCode::from(1));
        }
    };

    let validation = validate_config(&loaded.config);
    let validation_warnings: Vec<JsonWarning> = validation
        .warnings
        .iter()
        .map(validation_warning_to_json)
        .collect();
    if !validation.is_ok() {
        let errors = validation
            .errors
            .iter()
            .map(validation_error_to_json)
            .collect();
        print_json(&RunOutput::failure(errors, validation_warnings))?;
        return Ok(ExitCode::from(1));
    }

    match execute(&loaded, Path::new(out_dir), &validation.warnings) {
        Ok(summary) => {
            let result = RunResult {
                out_dir: out_dir.to_string(),
                channels: summary.channels,
                num_samples: summary.num_samples,
                outputs: summary.outputs,
                report_path: summary.report_path.display().to_string(),
                duration_ms: start.elapsed().as_millis() as u64,
            };
            print_json(&RunOutput::success(result, summary.warnings))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            let errors = match &failure {
                RunFailure::Pipeline(e) => pipeline_error_to_json(e),
                RunFailure::Output(e) => vec![JsonError::new(
                    super::json_output::error_codes::OUTPUT_WRITE,
                    format!("{:#}", e),
                )],
            };
            print_json(&RunOutput::failure(errors, validation_warnings))?;
            Ok(ExitCode::from(2))
        }
    }
}

/// Loads, processes, and writes one run.
///
/// Nothing is written to `out_dir` unless every output was produced.
pub fn execute(
    loaded: &LoadedConfig,
    out_dir: &Path,
    validation_warnings: &[ValidationWarning],
) -> Result<RunSummary, RunFailure> {
    let config = &loaded.config;
    let source = WavFileSource::new(&loaded.base_dir);

    let signals = pipeline::load_all(&source, config).map_err(RunFailure::Pipeline)?;
    let output = pipeline::run(&signals, config).map_err(RunFailure::Pipeline)?;

    let mut warnings: Vec<JsonWarning> = validation_warnings
        .iter()
        .map(validation_warning_to_json)
        .collect();

    let mut artifacts = encode_audio(config, &output).map_err(RunFailure::Output)?;
    if config.output.plots {
        let (plots, plot_warnings) = render_plots(config, &output);
        artifacts.extend(plots);
        warnings.extend(plot_warnings);
    }

    let outputs: Vec<GeneratedFile> = artifacts.iter().map(Artifact::describe).collect();
    let report = RunReport::new(config, &output, outputs.clone(), warnings.clone());
    artifacts.push(Artifact {
        kind: "report",
        format: "json",
        name: REPORT_FILE.to_string(),
        bytes: report
            .to_json_bytes()
            .context("Failed to serialize run report")
            .map_err(RunFailure::Output)?,
    });

    write_staged(out_dir, &artifacts).map_err(RunFailure::Output)?;
    log::info!(
        "wrote {} file(s) to {}",
        artifacts.len(),
        out_dir.display()
    );

    Ok(RunSummary {
        outputs,
        report_path: out_dir.join(REPORT_FILE),
        channels: output.recovered.len(),
        num_samples: output.transmission.composite.len(),
        warnings,
    })
}

/// Encodes the composite and every recovered channel.
fn encode_audio(config: &RunConfig, output: &PipelineOutput) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::with_capacity(output.recovered.len() + 1);
    artifacts.push(Artifact {
        kind: "composite",
        format: "wav",
        name: COMPOSITE_FILE.to_string(),
        bytes: encode_wav(
            &output.transmission.composite,
            config.output.composite_encoding,
        )
        .context("Failed to encode composite signal")?,
    });
    for channel in &output.recovered {
        artifacts.push(Artifact {
            kind: "recovered",
            format: "wav",
            name: recovered_file_name(channel.channel_index),
            bytes: encode_wav(&channel.normalized, config.output.recovered_encoding)
                .with_context(|| {
                    format!("Failed to encode channel {}", channel.channel_index + 1)
                })?,
        });
    }
    Ok(artifacts)
}

/// Renders every diagnostic plot; failures become warnings.
fn render_plots(config: &RunConfig, output: &PipelineOutput) -> (Vec<Artifact>, Vec<JsonWarning>) {
    let mut plots = Vec::new();
    let mut warnings = Vec::new();
    let mut add = |name: String, render: &dyn Fn() -> Result<Vec<u8>>| match render() {
        Ok(bytes) => plots.push(Artifact {
            kind: "plot",
            format: "png",
            name,
            bytes,
        }),
        Err(e) => {
            log::warn!("skipping plot {}: {:#}", name, e);
            warnings.push(JsonWarning::new(
                warning_codes::PLOT_SKIPPED,
                format!("{} skipped: {:#}", name, e),
            ));
        }
    };

    for (i, modulated) in output.transmission.modulated.iter().enumerate() {
        let carrier = config.carrier_frequencies[i];
        add(format!("spectrum_modulated_{}.png", i + 1), &|| {
            let spectrum = magnitude_spectrum(modulated)?;
            Ok(render_spectrum_png(&spectrum, &[carrier])?)
        });
    }

    add("spectrum_composite.png".to_string(), &|| {
        let spectrum = magnitude_spectrum(&output.transmission.composite)?;
        Ok(render_spectrum_png(&spectrum, &config.carrier_frequencies)?)
    });

    for (original, channel) in output.originals.iter().zip(&output.recovered) {
        add(
            format!("comparison_channel_{}.png", channel.channel_index + 1),
            &|| {
                let before = spectrogram(original, DEFAULT_NFFT, DEFAULT_OVERLAP)?;
                let after = spectrogram(&channel.normalized, DEFAULT_NFFT, DEFAULT_OVERLAP)?;
                Ok(render_spectrogram_comparison_png(&before, &after)?)
            },
        );
    }

    (plots, warnings)
}

/// Writes every artifact into a staging directory inside `out_dir`, then moves
/// them into place.
fn write_staged(out_dir: &Path, artifacts: &[Artifact]) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let staging = tempfile::Builder::new()
        .prefix(".fdmux-staging-")
        .tempdir_in(out_dir)
        .with_context(|| format!("Failed to create staging directory in {}", out_dir.display()))?;

    for artifact in artifacts {
        let path = staging.path().join(&artifact.name);
        fs::write(&path, &artifact.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    let names: Vec<&str> = artifacts.iter().map(|a| a.name.as_str()).collect();
    move_into_place(staging.path(), out_dir, &names)
}

/// A file moved into the output directory, and where the file it replaced
/// was parked.
struct Placed {
    target: PathBuf,
    parked: Option<PathBuf>,
}

/// Moves staged files into `out_dir`.
///
/// Files being replaced are parked inside the staging directory until every
/// move has succeeded. If any move fails, the files already moved are removed
/// and the parked ones restored.
fn move_into_place(staging: &Path, out_dir: &Path, names: &[&str]) -> Result<()> {
    let parked_dir = staging.join(".previous");
    fs::create_dir(&parked_dir)
        .with_context(|| format!("Failed to create {}", parked_dir.display()))?;

    let mut placed = Vec::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        let staged = staging.join(name);
        let target = out_dir.join(name);
        let parked = parked_dir.join(index.to_string());
        if let Err(e) = move_one(&staged, &target, &parked, &mut placed) {
            roll_back(&placed);
            return Err(e);
        }
    }
    Ok(())
}

fn move_one(staged: &Path, target: &Path, parked: &Path, placed: &mut Vec<Placed>) -> Result<()> {
    let previous = if target.exists() {
        fs::rename(target, parked)
            .with_context(|| format!("Failed to set aside {}", target.display()))?;
        Some(parked.to_path_buf())
    } else {
        None
    };
    placed.push(Placed {
        target: target.to_path_buf(),
        parked: previous,
    });
    fs::rename(staged, target)
        .with_context(|| format!("Failed to move {} into place", target.display()))
}

fn roll_back(placed: &[Placed]) {
    for entry in placed.iter().rev() {
        if entry.target.exists() {
            if let Err(e) = fs::remove_file(&entry.target) {
                log::warn!("failed to remove {}: {}", entry.target.display(), e);
            }
        }
        if let Some(parked) = &entry.parked {
            if let Err(e) = fs::rename(parked, &entry.target) {
                log::warn!("failed to restore {}: {}", entry.target.display(), e);
            }
        }
    }
}

fn print_warnings(warnings: &[ValidationWarning]) {
    if warnings.is_empty() {
        return;
    }
    println!("\n{}", "Warnings:".yellow().bold());
    for warning in warnings {
        let path_info = warning
            .path
            .as_ref()
            .map(|p| format!(" at {}", p))
            .unwrap_or_default();
        println!(
            "  {} [{}]{}: {}",
            "!".yellow(),
            warning.code.to_string().yellow(),
            path_info.dimmed(),
            warning.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_staged_moves_every_file() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let artifacts = vec![
            Artifact {
                kind: "plot",
                format: "png",
                name: "a.png".to_string(),
                bytes: vec![1, 2, 3],
            },
            Artifact {
                kind: "report",
                format: "json",
                name: "report.json".to_string(),
                bytes: b"{}".to_vec(),
            },
        ];

        write_staged(&out, &artifacts).unwrap();

        let mut names: Vec<String> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.png".to_string(), "report.json".to_string()]);
        assert_eq!(fs::read(out.join("a.png")).unwrap(), vec![1, 2, 3]);
    }

    fn read_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_failed_move_restores_previous_files() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let staging = tmp.path().join("staging");
        fs::create_dir(&out).unwrap();
        fs::create_dir(&staging).unwrap();

        fs::write(out.join("a.png"), "old a").unwrap();
        fs::write(out.join("c.png"), "old c").unwrap();
        fs::write(staging.join("a.png"), "new a").unwrap();
        fs::write(staging.join("b.png"), "new b").unwrap();
        // c.png was never staged, so its move fails after a and b are in place.

        let err = move_into_place(&staging, &out, &["a.png", "b.png", "c.png"]).unwrap_err();
        assert!(err.to_string().contains("c.png"), "{}", err);

        assert_eq!(read_names(&out), vec!["a.png".to_string(), "c.png".to_string()]);
        assert_eq!(fs::read_to_string(out.join("a.png")).unwrap(), "old a");
        assert_eq!(fs::read_to_string(out.join("c.png")).unwrap(), "old c");
    }

    #[test]
    fn test_successful_move_replaces_previous_files() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let staging = tmp.path().join("staging");
        fs::create_dir(&out).unwrap();
        fs::create_dir(&staging).unwrap();

        fs::write(out.join("a.png"), "old a").unwrap();
        fs::write(out.join("keep.txt"), "untouched").unwrap();
        fs::write(staging.join("a.png"), "new a").unwrap();
        fs::write(staging.join("b.png"), "new b").unwrap();

        move_into_place(&staging, &out, &["a.png", "b.png"]).unwrap();

        assert_eq!(
            read_names(&out),
            vec!["a.png".to_string(), "b.png".to_string(), "keep.txt".to_string()]
        );
        assert_eq!(fs::read_to_string(out.join("a.png")).unwrap(), "new a");
        assert_eq!(fs::read_to_string(out.join("keep.txt")).unwrap(), "untouched");
    }

    #[test]
    fn test_json_mode_missing_config() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let code = run(
            Some("/nonexistent/run.json"),
            &[],
            out.to_str().unwrap(),
            true,
            true,
        )
        .unwrap();
        assert_eq!(code, ExitCode::from(1));
        assert!(!out.exists());
    }
}
