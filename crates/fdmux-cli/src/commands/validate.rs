//! Validate command implementation
//!
//! Checks a run configuration without loading any audio.

use anyhow::{Context, Result};
use colored::Colorize;
use fdmux_spec::{validate_config, ValidationResult};
use std::path::Path;
use std::process::ExitCode;

use super::json_output::{
    input_error_to_json, print_json, validation_error_to_json, validation_warning_to_json,
    JsonError, JsonWarning, ValidateOutput,
};
use crate::input::load_config;

/// Run the validate command
///
/// # Arguments
/// * `config_path` - Path to the JSON run configuration
/// * `json_output` - Whether to output machine-readable JSON diagnostics
///
/// # Returns
/// Exit code: 0 if valid, 1 if invalid
pub fn run(config_path: &str, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(config_path)
    } else {
        run_human(config_path)
    }
}

/// Run validate with human-readable (colored) output
fn run_human(config_path: &str) -> Result<ExitCode> {
    println!("{} {}", "Validating:".cyan().bold(), config_path);

    let loaded = load_config(Some(Path::new(config_path)))
        .with_context(|| format!("Failed to load config file: {}", config_path))?;
    if let Some(hash) = &loaded.source_hash {
        println!("{} {}", "Source:".dimmed(), &hash[..16]);
    }

    let result = validate_config(&loaded.config);
    print_validation_results(&result);

    if result.is_ok() {
        println!(
            "\n{} Configuration is valid ({} channel(s))",
            "SUCCESS".green().bold(),
            loaded.config.carrier_frequencies.len()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "\n{} Configuration has {} error(s)",
            "FAILED".red().bold(),
            result.errors.len()
        );
        Ok(ExitCode::from(1))
    }
}

/// Run validate with machine-readable JSON output
fn run_json(config_path: &str) -> Result<ExitCode> {
    let loaded = match load_config(Some(Path::new(config_path))) {
        Ok(loaded) => loaded,
        Err(e) => {
            let error = input_error_to_json(&e, Some(config_path));
            print_json(&ValidateOutput::failure(vec![error], vec![], None))?;
            return Ok(ExitCode::from(1));
        }
    };

    let result = validate_config(&loaded.config);
    let warnings: Vec<JsonWarning> = result
        .warnings
        .iter()
        .map(validation_warning_to_json)
        .collect();

    let output = if result.is_ok() {
        ValidateOutput::success(
            loaded.config.carrier_frequencies.len(),
            loaded.source_hash,
            warnings,
        )
    } else {
        let errors: Vec<JsonError> = result.errors.iter().map(validation_error_to_json).collect();
        ValidateOutput::failure(errors, warnings, loaded.source_hash)
    };
    print_json(&output)?;

    if output.success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Print validation results to the console
fn print_validation_results(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("\n{}", "Errors:".red().bold());
        for error in &result.errors {
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
    }

    if !result.warnings.is_empty() {
        println!("\n{}", "Warnings:".yellow().bold());
        for warning in &result.warnings {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, json: &str) -> std::path::PathBuf {
        let path = dir.path().join("run.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn validate_default_config_succeeds() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(&tmp, "{}");

        let code = run(path.to_str().unwrap(), false).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[test]
    fn validate_reports_carrier_mismatch() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(&tmp, r#"{"carrier_frequencies": [5000, 12000]}"#);

        let code = run(path.to_str().unwrap(), false).unwrap();
        assert_eq!(code, ExitCode::from(1));
    }

    #[test]
    fn validate_json_output_success() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(&tmp, r#"{"filter": {"cutoff_hz": 3000, "order": 4}}"#);

        let code = run(path.to_str().unwrap(), true).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[test]
    fn validate_json_output_failure() {
        // Run with json=true on nonexistent file - should return exit code 1
        let code = run("/nonexistent/run.json", true).unwrap();
        assert_eq!(code, ExitCode::from(1));
    }

    #[test]
    fn validate_human_missing_file_is_error() {
        assert!(run("/nonexistent/run.json", false).is_err());
    }
}
